//! Trading session: broker handle, portfolio, and the trade registry.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::domain::error::RobotError;
use crate::domain::market::{BarSpec, MarketHours};
use crate::domain::ohlcv::PriceBar;
use crate::domain::portfolio::Portfolio;
use crate::domain::stock_frame::StockFrame;
use crate::domain::trade::{EnterOrExit, LongOrShort, OrderStatus, OrderType, Trade, TradeRecord};
use crate::ports::broker_port::BrokerPort;

pub struct Robot<B: BrokerPort> {
    broker: B,
    account_number: String,
    hours: MarketHours,
    pub portfolio: Portfolio,
    trades: BTreeMap<String, Trade>,
}

impl<B: BrokerPort> Robot<B> {
    pub fn new(broker: B, account_number: &str, hours: MarketHours) -> Self {
        Self {
            broker,
            account_number: account_number.to_string(),
            hours,
            portfolio: Portfolio::new(account_number),
            trades: BTreeMap::new(),
        }
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    /// Start a fresh portfolio for this session's account.
    pub fn create_portfolio(&mut self) -> &mut Portfolio {
        self.portfolio = Portfolio::new(&self.account_number);
        &mut self.portfolio
    }

    pub fn regular_market_open(&self, now: DateTime<Utc>) -> bool {
        self.hours.is_open(now)
    }

    /// Fetch history for every symbol in the portfolio and keep it on the
    /// portfolio.
    pub fn grab_historical_prices(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bar: BarSpec,
    ) -> Result<&[PriceBar], RobotError> {
        let mut all_bars = Vec::new();
        for symbol in self.portfolio.symbols() {
            let bars = self.broker.historical_bars(&symbol, start, end, bar)?;
            if bars.is_empty() {
                return Err(RobotError::NoData { symbol });
            }
            tracing::info!(%symbol, bars = bars.len(), %bar, "historical prices loaded");
            all_bars.extend(bars);
        }
        self.portfolio.historical_prices = all_bars;
        Ok(&self.portfolio.historical_prices)
    }

    /// Build the stock frame from the historical prices and attach it to the
    /// portfolio.
    pub fn create_stock_frame(&mut self) -> &StockFrame {
        let frame = StockFrame::new(self.portfolio.historical_prices.clone());
        self.portfolio.stock_frame.insert(frame)
    }

    pub fn stock_frame(&self) -> Option<&StockFrame> {
        self.portfolio.stock_frame.as_ref()
    }

    pub fn stock_frame_mut(&mut self) -> &mut StockFrame {
        self.portfolio.stock_frame.get_or_insert_with(StockFrame::default)
    }

    pub fn get_latest_bar(&mut self, bar: BarSpec) -> Result<Vec<PriceBar>, RobotError> {
        let symbols = self.portfolio.symbols();
        self.broker.latest_bars(&symbols, bar)
    }

    /// Create and register an empty trade template.
    pub fn create_trade(
        &mut self,
        trade_id: &str,
        enter_or_exit: EnterOrExit,
        long_or_short: LongOrShort,
        order_type: OrderType,
    ) -> &mut Trade {
        self.register_trade(Trade::new(trade_id, enter_or_exit, long_or_short, order_type))
    }

    /// Register a trade template. Re-using an id replaces the old template.
    pub fn register_trade(&mut self, trade: Trade) -> &mut Trade {
        match self.trades.entry(trade.trade_id.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(trade);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(trade),
        }
    }

    pub fn trade(&self, trade_id: &str) -> Result<&Trade, RobotError> {
        self.trades
            .get(trade_id)
            .ok_or_else(|| RobotError::UnknownTrade {
                trade_id: trade_id.to_string(),
            })
    }

    fn trade_mut(&mut self, trade_id: &str) -> Result<&mut Trade, RobotError> {
        self.trades
            .get_mut(trade_id)
            .ok_or_else(|| RobotError::UnknownTrade {
                trade_id: trade_id.to_string(),
            })
    }

    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.values()
    }

    /// Serializable form of the given trades, in the order asked for.
    pub fn trade_records(&self, trade_ids: &[&str]) -> Result<Vec<TradeRecord>, RobotError> {
        trade_ids
            .iter()
            .map(|id| self.trade(id).map(Trade::to_record))
            .collect()
    }

    /// Submit a registered trade; returns the broker order id.
    pub fn execute_trade(&mut self, trade_id: &str) -> Result<String, RobotError> {
        let trade = self.trade(trade_id)?;
        trade.validate()?;
        let payload = trade.to_order();

        let order_id = self.broker.place_order(&self.account_number, &payload)?;
        tracing::info!(trade_id, %order_id, "order submitted");

        self.trade_mut(trade_id)?.mark_submitted(order_id.clone());
        Ok(order_id)
    }

    /// Poll the broker for the status of a trade's last submitted order.
    pub fn check_status(&mut self, trade_id: &str) -> Result<OrderStatus, RobotError> {
        let trade = self.trade(trade_id)?;
        let Some(order_id) = trade.order_id.clone() else {
            return Ok(trade.status.clone());
        };

        let status = self.broker.order_status(&self.account_number, &order_id)?;
        let trade = self.trade_mut(trade_id)?;
        if trade.status != status {
            tracing::info!(trade_id, %order_id, %status, "order status changed");
        }
        trade.status = status.clone();
        if status == OrderStatus::Rejected {
            tracing::warn!(trade_id, %order_id, "order rejected by broker");
        }
        Ok(status)
    }
}
