//! Paper-trading decorator: market data comes from the wrapped broker,
//! orders are filled locally and never leave the process.

use crate::domain::error::RobotError;
use crate::domain::market::BarSpec;
use crate::domain::ohlcv::PriceBar;
use crate::domain::trade::{OrderPayload, OrderStatus};
use crate::ports::broker_port::BrokerPort;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub struct PaperBroker<B: BrokerPort> {
    inner: B,
    next_id: u64,
    orders: HashMap<String, OrderPayload>,
}

impl<B: BrokerPort> PaperBroker<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            next_id: 1,
            orders: HashMap::new(),
        }
    }
}

impl<B: BrokerPort> BrokerPort for PaperBroker<B> {
    fn historical_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        self.inner.historical_bars(symbol, start, end, bar)
    }

    fn latest_bars(
        &mut self,
        symbols: &[String],
        bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        self.inner.latest_bars(symbols, bar)
    }

    fn place_order(&mut self, account: &str, order: &OrderPayload) -> Result<String, RobotError> {
        let order_id = format!("PAPER-{}", self.next_id);
        self.next_id += 1;
        for leg in &order.order_leg_collection {
            tracing::info!(
                account,
                %order_id,
                instruction = ?leg.instruction,
                quantity = leg.quantity,
                symbol = %leg.instrument.symbol,
                "paper order filled"
            );
        }
        self.orders.insert(order_id.clone(), order.clone());
        Ok(order_id)
    }

    fn order_status(&self, _account: &str, order_id: &str) -> Result<OrderStatus, RobotError> {
        if self.orders.contains_key(order_id) {
            Ok(OrderStatus::Filled)
        } else {
            Err(RobotError::Broker {
                reason: format!("unknown paper order {order_id}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{AssetType, EnterOrExit, LongOrShort, OrderType, Trade};

    struct NoData;

    impl BrokerPort for NoData {
        fn historical_bars(
            &self,
            _symbol: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _bar: BarSpec,
        ) -> Result<Vec<PriceBar>, RobotError> {
            Ok(vec![])
        }

        fn latest_bars(
            &mut self,
            _symbols: &[String],
            _bar: BarSpec,
        ) -> Result<Vec<PriceBar>, RobotError> {
            Ok(vec![])
        }

        fn place_order(
            &mut self,
            _account: &str,
            _order: &OrderPayload,
        ) -> Result<String, RobotError> {
            panic!("paper broker must not forward orders");
        }

        fn order_status(&self, _account: &str, _order_id: &str) -> Result<OrderStatus, RobotError> {
            panic!("paper broker must not forward status checks");
        }
    }

    fn payload() -> OrderPayload {
        let mut trade = Trade::new(
            "long_enter",
            EnterOrExit::Enter,
            LongOrShort::Long,
            OrderType::Market,
        );
        trade.instrument("FCEL", 1, AssetType::Equity);
        trade.to_order()
    }

    #[test]
    fn orders_get_sequential_ids_and_fill() {
        let mut broker = PaperBroker::new(NoData);
        let first = broker.place_order("123", &payload()).unwrap();
        let second = broker.place_order("123", &payload()).unwrap();

        assert_eq!(first, "PAPER-1");
        assert_eq!(second, "PAPER-2");
        assert_eq!(broker.order_status("123", &first).unwrap(), OrderStatus::Filled);
        assert_eq!(broker.order_status("123", &second).unwrap(), OrderStatus::Filled);
    }

    #[test]
    fn unknown_order_is_error() {
        let broker = PaperBroker::new(NoData);
        assert!(broker.order_status("123", "PAPER-9").is_err());
    }
}
