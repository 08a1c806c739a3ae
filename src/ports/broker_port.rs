//! Brokerage access port trait.

use crate::domain::error::RobotError;
use crate::domain::market::BarSpec;
use crate::domain::ohlcv::PriceBar;
use crate::domain::trade::{OrderPayload, OrderStatus};
use chrono::{DateTime, Utc};

pub trait BrokerPort {
    /// Bars for `symbol` with timestamps in `[start, end]`, oldest first.
    fn historical_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError>;

    /// The newest completed bar for each symbol.
    fn latest_bars(
        &mut self,
        symbols: &[String],
        bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError>;

    /// Submit an order; returns the broker's order id.
    fn place_order(&mut self, account: &str, order: &OrderPayload) -> Result<String, RobotError>;

    fn order_status(&self, account: &str, order_id: &str) -> Result<OrderStatus, RobotError>;
}
