//! Port for persisting trade templates.

use crate::domain::error::RobotError;
use crate::domain::trade::TradeRecord;

pub trait OrderStorePort {
    fn save(&self, records: &[TradeRecord]) -> Result<(), RobotError>;
}
