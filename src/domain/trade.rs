//! Trade templates and the broker order payload they serialize to.
//!
//! A `Trade` is built once per strategy setup and re-submitted every time its
//! signal fires. Each submission records the broker order id; status polling
//! then updates `status` in place.

use crate::domain::error::RobotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnterOrExit {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongOrShort {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Equity,
    Option,
    Etf,
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equity" => Ok(AssetType::Equity),
            "option" => Ok(AssetType::Option),
            "etf" => Ok(AssetType::Etf),
            other => Err(format!("unknown asset type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    Buy,
    Sell,
    SellShort,
    BuyToCover,
}

impl Instruction {
    pub fn for_trade(enter_or_exit: EnterOrExit, long_or_short: LongOrShort) -> Self {
        match (enter_or_exit, long_or_short) {
            (EnterOrExit::Enter, LongOrShort::Long) => Instruction::Buy,
            (EnterOrExit::Exit, LongOrShort::Long) => Instruction::Sell,
            (EnterOrExit::Enter, LongOrShort::Short) => Instruction::SellShort,
            (EnterOrExit::Exit, LongOrShort::Short) => Instruction::BuyToCover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    /// Built locally, never submitted.
    Staged,
    Queued,
    Working,
    Filled,
    Canceled,
    Rejected,
    Expired,
    Unknown(String),
}

impl OrderStatus {
    pub fn from_broker(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "QUEUED" | "ACCEPTED" | "PENDING_ACTIVATION" | "AWAITING_PARENT_ORDER" => {
                OrderStatus::Queued
            }
            "WORKING" | "PENDING_REPLACE" | "PENDING_CANCEL" => OrderStatus::Working,
            "FILLED" => OrderStatus::Filled,
            "CANCELED" | "CANCELLED" | "REPLACED" => OrderStatus::Canceled,
            "REJECTED" => OrderStatus::Rejected,
            "EXPIRED" => OrderStatus::Expired,
            other => OrderStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Staged => f.write_str("STAGED"),
            OrderStatus::Queued => f.write_str("QUEUED"),
            OrderStatus::Working => f.write_str("WORKING"),
            OrderStatus::Filled => f.write_str("FILLED"),
            OrderStatus::Canceled => f.write_str("CANCELED"),
            OrderStatus::Rejected => f.write_str("REJECTED"),
            OrderStatus::Expired => f.write_str("EXPIRED"),
            OrderStatus::Unknown(s) => write!(f, "UNKNOWN({s})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub asset_type: AssetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLeg {
    pub instruction: Instruction,
    pub quantity: u32,
    pub instrument: Instrument,
}

/// Order body in the shape the brokerage REST API accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub order_type: OrderType,
    pub session: String,
    pub duration: String,
    pub order_strategy_type: String,
    pub order_leg_collection: Vec<OrderLeg>,
}

/// Serialized form of a trade template, as written to the orders file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: String,
    pub enter_or_exit: EnterOrExit,
    pub long_or_short: LongOrShort,
    pub order: OrderPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub trade_id: String,
    pub enter_or_exit: EnterOrExit,
    pub long_or_short: LongOrShort,
    pub order_type: OrderType,
    pub legs: Vec<OrderLeg>,
    pub status: OrderStatus,
    pub order_id: Option<String>,
}

impl Trade {
    pub fn new(
        trade_id: &str,
        enter_or_exit: EnterOrExit,
        long_or_short: LongOrShort,
        order_type: OrderType,
    ) -> Self {
        Self {
            trade_id: trade_id.to_string(),
            enter_or_exit,
            long_or_short,
            order_type,
            legs: Vec::new(),
            status: OrderStatus::Staged,
            order_id: None,
        }
    }

    /// Add an instrument leg; the instruction follows from the trade's side
    /// and phase.
    pub fn instrument(&mut self, symbol: &str, quantity: u32, asset_type: AssetType) -> &mut Self {
        self.legs.push(OrderLeg {
            instruction: Instruction::for_trade(self.enter_or_exit, self.long_or_short),
            quantity,
            instrument: Instrument {
                symbol: symbol.to_uppercase(),
                asset_type,
            },
        });
        self
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.legs.iter().map(|leg| leg.instrument.symbol.as_str())
    }

    pub fn to_order(&self) -> OrderPayload {
        OrderPayload {
            order_type: self.order_type,
            session: "NORMAL".to_string(),
            duration: "DAY".to_string(),
            order_strategy_type: "SINGLE".to_string(),
            order_leg_collection: self.legs.clone(),
        }
    }

    pub fn to_record(&self) -> TradeRecord {
        TradeRecord {
            trade_id: self.trade_id.clone(),
            enter_or_exit: self.enter_or_exit,
            long_or_short: self.long_or_short,
            order: self.to_order(),
        }
    }

    /// A trade must carry at least one leg with a positive quantity before it
    /// can be submitted.
    pub fn validate(&self) -> Result<(), RobotError> {
        if self.legs.is_empty() {
            return Err(RobotError::TradeInvalid {
                trade_id: self.trade_id.clone(),
                reason: "no instrument legs".into(),
            });
        }
        if self.legs.iter().any(|leg| leg.quantity == 0) {
            return Err(RobotError::TradeInvalid {
                trade_id: self.trade_id.clone(),
                reason: "leg quantity must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn mark_submitted(&mut self, order_id: String) {
        self.order_id = Some(order_id);
        self.status = OrderStatus::Queued;
    }
}
