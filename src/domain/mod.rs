//! Core domain types and logic.

pub mod error;
pub mod indicator;
pub mod indicators;
pub mod market;
pub mod ohlcv;
pub mod portfolio;
pub mod robot;
pub mod rule;
pub mod session;
pub mod settings;
pub mod stock_frame;
pub mod strategy;
pub mod strategy_loop;
pub mod trade;
