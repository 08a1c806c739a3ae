//! Port traits: the seams between strategy logic and the outside world.

pub mod broker_port;
pub mod clock_port;
pub mod config_port;
pub mod order_store_port;
