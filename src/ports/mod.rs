//! Port traits implemented by the adapters.

pub mod row_port;
pub mod candle_port;
pub mod config_port;
