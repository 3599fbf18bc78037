//! Core domain types and logic.

pub mod raw_row;
pub mod candle;
pub mod timeframe;
pub mod naming;
pub mod resample;
pub mod job;
pub mod error;
