//! Core domain types and logic.

pub mod ohlcv;
pub mod zone;
pub mod params;
pub mod buffer;
pub mod filters;
pub mod signal;
pub mod position;
pub mod engine;
pub mod config_validation;
pub mod error;
