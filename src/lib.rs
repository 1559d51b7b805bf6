//! zonetrader — support/resistance zone signal backtester.
//!
//! Evaluates daily price series against static per-instrument price zones,
//! produces RETEST/BREAKOUT entry signals, simulates the resulting positions
//! and aggregates the outcome into backtest statistics.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
