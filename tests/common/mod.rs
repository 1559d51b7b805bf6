#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use zonetrader::domain::error::ZonetraderError;
pub use zonetrader::domain::ohlcv::OhlcvBar;
use zonetrader::domain::params::StrategyParams;
use zonetrader::domain::zone::{Zone, ZoneSet};
use zonetrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ZonetraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ZonetraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| {
                !start_date.is_some_and(|s| b.date < s) && !end_date.is_some_and(|e| b.date > e)
            })
            .collect())
    }

    fn list_codes(&self) -> Result<Vec<String>, ZonetraderError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar on day `offset` from 2025-01-01 with explicit OHLC.
pub fn ohlc_bar(code: &str, offset: u64, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date: date(2025, 1, 1)
            .checked_add_days(chrono::Days::new(offset))
            .unwrap(),
        open,
        high,
        low,
        close,
        volume: 1000,
    }
}

/// Tight bar around a close, for feeding the state machine without
/// accidental intrabar stop or target hits.
pub fn close_bar(code: &str, offset: u64, close: f64) -> OhlcvBar {
    ohlc_bar(code, offset, close, close + 1.0, close - 1.0, close)
}

pub fn two_zones(low1: f64, high1: f64, low2: f64, high2: f64) -> ZoneSet {
    ZoneSet::new(
        "TEST",
        vec![
            Zone {
                number: 1,
                low: low1,
                high: high1,
            },
            Zone {
                number: 2,
                low: low2,
                high: high2,
            },
        ],
    )
    .unwrap()
}

pub fn cdia_zones() -> ZoneSet {
    ZoneSet::new(
        "CDIA",
        vec![
            Zone {
                number: 1,
                low: 1440.0,
                high: 1480.0,
            },
            Zone {
                number: 2,
                low: 1670.0,
                high: 1735.0,
            },
            Zone {
                number: 3,
                low: 1950.0,
                high: 2050.0,
            },
        ],
    )
    .unwrap()
}

/// Default parameters with a short ATR warmup so scenarios stay compact.
pub fn short_params() -> StrategyParams {
    StrategyParams {
        atr_len: 2,
        ..Default::default()
    }
}
