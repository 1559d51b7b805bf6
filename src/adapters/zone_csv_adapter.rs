//! CSV zone table adapter.
//!
//! One file for all instruments, columns code,zone,low,high with a header
//! row. Rows are grouped by code and every group is validated into a
//! [`ZoneSet`] at load time, so a bad table fails before any backtest runs.

use crate::domain::error::ZonetraderError;
use crate::domain::zone::{Zone, ZoneSet};
use crate::ports::zone_port::ZonePort;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct ZoneCsvAdapter {
    by_code: HashMap<String, ZoneSet>,
}

impl ZoneCsvAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ZonetraderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ZonetraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_string(&content)
    }

    pub fn from_string(content: &str) -> Result<Self, ZonetraderError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut by_code: HashMap<String, Vec<Zone>> = HashMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ZonetraderError::Data {
                reason: format!("zone CSV parse error: {}", e),
            })?;

            let code = record
                .get(0)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ZonetraderError::Data {
                    reason: "zone row missing code".to_string(),
                })?
                .to_string();

            let number: u32 = parse_field(&record, &code, 1, "zone")?;
            let low: f64 = parse_field(&record, &code, 2, "low")?;
            let high: f64 = parse_field(&record, &code, 3, "high")?;

            by_code
                .entry(code)
                .or_default()
                .push(Zone { number, low, high });
        }

        let mut validated = HashMap::with_capacity(by_code.len());
        for (code, zones) in by_code {
            let set = ZoneSet::new(&code, zones)?;
            validated.insert(code, set);
        }

        Ok(Self { by_code: validated })
    }

    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.by_code.keys().cloned().collect();
        codes.sort();
        codes
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    code: &str,
    index: usize,
    name: &str,
) -> Result<T, ZonetraderError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| ZonetraderError::ZoneConfig {
            code: code.to_string(),
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| ZonetraderError::ZoneConfig {
            code: code.to_string(),
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl ZonePort for ZoneCsvAdapter {
    fn zones_for(&self, code: &str) -> Result<ZoneSet, ZonetraderError> {
        Ok(self.by_code.get(code).cloned().unwrap_or_default())
    }
}
