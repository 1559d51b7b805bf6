//! CSV bar data adapter.
//!
//! One file per instrument, `<code>.csv`, columns
//! date,open,high,low,close,volume with a header row.

use crate::domain::error::ZonetraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

fn field<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str, ZonetraderError> {
    record.get(index).ok_or_else(|| ZonetraderError::Data {
        reason: format!("missing {} column", name),
    })
}

fn parse_price(record: &StringRecord, index: usize, name: &str) -> Result<f64, ZonetraderError> {
    field(record, index, name)?
        .trim()
        .parse()
        .map_err(|e| ZonetraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ZonetraderError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| ZonetraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ZonetraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date")?.trim(), "%Y-%m-%d")
                .map_err(|e| ZonetraderError::Data {
                    reason: format!("invalid date in {}: {}", path.display(), e),
                })?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            let volume: i64 = field(&record, 5, "volume")?.trim().parse().map_err(|e| {
                ZonetraderError::Data {
                    reason: format!("invalid volume value: {}", e),
                }
            })?;

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open: parse_price(&record, 1, "open")?,
                high: parse_price(&record, 2, "high")?,
                low: parse_price(&record, 3, "low")?,
                close: parse_price(&record, 4, "close")?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_codes(&self) -> Result<Vec<String>, ZonetraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ZonetraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ZonetraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }
}
