//! Bar data access port trait.

use crate::domain::error::ZonetraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` in ascending date order, clipped to the window when
    /// bounds are given.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ZonetraderError>;

    fn list_codes(&self) -> Result<Vec<String>, ZonetraderError>;
}
