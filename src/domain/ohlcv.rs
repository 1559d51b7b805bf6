//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            code: "CDIA".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            open: 1450.0,
            high: 1500.0,
            low: 1420.0,
            close: 1480.0,
            volume: 50_000,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=80, |1500-1460|=40, |1420-1460|=40 → 80
        assert!((bar.true_range(1460.0) - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=80, |1500-1380|=120, |1420-1380|=40 → 120
        assert!((bar.true_range(1380.0) - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=80, |1500-1560|=60, |1420-1560|=140 → 140
        assert!((bar.true_range(1560.0) - 140.0).abs() < f64::EPSILON);
    }
}
