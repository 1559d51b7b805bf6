//! Optional entry filters: volume confirmation and RSI.
//!
//! Both are checked against the signal bar when a pending entry is about to
//! fill; a failing filter discards the entry, it does not touch the state
//! machine.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;

/// Signal-bar volume relative to the trailing `lookback`-bar average.
/// `None` when history is short or the average volume is zero.
pub fn volume_ratio(bars: &[OhlcvBar], idx: usize, lookback: usize) -> Option<f64> {
    if idx < lookback || lookback == 0 {
        return None;
    }
    let avg: f64 = bars[idx - lookback..idx]
        .iter()
        .map(|b| b.volume as f64)
        .sum::<f64>()
        / lookback as f64;
    if avg == 0.0 {
        return None;
    }
    Some(bars[idx].volume as f64 / avg)
}

/// Simple-average RSI over `period` closes. `None` when history is short.
pub fn rsi(bars: &[OhlcvBar], idx: usize, period: usize) -> Option<f64> {
    if idx < period || period == 0 {
        return None;
    }
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for i in (idx - period + 1)..=idx {
        let change = bars[i].close - bars[i - 1].close;
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum += -change;
        }
    }
    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Returns a rejection reason when the enabled filters veto an entry whose
/// signal fired on bar `idx`, or `None` when the entry may proceed.
pub fn entry_filter_reason(
    bars: &[OhlcvBar],
    idx: usize,
    params: &StrategyParams,
) -> Option<String> {
    if params.use_volume_filter {
        match volume_ratio(bars, idx, params.vol_lookback) {
            None => return Some("volume ratio unavailable".into()),
            Some(ratio) if ratio < params.min_vol_ratio => {
                return Some(format!(
                    "volume {:.2}x below {:.2}x",
                    ratio, params.min_vol_ratio
                ));
            }
            Some(_) => {}
        }
    }
    if params.use_rsi_filter {
        match rsi(bars, idx, params.rsi_period) {
            None => return Some("RSI unavailable".into()),
            Some(value) if value >= params.max_rsi => {
                return Some(format!("RSI {:.0} at or above {:.0}", value, params.max_rsi));
            }
            Some(_) => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bar_with(day: u32, close: f64, volume: i64) -> OhlcvBar {
        OhlcvBar {
            code: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2025, 2, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        }
    }

    #[test]
    fn volume_ratio_flat_volume_is_one() {
        let bars: Vec<OhlcvBar> = (1..=5).map(|d| bar_with(d, 100.0, 1000)).collect();
        assert_relative_eq!(volume_ratio(&bars, 4, 3).unwrap(), 1.0);
    }

    #[test]
    fn volume_ratio_spike() {
        let mut bars: Vec<OhlcvBar> = (1..=4).map(|d| bar_with(d, 100.0, 1000)).collect();
        bars.push(bar_with(5, 100.0, 3000));
        assert_relative_eq!(volume_ratio(&bars, 4, 4).unwrap(), 3.0);
    }

    #[test]
    fn volume_ratio_needs_history() {
        let bars: Vec<OhlcvBar> = (1..=3).map(|d| bar_with(d, 100.0, 1000)).collect();
        assert!(volume_ratio(&bars, 2, 3).is_none());
    }

    #[test]
    fn volume_ratio_zero_average() {
        let bars: Vec<OhlcvBar> = (1..=4).map(|d| bar_with(d, 100.0, 0)).collect();
        assert!(volume_ratio(&bars, 3, 3).is_none());
    }

    #[test]
    fn rsi_all_gains_is_hundred() {
        let bars: Vec<OhlcvBar> = (1..=6)
            .map(|d| bar_with(d, 100.0 + d as f64, 1000))
            .collect();
        assert_relative_eq!(rsi(&bars, 5, 3).unwrap(), 100.0);
    }

    #[test]
    fn rsi_balanced_is_fifty() {
        // alternate +2 / -2 closes
        let closes = [100.0, 102.0, 100.0, 102.0, 100.0];
        let bars: Vec<OhlcvBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar_with(i as u32 + 1, c, 1000))
            .collect();
        assert_relative_eq!(rsi(&bars, 4, 4).unwrap(), 50.0);
    }

    #[test]
    fn rsi_needs_history() {
        let bars: Vec<OhlcvBar> = (1..=3).map(|d| bar_with(d, 100.0, 1000)).collect();
        assert!(rsi(&bars, 2, 3).is_none());
    }

    #[test]
    fn filters_disabled_never_reject() {
        let bars: Vec<OhlcvBar> = (1..=2).map(|d| bar_with(d, 100.0, 0)).collect();
        let params = StrategyParams::default();
        assert!(entry_filter_reason(&bars, 1, &params).is_none());
    }

    #[test]
    fn volume_filter_rejects_thin_bar() {
        let mut bars: Vec<OhlcvBar> = (1..=4).map(|d| bar_with(d, 100.0, 1000)).collect();
        bars.push(bar_with(5, 100.0, 400));
        let params = StrategyParams {
            use_volume_filter: true,
            vol_lookback: 4,
            min_vol_ratio: 1.0,
            ..Default::default()
        };
        let reason = entry_filter_reason(&bars, 4, &params).unwrap();
        assert!(reason.contains("volume"));
    }

    #[test]
    fn rsi_filter_rejects_overbought() {
        let bars: Vec<OhlcvBar> = (1..=8)
            .map(|d| bar_with(d, 100.0 + d as f64 * 2.0, 1000))
            .collect();
        let params = StrategyParams {
            use_rsi_filter: true,
            rsi_period: 5,
            max_rsi: 70.0,
            ..Default::default()
        };
        let reason = entry_filter_reason(&bars, 7, &params).unwrap();
        assert!(reason.contains("RSI"));
    }
}
