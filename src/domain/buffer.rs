//! Tolerance buffer derivation.
//!
//! The buffer widens zone boundaries for confirmation checks. Two methods:
//! ATR(atr_len) × atr_mult, or close × pct_buffer. ATR here is the simple
//! trailing mean of true range over the window (not Wilder smoothing), held
//! fixed across the crate.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::{BufferMethod, StrategyParams};

/// True range per bar; the first bar has no prior close so uses high - low.
pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

/// Simple rolling-mean ATR. `None` for the first `period - 1` bars.
pub fn atr_series(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let tr = true_ranges(bars);
    let mut out = Vec::with_capacity(tr.len());
    let mut window_sum = 0.0;

    for i in 0..tr.len() {
        window_sum += tr[i];
        if i >= period {
            window_sum -= tr[i - period];
        }
        if i + 1 >= period {
            out.push(Some(window_sum / period as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// Buffer for the bar at `idx`, or `None` when the ATR window has not filled
/// yet (the bar is then ineligible for signal evaluation).
pub fn buffer_at(
    bars: &[OhlcvBar],
    idx: usize,
    atr: &[Option<f64>],
    params: &StrategyParams,
) -> Option<f64> {
    match params.buffer_method {
        BufferMethod::Atr => atr.get(idx).copied().flatten().map(|a| a * params.atr_mult),
        BufferMethod::Pct => Some(bars[idx].close * params.pct_buffer),
    }
}
