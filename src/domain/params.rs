//! Strategy parameter set.
//!
//! One immutable struct validated at load time
//! (see [`config_validation`](crate::domain::config_validation)); the engine
//! and state machine only ever read it.

/// How the per-bar tolerance buffer is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMethod {
    /// ATR(atr_len) × atr_mult.
    Atr,
    /// close × pct_buffer.
    Pct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub buffer_method: BufferMethod,
    pub atr_len: usize,
    pub atr_mult: f64,
    pub pct_buffer: f64,

    pub sl_pct: f64,
    pub tp_buffer_pct: f64,
    pub max_hold_bars: usize,

    pub confirm_bars_retest: usize,
    pub confirm_closes_breakout: u32,
    pub not_late_pct: f64,

    /// Volume confirmation filter: require signal-bar volume >= min_vol_ratio
    /// times the trailing vol_lookback average.
    pub use_volume_filter: bool,
    pub vol_lookback: usize,
    pub min_vol_ratio: f64,

    /// RSI filter: reject entries when the signal bar is overbought.
    pub use_rsi_filter: bool,
    pub rsi_period: usize,
    pub max_rsi: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            buffer_method: BufferMethod::Atr,
            atr_len: 14,
            atr_mult: 0.20,
            pct_buffer: 0.005,
            sl_pct: 0.05,
            tp_buffer_pct: 0.02,
            max_hold_bars: 60,
            confirm_bars_retest: 3,
            confirm_closes_breakout: 2,
            not_late_pct: 0.35,
            use_volume_filter: false,
            vol_lookback: 20,
            min_vol_ratio: 1.0,
            use_rsi_filter: false,
            rsi_period: 14,
            max_rsi: 70.0,
        }
    }
}

impl StrategyParams {
    /// First bar index eligible for signal evaluation: the buffer needs
    /// `atr_len + 1` bars of history before it.
    pub fn min_eligible_index(&self) -> usize {
        self.atr_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let p = StrategyParams::default();
        assert_eq!(p.buffer_method, BufferMethod::Atr);
        assert_eq!(p.atr_len, 14);
        assert!((p.atr_mult - 0.20).abs() < f64::EPSILON);
        assert!((p.pct_buffer - 0.005).abs() < f64::EPSILON);
        assert!((p.sl_pct - 0.05).abs() < f64::EPSILON);
        assert!((p.tp_buffer_pct - 0.02).abs() < f64::EPSILON);
        assert_eq!(p.max_hold_bars, 60);
        assert_eq!(p.confirm_bars_retest, 3);
        assert_eq!(p.confirm_closes_breakout, 2);
        assert!((p.not_late_pct - 0.35).abs() < f64::EPSILON);
        assert!(!p.use_volume_filter);
        assert!(!p.use_rsi_filter);
    }

    #[test]
    fn min_eligible_index_follows_atr_len() {
        let p = StrategyParams {
            atr_len: 5,
            ..Default::default()
        };
        assert_eq!(p.min_eligible_index(), 5);
    }
}
