//! Backtest engine: bar-by-bar replay of one instrument.
//!
//! Per-bar order is fixed: fill any pending signal at the open, then check
//! exits on the open position, then advance the signal machine. The machine
//! only runs while flat, and a signal armed on bar i always fills at bar
//! i+1's open, so there is no same-bar re-entry after an exit.

use crate::domain::buffer::{atr_series, buffer_at};
use crate::domain::error::ZonetraderError;
use crate::domain::filters::entry_filter_reason;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use crate::domain::position::{Position, Trade};
use crate::domain::signal::{ArmedSignal, BarView, SignalEvent, SignalMachine, TouchTracker};
use crate::domain::zone::ZoneSet;

/// Outcome of one instrument's backtest.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub code: String,
    pub trades: Vec<Trade>,
    /// A position still open on the last bar. Not a trade; reported
    /// separately.
    pub open_position: Option<Position>,
    pub events: Vec<SignalEvent>,
}

impl BacktestResult {
    fn empty(code: &str) -> Self {
        Self {
            code: code.to_string(),
            trades: Vec::new(),
            open_position: None,
            events: Vec::new(),
        }
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn win_count(&self) -> usize {
        self.trades.iter().filter(|t| t.is_win()).count()
    }

    pub fn loss_count(&self) -> usize {
        self.trades.len() - self.win_count()
    }

    /// Fraction of winning trades; 0.0 when there are no trades.
    pub fn win_rate(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        self.win_count() as f64 / self.trades.len() as f64
    }

    /// Sum of per-trade percent returns.
    pub fn total_pnl_pct(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl_pct).sum()
    }

    pub fn avg_pnl_pct(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        self.total_pnl_pct() / self.trades.len() as f64
    }
}

fn validate_bars(code: &str, bars: &[OhlcvBar]) -> Result<(), ZonetraderError> {
    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(ZonetraderError::InvalidBar {
                code: code.to_string(),
                date: bar.date,
                reason: "non-positive or non-finite price".to_string(),
            });
        }
        if bar.high < bar.low {
            return Err(ZonetraderError::InvalidBar {
                code: code.to_string(),
                date: bar.date,
                reason: "high below low".to_string(),
            });
        }
        if bar.volume < 0 {
            return Err(ZonetraderError::InvalidBar {
                code: code.to_string(),
                date: bar.date,
                reason: "negative volume".to_string(),
            });
        }
        if i > 0 && bars[i - 1].date >= bar.date {
            return Err(ZonetraderError::InvalidBar {
                code: code.to_string(),
                date: bar.date,
                reason: format!("date not after {}", bars[i - 1].date),
            });
        }
    }
    Ok(())
}

/// Replays `bars` against `zones` and returns the trade ledger, event log,
/// and any position still open at the end.
pub fn run_backtest(
    code: &str,
    bars: &[OhlcvBar],
    zones: &ZoneSet,
    params: &StrategyParams,
) -> Result<BacktestResult, ZonetraderError> {
    if bars.is_empty() {
        return Err(ZonetraderError::NoData {
            code: code.to_string(),
        });
    }
    validate_bars(code, bars)?;

    let start_idx = params.min_eligible_index();
    if bars.len() <= start_idx {
        return Err(ZonetraderError::InsufficientData {
            code: code.to_string(),
            bars: bars.len(),
            minimum: start_idx + 1,
        });
    }

    let mut result = BacktestResult::empty(code);
    if zones.is_empty() {
        return Ok(result);
    }

    let atr = atr_series(bars, params.atr_len);
    let touches = TouchTracker::prescan(&bars[..start_idx], zones);
    let mut machine = SignalMachine::new(zones, params, touches);
    let mut position: Option<Position> = None;
    let mut pending: Option<ArmedSignal> = None;

    for idx in start_idx..bars.len() {
        let bar = &bars[idx];

        if let Some(signal) = pending.take() {
            if bar.open >= signal.take_profit {
                // Gapped past the target overnight; nothing left to capture.
                result.events.push(SignalEvent::EntrySkipped {
                    date: bar.date,
                    kind: signal.kind,
                    zone: signal.zone.number,
                    open: bar.open,
                });
            } else if let Some(reason) = entry_filter_reason(bars, signal.signal_idx, params) {
                result.events.push(SignalEvent::EntryFiltered {
                    date: bar.date,
                    kind: signal.kind,
                    zone: signal.zone.number,
                    reason,
                });
            } else {
                result.events.push(SignalEvent::Entry {
                    date: bar.date,
                    kind: signal.kind,
                    zone: signal.zone.number,
                    price: bar.open,
                });
                position = Some(Position {
                    entry_date: bar.date,
                    entry_price: bar.open,
                    entry_idx: idx,
                    kind: signal.kind,
                    zone_number: signal.zone.number,
                    stop_loss: signal.stop_loss,
                    take_profit: signal.take_profit,
                });
            }
        }

        if let Some(pos) = position.take() {
            match pos.check_exit(bar, idx, params.max_hold_bars) {
                Some((price, reason)) => {
                    let trade = pos.close(bar.date, price, reason, idx);
                    result.events.push(SignalEvent::Exit {
                        date: bar.date,
                        reason,
                        price,
                        pnl_pct: trade.pnl_pct,
                    });
                    result.trades.push(trade);
                }
                None => position = Some(pos),
            }
        }

        if position.is_none() {
            if let Some(buffer) = buffer_at(bars, idx, &atr, params) {
                let view = BarView {
                    idx,
                    bar,
                    prev_close: bars[idx - 1].close,
                    buffer,
                };
                if let Some(signal) = machine.on_bar(&view, &mut result.events) {
                    pending = Some(signal);
                }
            }
        }
    }

    result.open_position = position;
    Ok(result)
}
