//! Open positions, exits, and the closed-trade record.

use chrono::NaiveDate;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::EntryKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    MaxHold,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "SL"),
            ExitReason::TakeProfit => write!(f, "TP"),
            ExitReason::MaxHold => write!(f, "MAX_HOLD"),
        }
    }
}

/// An open long position. Stop-loss and take-profit were fixed when the
/// signal armed and never move.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// Index of the fill bar.
    pub entry_idx: usize,
    pub kind: EntryKind,
    pub zone_number: u32,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    pub fn bars_held(&self, idx: usize) -> usize {
        idx - self.entry_idx
    }

    /// Exit check for one bar, in priority order: stop-loss on the bar's
    /// low, then take-profit on its high, then the time stop at the close.
    /// Returns the exit price and reason when the position closes.
    pub fn check_exit(
        &self,
        bar: &OhlcvBar,
        idx: usize,
        max_hold_bars: usize,
    ) -> Option<(f64, ExitReason)> {
        if bar.low <= self.stop_loss {
            return Some((self.stop_loss, ExitReason::StopLoss));
        }
        if bar.high >= self.take_profit {
            return Some((self.take_profit, ExitReason::TakeProfit));
        }
        if self.bars_held(idx) >= max_hold_bars {
            return Some((bar.close, ExitReason::MaxHold));
        }
        None
    }

    /// Consumes the position into a closed trade.
    pub fn close(self, exit_date: NaiveDate, exit_price: f64, reason: ExitReason, idx: usize) -> Trade {
        let bars_held = self.bars_held(idx);
        Trade {
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date,
            exit_price,
            exit_reason: reason,
            pnl_pct: pnl_pct(self.entry_price, exit_price),
            kind: self.kind,
            zone_number: self.zone_number,
            bars_held,
        }
    }
}

/// One row of the trade ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    /// Percent return, e.g. 3.2 for +3.2%.
    pub pnl_pct: f64,
    pub kind: EntryKind,
    pub zone_number: u32,
    pub bars_held: usize,
}

impl Trade {
    /// A trade is a win only on a strictly positive return.
    pub fn is_win(&self) -> bool {
        self.pnl_pct > 0.0
    }
}

pub fn pnl_pct(entry_price: f64, exit_price: f64) -> f64 {
    (exit_price - entry_price) / entry_price * 100.0
}
