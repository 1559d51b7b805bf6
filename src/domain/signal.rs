//! Zone signal state machine.
//!
//! Consumes one bar at a time and emits at most one armed signal per bar.
//! Two paths share the machine: retests of a previously-touched resistance
//! zone acting as support, and breakouts through a zone confirmed by a
//! three-day gate. While a gate is counting, retest evaluation is frozen so
//! the two paths cannot emit conflicting signals.

use chrono::NaiveDate;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use crate::domain::position::ExitReason;
use crate::domain::zone::{Zone, ZoneSet};

/// Consecutive qualifying closes required to pass the breakout gate.
const GATE_CLOSES: u32 = 3;
/// Closes above the zone required after a pullback rebreak.
const PULLBACK_CONFIRM_CLOSES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Retest,
    BoHold,
    BoPullback,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Retest => write!(f, "RETEST"),
            EntryKind::BoHold => write!(f, "BO_HOLD"),
            EntryKind::BoPullback => write!(f, "BO_PULLBACK"),
        }
    }
}

/// A confirmed signal waiting for its fill at the next bar's open.
/// Stop-loss and take-profit are fixed here, at arm time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmedSignal {
    pub kind: EntryKind,
    pub zone: Zone,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Index of the bar the signal armed on.
    pub signal_idx: usize,
}

/// Per-instrument machine state. Each variant carries only the counters that
/// are meaningful in that state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalState {
    Idle,
    RetestPending {
        zone: Zone,
        touch_idx: usize,
    },
    BreakoutGate {
        zone: Zone,
        count: u32,
        start_idx: usize,
    },
    BreakoutArmed {
        zone: Zone,
        confirm_count: u32,
        pulled_back: bool,
        rebreak: bool,
    },
}

/// Typed event log entry; collected by the engine, printed under --verbose.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalEvent {
    BreakoutStart { date: NaiveDate, zone: u32 },
    GatePassed { date: NaiveDate, zone: u32 },
    GateReset { date: NaiveDate, zone: u32 },
    GateFail { date: NaiveDate, zone: u32 },
    RetestTrigger { date: NaiveDate, zone: u32 },
    RetestCancel { date: NaiveDate, zone: u32 },
    RetestTimeout { date: NaiveDate, zone: u32 },
    SignalArmed { date: NaiveDate, kind: EntryKind, zone: u32 },
    EntryFiltered { date: NaiveDate, kind: EntryKind, zone: u32, reason: String },
    /// The fill bar opened at or past the take-profit, so nothing was left
    /// to capture and the armed signal was dropped.
    EntrySkipped { date: NaiveDate, kind: EntryKind, zone: u32, open: f64 },
    Entry { date: NaiveDate, kind: EntryKind, zone: u32, price: f64 },
    Exit { date: NaiveDate, reason: ExitReason, price: f64, pnl_pct: f64 },
}

impl std::fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalEvent::BreakoutStart { date, zone } => {
                write!(f, "{date} BREAKOUT_START zone {zone}")
            }
            SignalEvent::GatePassed { date, zone } => write!(f, "{date} GATE_PASSED zone {zone}"),
            SignalEvent::GateReset { date, zone } => write!(f, "{date} GATE_RESET zone {zone}"),
            SignalEvent::GateFail { date, zone } => write!(f, "{date} GATE_FAIL zone {zone}"),
            SignalEvent::RetestTrigger { date, zone } => {
                write!(f, "{date} RETEST_TRIGGER zone {zone}")
            }
            SignalEvent::RetestCancel { date, zone } => {
                write!(f, "{date} RETEST_CANCEL zone {zone}")
            }
            SignalEvent::RetestTimeout { date, zone } => {
                write!(f, "{date} RETEST_TIMEOUT zone {zone}")
            }
            SignalEvent::SignalArmed { date, kind, zone } => {
                write!(f, "{date} SIGNAL_ARMED {kind} zone {zone}")
            }
            SignalEvent::EntryFiltered {
                date,
                kind,
                zone,
                reason,
            } => write!(f, "{date} ENTRY_FILTERED {kind} zone {zone}: {reason}"),
            SignalEvent::EntrySkipped {
                date,
                kind,
                zone,
                open,
            } => write!(f, "{date} ENTRY_SKIPPED {kind} zone {zone}: open {open:.2} at or past target"),
            SignalEvent::Entry {
                date,
                kind,
                zone,
                price,
            } => write!(f, "{date} ENTRY {kind} zone {zone} @ {price:.2}"),
            SignalEvent::Exit {
                date,
                reason,
                price,
                pnl_pct,
            } => write!(f, "{date} EXIT {reason} @ {price:.2} ({pnl_pct:+.2}%)"),
        }
    }
}

/// Per-zone record of historical resistance touches. A retest signal on a
/// zone requires that the zone was touched while acting as resistance.
#[derive(Debug, Clone)]
pub struct TouchTracker {
    touched: Vec<bool>,
}

impl TouchTracker {
    pub fn new(zone_count: usize) -> Self {
        Self {
            touched: vec![false; zone_count],
        }
    }

    /// Initializes touch flags from the bars before the evaluable range, so
    /// retests are not missed merely because tracking started later. Uses a
    /// 1% approximation of the buffer since no ATR is available yet.
    pub fn prescan(bars: &[OhlcvBar], zones: &ZoneSet) -> Self {
        let mut tracker = Self::new(zones.len());
        for bar in bars {
            if let Some(r) = zones.active_resistance(bar.close) {
                if bar.high >= r.low - bar.close * 0.01 {
                    tracker.record(r.number);
                }
            }
        }
        tracker
    }

    pub fn record(&mut self, zone_number: u32) {
        if let Some(flag) = self.touched.get_mut(zone_number as usize - 1) {
            *flag = true;
        }
    }

    pub fn touched(&self, zone_number: u32) -> bool {
        self.touched
            .get(zone_number as usize - 1)
            .copied()
            .unwrap_or(false)
    }

    pub fn clear(&mut self, zone_number: u32) {
        if let Some(flag) = self.touched.get_mut(zone_number as usize - 1) {
            *flag = false;
        }
    }
}

/// One bar's worth of context for the machine.
#[derive(Debug, Clone, Copy)]
pub struct BarView<'a> {
    pub idx: usize,
    pub bar: &'a OhlcvBar,
    pub prev_close: f64,
    pub buffer: f64,
}

pub struct SignalMachine<'a> {
    zones: &'a ZoneSet,
    params: &'a StrategyParams,
    state: SignalState,
    touches: TouchTracker,
}

impl<'a> SignalMachine<'a> {
    pub fn new(zones: &'a ZoneSet, params: &'a StrategyParams, touches: TouchTracker) -> Self {
        Self {
            zones,
            params,
            state: SignalState::Idle,
            touches,
        }
    }

    pub fn state(&self) -> &SignalState {
        &self.state
    }

    /// Advances the machine by one bar. Returns an armed signal when an
    /// entry confirmed on this bar; the fill belongs to the next bar's open.
    pub fn on_bar(
        &mut self,
        view: &BarView<'_>,
        events: &mut Vec<SignalEvent>,
    ) -> Option<ArmedSignal> {
        let bar = view.bar;
        let close = bar.close;

        // Captured before any transition: a gate active at the start of the
        // bar freezes retest evaluation for the whole bar.
        let frozen = matches!(self.state, SignalState::BreakoutGate { .. });
        let tracking_breakout = matches!(
            self.state,
            SignalState::BreakoutGate { .. } | SignalState::BreakoutArmed { .. }
        );

        if !tracking_breakout {
            if let Some(r) = self.zones.active_resistance(close) {
                if bar.high >= r.low - view.buffer {
                    self.touches.record(r.number);
                }
            }
        }

        self.detect_breakout(view, events);
        self.update_gate(view, events);
        if let Some(signal) = self.update_armed(view, events) {
            return Some(signal);
        }
        if !frozen {
            return self.evaluate_retest(view, events);
        }
        None
    }

    /// Breakout detection, including the zone-override policy: a breakout on
    /// a different zone while tracking one restarts the gate on the new zone.
    fn detect_breakout(&mut self, view: &BarView<'_>, events: &mut Vec<SignalEvent>) {
        let Some(z) = self
            .zones
            .detect_breakout(view.prev_close, view.bar.close)
        else {
            return;
        };
        let take = match self.state {
            SignalState::Idle | SignalState::RetestPending { .. } => true,
            SignalState::BreakoutGate { zone, .. } | SignalState::BreakoutArmed { zone, .. } => {
                zone.number != z.number
            }
        };
        if take {
            self.state = SignalState::BreakoutGate {
                zone: *z,
                count: 1,
                start_idx: view.idx,
            };
            events.push(SignalEvent::BreakoutStart {
                date: view.bar.date,
                zone: z.number,
            });
        }
    }

    fn update_gate(&mut self, view: &BarView<'_>, events: &mut Vec<SignalEvent>) {
        let SignalState::BreakoutGate {
            zone,
            count,
            start_idx,
        } = self.state
        else {
            return;
        };
        // The detection bar already counted itself.
        if view.idx <= start_idx {
            return;
        }
        let close = view.bar.close;
        if close >= zone.high {
            let count = count + 1;
            if count >= GATE_CLOSES {
                self.state = SignalState::BreakoutArmed {
                    zone,
                    confirm_count: 0,
                    pulled_back: false,
                    rebreak: false,
                };
                events.push(SignalEvent::GatePassed {
                    date: view.bar.date,
                    zone: zone.number,
                });
            } else {
                self.state = SignalState::BreakoutGate {
                    zone,
                    count,
                    start_idx,
                };
            }
        } else if close >= zone.low {
            // Back inside the zone: the count restarts on the next
            // qualifying close.
            self.state = SignalState::BreakoutGate {
                zone,
                count: 0,
                start_idx: view.idx,
            };
            events.push(SignalEvent::GateReset {
                date: view.bar.date,
                zone: zone.number,
            });
        } else {
            self.state = SignalState::Idle;
            events.push(SignalEvent::GateFail {
                date: view.bar.date,
                zone: zone.number,
            });
        }
    }

    /// Post-gate confirmation: BO_HOLD on consecutive closes above the zone,
    /// or BO_PULLBACK when price dipped back into the buffered zone first.
    /// Runs on the gate-passing bar as well, so that bar counts toward
    /// confirmation when its close qualifies.
    fn update_armed(
        &mut self,
        view: &BarView<'_>,
        events: &mut Vec<SignalEvent>,
    ) -> Option<ArmedSignal> {
        let SignalState::BreakoutArmed {
            zone,
            mut confirm_count,
            mut pulled_back,
            mut rebreak,
        } = self.state
        else {
            return None;
        };
        let close = view.bar.close;
        let broke_out = close > zone.high;
        let inside = close >= zone.low - view.buffer && close <= zone.high + view.buffer;

        if inside && !pulled_back {
            pulled_back = true;
            rebreak = false;
            confirm_count = 0;
        }

        if broke_out {
            let mut can_enter = false;
            if pulled_back {
                if !rebreak {
                    rebreak = true;
                    confirm_count = 1;
                } else {
                    confirm_count += 1;
                    if confirm_count >= PULLBACK_CONFIRM_CLOSES {
                        can_enter = true;
                    }
                }
            } else {
                confirm_count += 1;
                if confirm_count >= self.params.confirm_closes_breakout {
                    can_enter = true;
                }
            }

            if can_enter {
                // No next zone means no take-profit target: the signal is
                // silently ineligible and the breakout tracking ends.
                let Some(tp) = self.zones.take_profit(&zone, self.params.tp_buffer_pct) else {
                    self.state = SignalState::Idle;
                    return None;
                };
                let kind = if pulled_back {
                    EntryKind::BoPullback
                } else {
                    EntryKind::BoHold
                };
                let sl_base = match kind {
                    EntryKind::BoHold => zone.high,
                    _ => zone.low,
                };
                self.touches.clear(zone.number);
                self.state = SignalState::Idle;
                events.push(SignalEvent::SignalArmed {
                    date: view.bar.date,
                    kind,
                    zone: zone.number,
                });
                return Some(ArmedSignal {
                    kind,
                    zone,
                    stop_loss: sl_base * (1.0 - self.params.sl_pct),
                    take_profit: tp,
                    signal_idx: view.idx,
                });
            }
        } else if !inside {
            confirm_count = 0;
        }

        self.state = SignalState::BreakoutArmed {
            zone,
            confirm_count,
            pulled_back,
            rebreak,
        };
        None
    }

    fn evaluate_retest(
        &mut self,
        view: &BarView<'_>,
        events: &mut Vec<SignalEvent>,
    ) -> Option<ArmedSignal> {
        let bar = view.bar;
        let close = bar.close;

        if matches!(self.state, SignalState::Idle) {
            if let Some(s) = self.zones.active_support(close) {
                // A zone without a next zone has no take-profit target and
                // never triggers.
                if let Some(tp_check) = self.zones.take_profit(s, self.params.tp_buffer_pct) {
                    let touch = bar.low <= s.high;
                    let hold = close >= s.low;
                    let from_above = view.prev_close > s.high;
                    let not_late =
                        close <= s.high + self.params.not_late_pct * (tp_check - s.high);
                    if touch && hold && from_above && not_late && self.touches.touched(s.number) {
                        self.state = SignalState::RetestPending {
                            zone: *s,
                            touch_idx: view.idx,
                        };
                        events.push(SignalEvent::RetestTrigger {
                            date: bar.date,
                            zone: s.number,
                        });
                    }
                }
            }
        }

        let SignalState::RetestPending { zone, touch_idx } = self.state else {
            return None;
        };
        let bars_from_touch = view.idx - touch_idx;
        if close < zone.low {
            self.state = SignalState::Idle;
            events.push(SignalEvent::RetestCancel {
                date: bar.date,
                zone: zone.number,
            });
        } else if bars_from_touch <= self.params.confirm_bars_retest {
            if close >= zone.high + view.buffer {
                self.state = SignalState::Idle;
                let tp = self.zones.take_profit(&zone, self.params.tp_buffer_pct)?;
                self.touches.clear(zone.number);
                events.push(SignalEvent::SignalArmed {
                    date: bar.date,
                    kind: EntryKind::Retest,
                    zone: zone.number,
                });
                return Some(ArmedSignal {
                    kind: EntryKind::Retest,
                    zone,
                    stop_loss: zone.low * (1.0 - self.params.sl_pct),
                    take_profit: tp,
                    signal_idx: view.idx,
                });
            }
        } else {
            self.state = SignalState::Idle;
            events.push(SignalEvent::RetestTimeout {
                date: bar.date,
                zone: zone.number,
            });
        }
        None
    }
}
