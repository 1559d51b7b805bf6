//! Price zones and per-instrument zone lookups.
//!
//! A zone is a static support/resistance band. Zones for an instrument are
//! 1-based, numbered ascending by price, non-overlapping, and never change
//! during a backtest run.

use crate::domain::error::ZonetraderError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    /// 1-based, ascending by price.
    pub number: u32,
    pub low: f64,
    pub high: f64,
}

impl Zone {
    pub fn contains(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

/// Ordered zone list for one instrument. May be empty ("no tracked zones"),
/// in which case no signal ever fires for that instrument.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    /// Validates and builds a zone set. Rejects non-positive bounds,
    /// inverted bands, gaps in numbering, and overlapping zones.
    pub fn new(code: &str, mut zones: Vec<Zone>) -> Result<Self, ZonetraderError> {
        zones.sort_by_key(|z| z.number);

        for (i, z) in zones.iter().enumerate() {
            if z.number != (i + 1) as u32 {
                return Err(ZonetraderError::ZoneConfig {
                    code: code.to_string(),
                    reason: format!(
                        "zone numbers must run 1..{} without gaps, found {}",
                        zones.len(),
                        z.number
                    ),
                });
            }
            if !z.low.is_finite() || !z.high.is_finite() || z.low <= 0.0 {
                return Err(ZonetraderError::ZoneConfig {
                    code: code.to_string(),
                    reason: format!("zone {} has non-positive bounds", z.number),
                });
            }
            if z.low >= z.high {
                return Err(ZonetraderError::ZoneConfig {
                    code: code.to_string(),
                    reason: format!("zone {} has low >= high", z.number),
                });
            }
            if i > 0 && zones[i - 1].high >= z.low {
                return Err(ZonetraderError::ZoneConfig {
                    code: code.to_string(),
                    reason: format!("zone {} overlaps zone {}", z.number, zones[i - 1].number),
                });
            }
        }

        Ok(Self { zones })
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// The zone acting as support for `close`: the containing zone, else the
    /// nearest zone strictly below, else none.
    pub fn active_support(&self, close: f64) -> Option<&Zone> {
        if let Some(z) = self.zones.iter().find(|z| z.contains(close)) {
            return Some(z);
        }
        // Ascending by price, so the last zone below is the nearest.
        self.zones.iter().rev().find(|z| close > z.high)
    }

    /// The zone acting as resistance for `close`: the containing zone, else
    /// the nearest zone strictly above, else none.
    pub fn active_resistance(&self, close: f64) -> Option<&Zone> {
        if let Some(z) = self.zones.iter().find(|z| z.contains(close)) {
            return Some(z);
        }
        self.zones.iter().find(|z| close < z.low)
    }

    /// The zone with the next-higher number, or none if `zone` is the last.
    pub fn next_zone(&self, zone: &Zone) -> Option<&Zone> {
        self.zones.get(zone.number as usize)
    }

    /// Take-profit level for a signal on `zone`: the next zone's low shaded
    /// by `tp_buffer_pct`. None when no next zone exists — such signals are
    /// ineligible to enter.
    pub fn take_profit(&self, zone: &Zone, tp_buffer_pct: f64) -> Option<f64> {
        self.next_zone(zone).map(|z| z.low * (1.0 - tp_buffer_pct))
    }

    /// Breakout detection: prior close at or below a zone's low and current
    /// close above its high. Lowest-numbered qualifying zone wins.
    pub fn detect_breakout(&self, prev_close: f64, close: f64) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|z| prev_close <= z.low && close > z.high)
    }
}
