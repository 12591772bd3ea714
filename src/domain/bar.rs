use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One OHLC price observation for a fixed one-minute interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Rejects bars that are physically impossible or carry non-finite prices.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.low <= self.high
    }
}

/// Drops invalid bars and any bar that does not advance the clock.
///
/// Timestamps must be strictly increasing; gaps are tolerated, duplicates
/// are not. The surviving sequence is returned in input order.
pub fn sanitize_bars(bars: Vec<Bar>) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        if !bar.is_valid() {
            warn!("Dropping invalid bar at {}", bar.timestamp);
            continue;
        }
        if let Some(last) = out.last() {
            if bar.timestamp <= last.timestamp {
                warn!(
                    "Dropping out-of-order bar at {} (last kept {})",
                    bar.timestamp, last.timestamp
                );
                continue;
            }
        }
        out.push(bar);
    }
    out
}
