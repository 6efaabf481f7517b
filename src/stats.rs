//! Shared scan counters and throughput smoothing
//!
//! Workers only ever increment; the supervisor reads. The `found` counter
//! is incremented strictly after the corresponding record has been written
//! to the result sink, so externally visible counts never run ahead of
//! durable matches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct Stats {
    checked: AtomicU64,
    found: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub checked: u64,
    pub found: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_checked(&self, n: u64) {
        self.checked.fetch_add(n, Ordering::Relaxed);
    }

    /// Record a durably written match. Callers must have flushed the
    /// record to the sink before calling this.
    #[inline]
    pub fn record_found(&self) {
        self.found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checked: self.checked.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
        }
    }
}

/// Exponentially smoothed throughput estimate, ticked on the stats cadence.
pub struct ThroughputMeter {
    last_total: u64,
    last_tick: Instant,
    ema: Option<f64>,
    alpha: f64,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self {
            last_total: 0,
            last_tick: Instant::now(),
            ema: None,
            alpha: 0.3,
        }
    }

    /// Fold the current total into the estimate and return the smoothed
    /// keys-per-second rate.
    pub fn tick(&mut self, total_checked: u64) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick).as_secs_f64();
        if elapsed <= 0.0 {
            return self.ema.unwrap_or(0.0);
        }
        let raw = total_checked.saturating_sub(self.last_total) as f64 / elapsed;
        self.last_total = total_checked;
        self.last_tick = now;
        let smoothed = match self.ema {
            None => raw,
            Some(prev) => prev + self.alpha * (raw - prev),
        };
        self.ema = Some(smoothed);
        smoothed
    }

    pub fn current(&self) -> f64 {
        self.ema.unwrap_or(0.0)
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn counters_are_monotonic() {
        let stats = Stats::new();
        stats.add_checked(100);
        stats.add_checked(50);
        stats.record_found();
        let snap = stats.snapshot();
        assert_eq!(snap.checked, 150);
        assert_eq!(snap.found, 1);
    }

    #[test]
    fn meter_first_tick_uses_raw_rate() {
        let mut meter = ThroughputMeter::new();
        std::thread::sleep(Duration::from_millis(50));
        let rate = meter.tick(1000);
        // ~1000 keys over ~50ms -> on the order of 20K/s
        assert!(rate > 1_000.0, "rate {}", rate);
    }

    #[test]
    fn meter_smooths_toward_new_rate() {
        let mut meter = ThroughputMeter::new();
        std::thread::sleep(Duration::from_millis(20));
        let first = meter.tick(10_000);
        std::thread::sleep(Duration::from_millis(20));
        // Throughput collapses to zero; the EMA must move down but not
        // all the way in a single tick.
        let second = meter.tick(10_000);
        assert!(second < first);
        assert!(second > 0.0);
    }
}
