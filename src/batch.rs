//! Adaptive batch sizing
//!
//! Keeps measured throughput near the configured target by doubling the
//! batch size when the pipeline runs below 80% of target and halving it
//! above 120%, clamped to the configured floor/ceiling. A memory guard
//! overrides the throughput rule: whenever available headroom drops under
//! the safety threshold the batch shrinks toward the floor regardless of
//! speed. Adjustments are rate-limited to one per cadence interval so the
//! controller cannot oscillate within a measurement window.

use std::time::{Duration, Instant};

use crate::config::ScanConfig;

/// What the controller decided on a given round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Doubled,
    Halved,
    Held,
    /// Memory guard fired; the throughput rule was overridden.
    MemoryClamped,
}

pub struct BatchController {
    size: usize,
    floor: usize,
    ceiling: usize,
    target_rate: f64,
    min_headroom: f64,
    cadence: Duration,
    last_change: Instant,
}

impl BatchController {
    /// Controller starts at the floor and grows from feedback.
    pub fn new(cfg: &ScanConfig) -> Self {
        Self {
            size: cfg.min_batch,
            floor: cfg.min_batch,
            ceiling: cfg.max_batch,
            target_rate: cfg.target_rate,
            min_headroom: cfg.min_memory_headroom,
            cadence: cfg.stats_interval,
            last_change: Instant::now(),
        }
    }

    pub fn current(&self) -> usize {
        self.size
    }

    /// Cadence-gated update. Returns the new size only when an adjustment
    /// actually happened this round.
    pub fn update(&mut self, throughput: f64, headroom: Option<f64>) -> Option<usize> {
        if self.last_change.elapsed() < self.cadence {
            return None;
        }
        self.last_change = Instant::now();
        match self.apply(throughput, headroom) {
            Adjustment::Held => None,
            _ => Some(self.size),
        }
    }

    /// The transition rule itself, cadence-free for testability.
    pub fn apply(&mut self, throughput: f64, headroom: Option<f64>) -> Adjustment {
        if let Some(frac) = headroom {
            if frac < self.min_headroom {
                let shrunk = (self.size / 2).max(self.floor);
                let changed = shrunk != self.size;
                self.size = shrunk;
                return if changed {
                    Adjustment::MemoryClamped
                } else {
                    Adjustment::Held
                };
            }
        }

        if throughput < self.target_rate * 0.8 {
            let grown = self.size.saturating_mul(2).min(self.ceiling);
            if grown != self.size {
                self.size = grown;
                return Adjustment::Doubled;
            }
        } else if throughput > self.target_rate * 1.2 {
            let shrunk = (self.size / 2).max(self.floor);
            if shrunk != self.size {
                self.size = shrunk;
                return Adjustment::Halved;
            }
        }
        Adjustment::Held
    }
}
