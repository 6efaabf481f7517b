//! Scan configuration
//!
//! All tunables are injected here by the hosting process (CLI or tests).
//! Defaults follow the batch/throughput parameters the scanner has always
//! shipped with: floor 10K, ceiling 500K, 5M keys/sec target.

use std::time::Duration;

use crate::error::{Result, ScanError};

/// Configuration for a scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of worker threads (default: auto-detect, minimum 1)
    pub workers: usize,
    /// Batch size floor
    pub min_batch: usize,
    /// Batch size ceiling
    pub max_batch: usize,
    /// Target throughput in keys per second
    pub target_rate: f64,
    /// Cadence for throughput measurement and batch resizing
    pub stats_interval: Duration,
    /// Available-memory fraction below which batches shrink toward the floor
    pub min_memory_headroom: f64,
    /// Maximum number of batches in flight (backpressure limit)
    pub inflight_limit: usize,
    /// Optional candidate-count budget; the run drains once reached
    pub max_keys: Option<u64>,
    /// Optional wall-clock budget; the run drains once elapsed
    pub max_runtime: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            workers,
            min_batch: 10_000,
            max_batch: 500_000,
            target_rate: 5_000_000.0,
            stats_interval: Duration::from_secs(2),
            min_memory_headroom: 0.10,
            inflight_limit: workers * 2,
            max_keys: None,
            max_runtime: None,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ScanError::Config("workers must be at least 1".into()));
        }
        if self.min_batch == 0 {
            return Err(ScanError::Config("min_batch must be at least 1".into()));
        }
        if self.min_batch > self.max_batch {
            return Err(ScanError::Config(format!(
                "min_batch {} exceeds max_batch {}",
                self.min_batch, self.max_batch
            )));
        }
        if self.inflight_limit == 0 {
            return Err(ScanError::Config("inflight_limit must be at least 1".into()));
        }
        if !(self.target_rate > 0.0) {
            return Err(ScanError::Config("target_rate must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.min_memory_headroom) {
            return Err(ScanError::Config(
                "min_memory_headroom must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}
