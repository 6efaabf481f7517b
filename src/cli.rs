//! CLI argument surface
//!
//! The core takes its tunables as an injected [`ScanConfig`]; this module
//! is just the clap layer mapping flags onto it.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::ScanConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Keyspace scanner: derive addresses, test against a target set, record matches")]
pub struct Args {
    /// Target dataset: tab-separated `address<TAB>balance` lines
    #[arg(short = 'i', long = "targets", value_name = "FILE")]
    pub targets: PathBuf,

    /// Append-only found-record log
    #[arg(short = 'o', long = "found", value_name = "FILE", default_value = "found.txt")]
    pub found: PathBuf,

    /// Number of worker threads (default: auto-detect)
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Batch size floor
    #[arg(long, value_name = "N", default_value_t = 10_000)]
    pub min_batch: usize,

    /// Batch size ceiling
    #[arg(long, value_name = "N", default_value_t = 500_000)]
    pub max_batch: usize,

    /// Target throughput in keys per second
    #[arg(long, value_name = "RATE", default_value_t = 5_000_000.0)]
    pub target_rate: f64,

    /// Throughput measurement and resize cadence, seconds
    #[arg(long, value_name = "SECS", default_value_t = 2.0)]
    pub stats_interval: f64,

    /// Available-memory fraction below which batches shrink
    #[arg(long, value_name = "FRAC", default_value_t = 0.10)]
    pub memory_headroom: f64,

    /// Optional stop after checking N candidates
    #[arg(long, value_name = "N")]
    pub max_keys: Option<u64>,

    /// Optional stop after N seconds
    #[arg(long, value_name = "SECS")]
    pub max_seconds: Option<u64>,
}

impl Args {
    pub fn to_config(&self) -> ScanConfig {
        let defaults = ScanConfig::default();
        let workers = self.threads.unwrap_or(defaults.workers).max(1);
        ScanConfig {
            workers,
            min_batch: self.min_batch,
            max_batch: self.max_batch,
            target_rate: self.target_rate,
            stats_interval: Duration::from_secs_f64(self.stats_interval),
            min_memory_headroom: self.memory_headroom,
            inflight_limit: workers * 2,
            max_keys: self.max_keys,
            max_runtime: self.max_seconds.map(Duration::from_secs),
        }
    }
}
