//! keysweep: high-throughput keyspace scanning engine
//!
//! Continuously generates random candidate scalars, derives the matching
//! P2PKH address and tests it against a precomputed target set, recording
//! any hit durably.
//!
//! - `curve` / `address`: scalar -> compressed point -> hash160 -> base58check
//! - `keygen`: rejection-sampled candidate scalars behind a `KeySource` seam
//! - `targets`: immutable hash160 membership index built from dataset lines
//! - `batch`: throughput/memory feedback controller for batch sizing
//! - `supervisor`: worker pool, backpressure, Running/Draining/Stopped
//! - `sink`: append-only found-record log, written before counts publish
//!
//! Dataset download/decompression and terminal dashboards live in the
//! hosting process, not here.

pub mod address;
pub mod batch;
pub mod cli;
pub mod config;
pub mod curve;
pub mod error;
pub mod keygen;
pub mod mem;
pub mod sink;
pub mod stats;
pub mod supervisor;
pub mod targets;

pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use supervisor::{FinalReport, RunState, ShutdownHandle, Supervisor};
