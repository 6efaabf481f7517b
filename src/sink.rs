//! Durable match log
//!
//! Append-only, one tab-separated line per match:
//!
//! `timestamp<TAB>address<TAB>wif<TAB>balance`
//!
//! Each record is written whole and flushed before the caller publishes
//! the match in the shared counters, so a crash can lose at most a match
//! that was never counted, never the reverse. The writer mutex keeps
//! concurrent appends from interleaving partial lines.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{Result, ScanError};

/// A confirmed match, ready to persist.
#[derive(Debug, Clone)]
pub struct FoundRecord {
    pub address: String,
    pub wif: String,
    pub balance: u64,
    pub timestamp: DateTime<Utc>,
}

impl FoundRecord {
    pub fn new(address: String, wif: String, balance: u64) -> Self {
        Self {
            address,
            wif,
            balance,
            timestamp: Utc::now(),
        }
    }

    fn as_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            self.timestamp.to_rfc3339(),
            self.address,
            self.wif,
            self.balance
        )
    }
}

#[derive(Debug)]
pub struct ResultSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl ResultSink {
    /// Open (or create) the append-only log. Failure here is fatal to
    /// startup: scanning without a durable sink would silently drop finds.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ScanError::Sink {
                path: path.display().to_string(),
                source: e,
            })?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Append one complete record and flush it to the OS.
    pub fn append(&self, record: &FoundRecord) -> Result<()> {
        let line = record.as_line();
        let mut writer = self.writer.lock();
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| ScanError::Sink {
                path: self.path.display().to_string(),
                source: e,
            })
    }

    /// Drain-path flush with bounded retries. Returns the last error if
    /// every attempt fails; callers surface it as a final-report warning.
    pub fn flush_with_retries(&self, attempts: u32) -> Result<()> {
        let mut last = None;
        for _ in 0..attempts.max(1) {
            match self.writer.lock().flush() {
                Ok(()) => return Ok(()),
                Err(e) => last = Some(e),
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        Err(ScanError::Sink {
            path: self.path.display().to_string(),
            source: last.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "flush failed")
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
