//! Target address set
//!
//! Built once from tab-separated `address<TAB>balance` records, then
//! queried read-only by every worker for the rest of the process. Keys
//! are stored as decoded hash160 values in an FxHash map, so the hot-path
//! membership probe is a 20-byte hash lookup and no base58 encode is
//! needed per candidate.
//!
//! Malformed records (bad field count, non-numeric balance, addresses that
//! fail the checksum) are counted and skipped, never fatal. A memory-guard
//! probe can truncate the load early; the partial result is flagged in the
//! [`LoadReport`] rather than hidden.

use fxhash::FxHashMap;
use rayon::prelude::*;

use crate::address::decode_address;
use crate::error::{Result, ScanError};

/// Lines decoded per parallel chunk.
const CHUNK_LINES: usize = 65_536;

/// Outcome of a target load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    /// True when the load stopped early under memory pressure.
    pub truncated: bool,
}

/// Immutable membership index over target addresses.
#[derive(Debug)]
pub struct TargetSet {
    map: FxHashMap<[u8; 20], u64>,
    report: LoadReport,
}

impl TargetSet {
    /// Build from an iterator of raw dataset lines, no memory guard.
    pub fn from_lines<I>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_lines_guarded(lines, 0.0, crate::mem::available_fraction)
    }

    /// Build with a memory guard: loading stops (and the report is marked
    /// truncated) once `probe` reports less headroom than `min_headroom`.
    pub fn from_lines_guarded<I, F>(lines: I, min_headroom: f64, probe: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn() -> Option<f64>,
    {
        let mut map = FxHashMap::default();
        let mut report = LoadReport::default();
        let mut chunk: Vec<String> = Vec::with_capacity(CHUNK_LINES);
        let mut lines = lines.into_iter();

        loop {
            chunk.clear();
            chunk.extend(lines.by_ref().take(CHUNK_LINES));
            if chunk.is_empty() {
                break;
            }

            let decoded: Vec<Option<([u8; 20], u64)>> =
                chunk.par_iter().map(|line| parse_line(line)).collect();

            for entry in decoded {
                match entry {
                    Some((hash, balance)) => {
                        map.insert(hash, balance);
                        report.loaded += 1;
                    }
                    None => report.skipped += 1,
                }
            }

            if let Some(headroom) = probe() {
                if headroom < min_headroom {
                    eprintln!(
                        "[!] Memory headroom {:.1}% below {:.1}%, truncating target load at {} entries",
                        headroom * 100.0,
                        min_headroom * 100.0,
                        report.loaded
                    );
                    report.truncated = true;
                    break;
                }
            }
        }

        if map.is_empty() {
            return Err(ScanError::EmptyTargetSet {
                skipped: report.skipped,
            });
        }

        Ok(Self { map, report })
    }

    #[inline]
    pub fn contains(&self, hash: &[u8; 20]) -> bool {
        self.map.contains_key(hash)
    }

    /// Balance for a target, `None` when the hash is not a target.
    #[inline]
    pub fn balance(&self, hash: &[u8; 20]) -> Option<u64> {
        self.map.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

/// Parse one dataset record: `address` or `address<TAB>balance`.
///
/// Balance follows the dataset convention of possibly being written as a
/// float; it is truncated to whole units. More than two fields, negative
/// or non-numeric balances, and undecodable addresses are all malformed.
fn parse_line(line: &str) -> Option<([u8; 20], u64)> {
    let mut fields = line.trim().split('\t');
    let addr = fields.next()?.trim();
    if addr.is_empty() {
        return None;
    }
    let balance_field = fields.next();
    if fields.next().is_some() {
        return None;
    }
    let balance = match balance_field {
        None => 0,
        Some(raw) => {
            let v: f64 = raw.trim().parse().ok()?;
            if !v.is_finite() || v < 0.0 {
                return None;
            }
            v as u64
        }
    };
    let hash = decode_address(addr)?;
    Some((hash, balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::address_from_hash160;

    fn synth_hash(n: u32) -> [u8; 20] {
        let mut h = [0u8; 20];
        h[..4].copy_from_slice(&n.to_be_bytes());
        h
    }

    fn synth_addr(n: u32) -> String {
        address_from_hash160(&synth_hash(n))
    }

    #[test]
    fn membership_exact() {
        let lines = vec![
            format!("{}\t500", synth_addr(1)),
            format!("{}\t0", synth_addr(2)),
        ];
        let set = TargetSet::from_lines(lines).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&synth_hash(1)));
        assert!(set.contains(&synth_hash(2)));
        assert!(!set.contains(&synth_hash(3)));
        assert_eq!(set.balance(&synth_hash(1)), Some(500));
        assert_eq!(set.balance(&synth_hash(2)), Some(0));
        assert_eq!(set.balance(&synth_hash(3)), None);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let lines = vec![
            format!("{}\t500", synth_addr(1)),
            "not-an-address\t10".to_string(),          // bad address
            format!("{}\tNaN", synth_addr(2)),         // non-numeric balance
            format!("{}\t-5", synth_addr(3)),          // negative balance
            format!("{}\t1\textra\tfields", synth_addr(4)), // field count
            "".to_string(),                            // blank
            format!("{}\t123.9", synth_addr(5)),       // float balance, truncated
        ];
        let set = TargetSet::from_lines(lines).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.report().skipped, 5);
        assert_eq!(set.balance(&synth_hash(5)), Some(123));
    }

    #[test]
    fn balance_is_optional() {
        let set = TargetSet::from_lines(vec![synth_addr(9)]).unwrap();
        assert_eq!(set.balance(&synth_hash(9)), Some(0));
    }

    #[test]
    fn empty_set_is_fatal() {
        let err = TargetSet::from_lines(vec!["garbage".to_string()]).unwrap_err();
        assert!(matches!(err, ScanError::EmptyTargetSet { skipped: 1 }));
    }

    #[test]
    fn memory_guard_truncates_and_reports() {
        // Two full chunks of synthetic addresses; the guard fires after the
        // first chunk, so the load stops with a partial, flagged result.
        let lines: Vec<String> = (0..(CHUNK_LINES as u32 * 2)).map(synth_addr).collect();
        let set =
            TargetSet::from_lines_guarded(lines, 0.5, || Some(0.01)).unwrap();
        assert!(set.report().truncated);
        assert_eq!(set.len(), CHUNK_LINES);
    }

    #[test]
    fn guard_without_signal_loads_everything() {
        let lines: Vec<String> = (0..100).map(synth_addr).collect();
        let set = TargetSet::from_lines_guarded(lines, 0.9, || None).unwrap();
        assert!(!set.report().truncated);
        assert_eq!(set.len(), 100);
    }
}
