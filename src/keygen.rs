//! Candidate scalar generation
//!
//! Draws 32-byte scalars from a cryptographically secure source and
//! rejection-samples until the value lands in `[1, n-1]`. Out-of-range
//! draws are resampled, never clamped; clamping would bias the keyspace.
//!
//! The entropy source sits behind [`KeySource`] so tests can inject a
//! deterministic sequence while production uses the OS RNG.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, ScanError};

/// secp256k1 curve order n; valid scalars are strictly below this.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B,
    0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Check `1 <= scalar < n` by big-endian byte comparison.
#[inline]
pub fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    if scalar.iter().all(|&b| b == 0) {
        return false;
    }
    for i in 0..32 {
        if scalar[i] < SECP256K1_ORDER[i] {
            return true;
        }
        if scalar[i] > SECP256K1_ORDER[i] {
            return false;
        }
    }
    false
}

/// Source of raw candidate material.
///
/// Implementations must be thread-safe; each call draws independently.
pub trait KeySource: Send + Sync {
    /// Fill `out` with 32 bytes of candidate material.
    ///
    /// A failing source is fatal to the run; implementations must never
    /// substitute non-cryptographic bytes.
    fn fill(&self, out: &mut [u8; 32]) -> Result<()>;
}

/// Production source backed by the operating system CSPRNG.
pub struct OsKeySource;

impl KeySource for OsKeySource {
    fn fill(&self, out: &mut [u8; 32]) -> Result<()> {
        OsRng
            .try_fill_bytes(out)
            .map_err(|e| ScanError::Randomness(e.to_string()))
    }
}

/// Rejection-sampling generator over a [`KeySource`].
pub struct CandidateGenerator<S: KeySource> {
    source: S,
}

impl<S: KeySource> CandidateGenerator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Next uniformly random scalar in `[1, n-1]`.
    pub fn next_scalar(&self) -> Result<[u8; 32]> {
        loop {
            let mut scalar = [0u8; 32];
            self.source.fill(&mut scalar)?;
            if is_valid_scalar(&scalar) {
                return Ok(scalar);
            }
            // out of range (probability ~2^-128): resample
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn rejects_zero_and_order() {
        assert!(!is_valid_scalar(&[0u8; 32]));
        assert!(!is_valid_scalar(&SECP256K1_ORDER));
        assert!(!is_valid_scalar(&[0xFF; 32]));
    }

    #[test]
    fn accepts_one_and_order_minus_one() {
        let mut one = [0u8; 32];
        one[31] = 1;
        assert!(is_valid_scalar(&one));

        let mut n_minus_1 = SECP256K1_ORDER;
        n_minus_1[31] -= 1;
        assert!(is_valid_scalar(&n_minus_1));
    }

    #[test]
    fn os_source_yields_valid_scalars() {
        let gen = CandidateGenerator::new(OsKeySource);
        for _ in 0..100 {
            let scalar = gen.next_scalar().unwrap();
            assert!(is_valid_scalar(&scalar));
        }
    }

    /// Source scripted to emit out-of-range values before a valid one.
    struct Scripted(Mutex<Vec<[u8; 32]>>);

    impl KeySource for Scripted {
        fn fill(&self, out: &mut [u8; 32]) -> Result<()> {
            let mut keys = self.0.lock().unwrap();
            *out = keys.pop().expect("script exhausted");
            Ok(())
        }
    }

    #[test]
    fn resamples_instead_of_clamping() {
        let mut valid = [0u8; 32];
        valid[31] = 7;
        // popped in reverse: zero, then >= n, then valid
        let script = Scripted(Mutex::new(vec![valid, [0xFF; 32], [0u8; 32]]));
        let gen = CandidateGenerator::new(script);
        assert_eq!(gen.next_scalar().unwrap(), valid);
    }

    /// Source that always fails, as an exhausted CSPRNG would.
    struct Broken;

    impl KeySource for Broken {
        fn fill(&self, _out: &mut [u8; 32]) -> Result<()> {
            Err(ScanError::Randomness("entropy pool unavailable".into()))
        }
    }

    #[test]
    fn source_failure_is_fatal() {
        let gen = CandidateGenerator::new(Broken);
        assert!(matches!(
            gen.next_scalar(),
            Err(ScanError::Randomness(_))
        ));
    }
}
