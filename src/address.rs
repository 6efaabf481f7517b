//! Scalar-to-address derivation pipeline
//!
//! scalar -> d*G -> compressed pubkey -> SHA256 -> RIPEMD160
//!        -> version 0x00 || hash160 || checksum -> base58
//!
//! The checksum is the first 4 bytes of SHA256(SHA256(version || hash160)).
//! Digest choices, byte order and the parity prefix are all load-bearing:
//! change any of them and produced addresses stop matching the target
//! format. The golden vectors in the tests pin this down.

use primitive_types::U256;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::curve;
use crate::keygen::is_valid_scalar;

/// P2PKH version byte (mainnet)
const VERSION_P2PKH: u8 = 0x00;
/// WIF version byte (mainnet)
const VERSION_WIF: u8 = 0x80;

/// Hash160 = RIPEMD160(SHA256(data))
#[inline]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripemd = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd);
    out
}

/// First 4 bytes of a double SHA256.
#[inline]
fn checksum(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(payload));
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

fn base58check(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 4);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    bs58::encode(data).into_string()
}

/// Derive the pubkey hash160 for a scalar.
///
/// Rejects out-of-range scalars up front; any arithmetic failure inside
/// the curve yields `None` rather than a corrupt digest.
pub fn derive_hash160(scalar: &[u8; 32]) -> Option<[u8; 20]> {
    if !is_valid_scalar(scalar) {
        return None;
    }
    let point = curve::scalar_mul(U256::from_big_endian(scalar))?;
    Some(hash160(&curve::compress(&point)))
}

/// Encode a pubkey hash160 as a P2PKH address.
pub fn address_from_hash160(hash: &[u8; 20]) -> String {
    let mut payload = [0u8; 21];
    payload[0] = VERSION_P2PKH;
    payload[1..].copy_from_slice(hash);
    base58check(&payload)
}

/// Full pipeline: scalar to address string.
pub fn derive_address(scalar: &[u8; 32]) -> Option<String> {
    derive_hash160(scalar).map(|h| address_from_hash160(&h))
}

/// Decode a P2PKH address back to its hash160.
///
/// Returns `None` unless the string decodes to exactly
/// version + 20 bytes + a valid 4-byte checksum.
pub fn decode_address(address: &str) -> Option<[u8; 20]> {
    let raw = bs58::decode(address).into_vec().ok()?;
    if raw.len() != 25 || raw[0] != VERSION_P2PKH {
        return None;
    }
    if checksum(&raw[..21]) != raw[21..25] {
        return None;
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&raw[1..21]);
    Some(hash)
}

/// Private key to compressed-key WIF.
///
/// The 0x01 suffix marks the key as corresponding to the compressed
/// pubkey, which is what the derivation pipeline hashes.
pub fn to_wif(scalar: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(34);
    payload.push(VERSION_WIF);
    payload.extend_from_slice(scalar);
    payload.push(0x01);
    base58check(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(n: u64) -> [u8; 32] {
        let mut s = [0u8; 32];
        s[24..].copy_from_slice(&n.to_be_bytes());
        s
    }

    #[test]
    fn golden_vector_key_one() {
        // The most published keypair in existence: d = 1
        let s = scalar(1);
        assert_eq!(
            derive_address(&s).unwrap(),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
        assert_eq!(
            to_wif(&s),
            "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
        );
        assert_eq!(
            hex::encode(derive_hash160(&s).unwrap()),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn golden_vector_max_scalar() {
        // d = n - 1, the largest valid key
        let mut s = [0u8; 32];
        (*curve::CURVE_N - primitive_types::U256::one()).to_big_endian(&mut s);
        assert_eq!(
            derive_address(&s).unwrap(),
            "1GrLCmVQXoyJXaPJQdqssNqwxvha1eUo2E"
        );
        assert_eq!(
            to_wif(&s),
            "L5oLkpV3aqBjhki6LmvChTCV6odsp4SXM6FfU2Gppt5kFLaHLuZ9"
        );
    }

    #[test]
    fn golden_vector_mid_scalar() {
        assert_eq!(
            derive_address(&scalar(0xC0FFEE)).unwrap(),
            "1PkjVT2eq7sLQaad4sa3bsawdHdop5EPWj"
        );
    }

    #[test]
    fn round_trip_law() {
        // derive -> encode -> decode must recover the hash160
        for n in [1u64, 2, 3, 0xC0FFEE, u64::MAX] {
            let s = scalar(n);
            let hash = derive_hash160(&s).unwrap();
            let addr = address_from_hash160(&hash);
            assert_eq!(decode_address(&addr), Some(hash), "scalar {}", n);
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let s = scalar(42);
        assert_eq!(derive_address(&s), derive_address(&s));
    }

    #[test]
    fn out_of_range_scalars_rejected_before_pipeline() {
        assert_eq!(derive_address(&[0u8; 32]), None);
        assert_eq!(derive_address(&[0xFF; 32]), None);
    }

    #[test]
    fn decode_rejects_corruption() {
        let addr = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH";
        assert!(decode_address(addr).is_some());

        // flip one character -> checksum failure
        let mut corrupt = addr.to_string();
        corrupt.replace_range(4..5, "a");
        assert_eq!(decode_address(&corrupt), None);

        // wrong version (P2SH) and garbage
        assert_eq!(decode_address("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"), None);
        assert_eq!(decode_address("not-an-address"), None);
        assert_eq!(decode_address(""), None);
    }
}
