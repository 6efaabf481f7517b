//! secp256k1 arithmetic for address derivation
//!
//! Affine short-Weierstrass math over the secp256k1 prime field, with
//! scalar multiplication by plain MSB-first double-and-add. Field elements
//! are 256-bit integers; products are widened to 512 bits before reduction
//! so no intermediate can overflow. Modular inverse uses Fermat
//! exponentiation (`a^(p-2) mod p`).
//!
//! Validated against the published generator multiples (2G, 3G, 5G) and an
//! independent implementation in the test suite; do not change the slope
//! formulas without re-running those.

use once_cell::sync::Lazy;
use primitive_types::{U256, U512};

/// Field prime p = 2^256 - 2^32 - 977
const FIELD_P_BYTES: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFC, 0x2F,
];

/// Curve order n
const CURVE_N_BYTES: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B,
    0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Generator x-coordinate
const GEN_X_BYTES: [u8; 32] = [
    0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC,
    0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87, 0x0B, 0x07,
    0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9,
    0x59, 0xF2, 0x81, 0x5B, 0x16, 0xF8, 0x17, 0x98,
];

/// Generator y-coordinate
const GEN_Y_BYTES: [u8; 32] = [
    0x48, 0x3A, 0xDA, 0x77, 0x26, 0xA3, 0xC4, 0x65,
    0x5D, 0xA4, 0xFB, 0xFC, 0x0E, 0x11, 0x08, 0xA8,
    0xFD, 0x17, 0xB4, 0x48, 0xA6, 0x85, 0x54, 0x19,
    0x9C, 0x47, 0xD0, 0x8F, 0xFB, 0x10, 0xD4, 0xB8,
];

pub static FIELD_P: Lazy<U256> = Lazy::new(|| U256::from_big_endian(&FIELD_P_BYTES));
pub static CURVE_N: Lazy<U256> = Lazy::new(|| U256::from_big_endian(&CURVE_N_BYTES));
static P_MINUS_2: Lazy<U256> = Lazy::new(|| *FIELD_P - U256::from(2u8));
static GENERATOR: Lazy<Point> = Lazy::new(|| Point {
    x: U256::from_big_endian(&GEN_X_BYTES),
    y: U256::from_big_endian(&GEN_Y_BYTES),
});

/// Affine curve point. The identity is represented as `None` at call sites.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Point {
    pub x: U256,
    pub y: U256,
}

pub fn generator() -> Point {
    *GENERATOR
}

/// Truncate a 512-bit value known to be `< 2^256` down to 256 bits.
#[inline]
fn low_256(v: U512) -> U256 {
    debug_assert!((v.0[4] | v.0[5] | v.0[6] | v.0[7]) == 0);
    U256([v.0[0], v.0[1], v.0[2], v.0[3]])
}

#[inline]
fn add_mod(a: U256, b: U256) -> U256 {
    let p = U512::from(*FIELD_P);
    low_256((U512::from(a) + U512::from(b)) % p)
}

#[inline]
fn sub_mod(a: U256, b: U256) -> U256 {
    // a + p - b never underflows for reduced inputs
    let p = U512::from(*FIELD_P);
    low_256((U512::from(a) + p - U512::from(b)) % p)
}

#[inline]
fn mul_mod(a: U256, b: U256) -> U256 {
    low_256(a.full_mul(b) % U512::from(*FIELD_P))
}

/// Modular exponentiation by square-and-multiply, MSB first.
fn pow_mod(base: U256, exp: U256) -> U256 {
    let mut acc = U256::one();
    for i in (0..256).rev() {
        acc = mul_mod(acc, acc);
        if exp.bit(i) {
            acc = mul_mod(acc, base);
        }
    }
    acc
}

/// Fermat inverse: a^(p-2) mod p. Zero has no inverse.
fn inv_mod(a: U256) -> Option<U256> {
    if a.is_zero() {
        return None;
    }
    Some(pow_mod(a, *P_MINUS_2))
}

/// Point doubling: lambda = 3x^2 / 2y.
fn double(p: &Point) -> Option<Point> {
    let two_y = add_mod(p.y, p.y);
    let lambda = mul_mod(
        mul_mod(U256::from(3u8), mul_mod(p.x, p.x)),
        inv_mod(two_y)?,
    );
    let x3 = sub_mod(sub_mod(mul_mod(lambda, lambda), p.x), p.x);
    let y3 = sub_mod(mul_mod(lambda, sub_mod(p.x, x3)), p.y);
    Some(Point { x: x3, y: y3 })
}

/// Point addition for distinct points: lambda = (y2-y1) / (x2-x1).
/// Equal x-coordinates fall back to doubling or the identity.
fn add(p: &Point, q: &Point) -> Option<Point> {
    if p.x == q.x {
        if p.y == q.y {
            return double(p);
        }
        // p + (-p) = identity
        return None;
    }
    let lambda = mul_mod(sub_mod(q.y, p.y), inv_mod(sub_mod(q.x, p.x))?);
    let x3 = sub_mod(sub_mod(mul_mod(lambda, lambda), p.x), q.x);
    let y3 = sub_mod(mul_mod(lambda, sub_mod(p.x, x3)), p.y);
    Some(Point { x: x3, y: y3 })
}

/// Scalar multiplication `d * G` by double-and-add.
///
/// Returns `None` for `d = 0` or if any intermediate lands on the identity;
/// for scalars in `[1, n-1]` the result is always `Some`.
pub fn scalar_mul(d: U256) -> Option<Point> {
    let g = generator();
    let mut acc: Option<Point> = None;
    for i in (0..256).rev() {
        if let Some(q) = acc {
            acc = double(&q);
        }
        if d.bit(i) {
            acc = match acc {
                None => Some(g),
                Some(q) => add(&q, &g),
            };
        }
    }
    acc
}

/// SEC1 compressed encoding: parity prefix (02 even y, 03 odd y) + big-endian x.
pub fn compress(p: &Point) -> [u8; 33] {
    let mut out = [0u8; 33];
    out[0] = if p.y.bit(0) { 0x03 } else { 0x02 };
    p.x.to_big_endian(&mut out[1..33]);
    out
}
