//! Constant-time scalar multiplication.
//!
//! Two strategies compute `k·P` for any 256-bit `k`:
//!
//! - windowed: `k` is recoded into 43 signed 6-bit digits and consumed against
//!   a 33-entry table of small multiples of `P` built per call
//! - stripe: `P` is expanded once into 256 affine combinations of
//!   `2^(32i)·P`, after which `k` is consumed 8 bits per iteration in
//!   32 iterations
//!
//! Every table read touches every entry and masks in the wanted one.

#![allow(clippy::cast_possible_truncation)]

use super::{AffinePoint, ProjectivePoint};
use crate::U256;
use elliptic_curve::{
    bigint::Encoding,
    subtle::{Choice, ConditionallySelectable, ConstantTimeEq},
    zeroize::{DefaultIsZeroes, Zeroizing},
};

#[cfg(feature = "precomputed-tables")]
use std::sync::LazyLock;

/// Number of signed 6-bit digits covering a 256-bit scalar plus carry.
const DIGITS: usize = 43;

/// Entries in the windowed table: `0·P … 32·P`.
const WINDOW_ENTRIES: usize = 33;

/// Table index for a 6-bit window plus incoming carry.
const RECODE_INDEX: [u8; 66] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
    26, 27, 28, 29, 30, 31, 32, 31, 30, 29, 28, 27, 26, 25, 24, 23, 22, 21, 20, 19, 18, 17, 16,
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 1,
];

/// Whether the digit for a 6-bit window plus incoming carry is negative.
const RECODE_NEG: [u8; 66] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    0, 0,
];

/// Signed digit of a recoded scalar: `±index`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Digit {
    pub(crate) index: u8,
    pub(crate) negate: u8,
}

impl DefaultIsZeroes for Digit {}

/// Read `len <= 8` bits of little-endian `bytes` starting at `bit`.
/// Bits past the end read as zero.
#[inline]
fn bits(bytes: &[u8; 32], bit: usize, len: usize) -> usize {
    let byte = bit / 8;
    let lo = usize::from(bytes.get(byte).copied().unwrap_or(0));
    let hi = usize::from(bytes.get(byte + 1).copied().unwrap_or(0));
    ((lo | (hi << 8)) >> (bit % 8)) & ((1 << len) - 1)
}

/// Recode `k` into signed base-64 digits, least significant first.
///
/// Each digit `d_i` lies in `[-32, 32]` and `k = Σ d_i·64^i`.
pub(crate) fn recode(k: &U256) -> Zeroizing<[Digit; DIGITS]> {
    let bytes = Zeroizing::new(k.to_le_bytes());
    let mut digits = Zeroizing::new([Digit::default(); DIGITS]);
    let mut carry = 0;
    for (i, digit) in digits.iter_mut().enumerate() {
        let y = bits(&bytes, 6 * i, 6) + carry;
        *digit = Digit {
            index: RECODE_INDEX[y],
            negate: RECODE_NEG[y],
        };
        carry = (y >> 6) + usize::from(RECODE_NEG[y]);
    }
    digits
}

/// Small multiples `0·P … 32·P` for the windowed strategy.
struct WindowTable([ProjectivePoint; WINDOW_ENTRIES]);

impl WindowTable {
    fn new(p: &ProjectivePoint) -> Self {
        let mut t = [ProjectivePoint::IDENTITY; WINDOW_ENTRIES];
        t[1] = *p;

        let mut powers = [ProjectivePoint::IDENTITY; 5];
        p.double_n_store(&mut powers);
        for (i, power) in powers.into_iter().enumerate() {
            t[2 << i] = power;
        }

        t[3] = t[2] + t[1];
        t[6] = t[3].double();
        (t[7], t[5]) = t[6].add_sub(&t[1]);
        t[10] = t[5].double();
        (t[11], t[9]) = t[10].add_sub(&t[1]);
        t[12] = t[6].double();
        t[14] = t[7].double();
        (t[15], t[13]) = t[14].add_sub(&t[1]);
        t[18] = t[9].double();
        (t[19], t[17]) = t[18].add_sub(&t[1]);
        t[20] = t[10].double();
        t[22] = t[11].double();
        (t[23], t[21]) = t[22].add_sub(&t[1]);
        t[24] = t[12].double();
        t[26] = t[13].double();
        (t[27], t[25]) = t[26].add_sub(&t[1]);
        t[28] = t[14].double();
        t[30] = t[15].double();
        (t[31], t[29]) = t[30].add_sub(&t[1]);

        Self(t)
    }

    /// Entry `digit.index`, negated when `digit.negate` is set.
    fn select(&self, digit: &Digit) -> ProjectivePoint {
        let mut r = ProjectivePoint::IDENTITY;
        for (i, entry) in self.0.iter().enumerate() {
            r.conditional_assign(entry, (i as u8).ct_eq(&digit.index));
        }
        let neg_y = -r.y;
        r.y.conditional_assign(&neg_y, Choice::from(digit.negate));
        r
    }
}

/// Compute `k·P` with the windowed add/sub strategy.
pub fn mul_windowed(p: &ProjectivePoint, k: &U256) -> ProjectivePoint {
    let digits = recode(k);
    let table = WindowTable::new(p);

    // the top digit covers bits 252..255 plus carry, so it is never negative
    let mut r = table.select(&digits[DIGITS - 1]);
    for digit in digits[..DIGITS - 1].iter().rev() {
        r = r.double_n(6);
        r = r.add(&table.select(digit));
    }
    r
}

/// Stripe table of a point: entry `j` holds `Σ 2^(32i)·P` over the bits `i`
/// set in `j`.
#[derive(Clone, Debug)]
pub struct StripeTable([AffinePoint; 256]);

impl StripeTable {
    /// Expand `p` into its stripe table.
    pub fn new(p: &ProjectivePoint) -> Self {
        let mut t = [AffinePoint::IDENTITY; 256];
        t[1] = p.to_affine();

        for i in 1..8 {
            let half = 1 << i;
            t[half] = ProjectivePoint::from(&t[half >> 1]).double_n(32).to_affine();
            for j in 1..half {
                t[half + j] = ProjectivePoint::from(&t[j]).add_mixed(&t[half]).to_affine();
            }
        }

        Self(t)
    }

    /// The point this table was built from.
    pub fn base(&self) -> AffinePoint {
        self.0[1]
    }

    /// Entry `index`, reading every entry.
    fn select(&self, index: u8) -> AffinePoint {
        let mut r = AffinePoint::IDENTITY;
        for (i, entry) in self.0.iter().enumerate() {
            r.conditional_assign(entry, (i as u8).ct_eq(&index));
        }
        r
    }

    /// Compute `k·P` for the table's point.
    pub fn mul(&self, k: &U256) -> ProjectivePoint {
        let bytes = Zeroizing::new(k.to_le_bytes());
        let stripe = |i: usize| -> u8 {
            let mut y = 0u8;
            for j in 0..8 {
                y |= (bits(&bytes, i + 32 * j, 1) as u8) << j;
            }
            y
        };

        let mut r = ProjectivePoint::from(&self.select(stripe(31)));
        for i in (0..31).rev() {
            r = r.double();
            r = r.add_mixed(&self.select(stripe(i)));
        }
        r
    }
}

/// Multiplication strategy for points other than the generator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum MulStrategy {
    /// Windowed add/sub over a per-call table of 33 multiples.
    Windowed,
    /// Stripe table, cached per point. Falls back to windowed until the
    /// table has been built.
    #[default]
    Stripe,
}

#[cfg(feature = "precomputed-tables")]
static GENERATOR_TABLE: LazyLock<StripeTable> =
    LazyLock::new(|| StripeTable::new(&ProjectivePoint::GENERATOR));

/// Compute `k·G` for the SM2 generator `G`.
pub fn mul_base(k: &U256) -> ProjectivePoint {
    #[cfg(feature = "precomputed-tables")]
    {
        GENERATOR_TABLE.mul(k)
    }
    #[cfg(not(feature = "precomputed-tables"))]
    {
        StripeTable::new(&ProjectivePoint::GENERATOR).mul(k)
    }
}

/// Reference double-and-add over the bits of `k`. Not constant-time.
#[cfg(test)]
pub(crate) fn mul_vartime(p: &ProjectivePoint, k: &U256) -> ProjectivePoint {
    let bytes = k.to_be_bytes();
    let mut r = ProjectivePoint::IDENTITY;
    for byte in bytes {
        for i in (0..8).rev() {
            r = r.double();
            if (byte >> i) & 1 == 1 {
                r = r + p;
            }
        }
    }
    r
}
