//! Multi-limb arithmetic over five signed 52-bit limbs.
//!
//! A value `a` is `a[0] + a[1]·2^52 + … + a[4]·2^208`. After [`norm`] every
//! limb but the top one lies in `[0, 2^52)` and the top limb carries the sign
//! and any overflow. A canonical 256-bit value uses at most 48 bits of the top
//! limb, leaving headroom for sums and differences before normalizing.
//!
//! Double-width products use ten limbs. Montgomery reduction with radix
//! `R = 2^256` is shared by the base field and the scalar field through
//! [`Modulus`].
//!
//! Nothing here branches on limb values: conditional operations take an
//! all-ones or all-zeroes `i64` mask.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::needless_range_loop
)]

use elliptic_curve::subtle::Choice;

/// Single-width value.
pub(crate) type Limbs = [i64; 5];

/// Double-width value.
pub(crate) type WideLimbs = [i64; 10];

/// Bits per limb.
pub(crate) const LIMB_BITS: u32 = 52;

/// Mask of the low [`LIMB_BITS`] bits.
pub(crate) const LIMB_MASK: i64 = (1 << LIMB_BITS) - 1;

/// Bits used by the top limb of a 256-bit value.
const TOP_BITS: u32 = 256 - 4 * LIMB_BITS;

/// A modulus and its Montgomery constants.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Modulus {
    /// The modulus `m`.
    pub(crate) m: Limbs,
    /// `-m^-1 mod 2^52`.
    pub(crate) mp: i64,
    /// `R mod m`: one in Montgomery form.
    pub(crate) one: Limbs,
    /// `R^2 mod m`: converts into Montgomery form.
    pub(crate) r2: Limbs,
}

/// Base field modulus `p`.
pub(crate) const P: Modulus = Modulus {
    m: [
        0xfffffffffffff,
        0xff00000000fff,
        0xfffffffffffff,
        0xfffffffffffff,
        0x0fffffffeffff,
    ],
    mp: 1,
    one: [0x0000000000001, 0x00ffffffff000, 0x0, 0x0, 0x0000000010000],
    r2: [
        0x0000200000003,
        0x02ffffffff000,
        0x0000001000000,
        0x0002000000010,
        0x0000000040000,
    ],
};

/// Group order `n`.
pub(crate) const N: Modulus = Modulus {
    m: [
        0xbf40939d54123,
        0x6b21c6052b53b,
        0xfffffff7203df,
        0xfffffffffffff,
        0x0fffffffeffff,
    ],
    mp: 0xf9e8872350975,
    one: [
        0x40bf6c62abedd,
        0x94de39fad4ac4,
        0x00000008dfc20,
        0x0,
        0x0000000010000,
    ],
    r2: [
        0x192af7c114f20,
        0x4ade6fa2fa901,
        0xaffe0d4346450,
        0x3d3b620fc84c3,
        0x01eb5e412a22b,
    ],
};

/// Propagate carries so limbs 0..4 lie in `[0, 2^52)`.
#[inline(always)]
pub(crate) fn norm(a: &mut Limbs) {
    for i in 0..4 {
        a[i + 1] += a[i] >> LIMB_BITS;
        a[i] &= LIMB_MASK;
    }
}

/// `a + b`, normalized.
#[inline]
pub(crate) fn add(a: &Limbs, b: &Limbs) -> Limbs {
    let mut r = [0; 5];
    for i in 0..5 {
        r[i] = a[i] + b[i];
    }
    norm(&mut r);
    r
}

/// `a - b`, normalized. Negative results have a negative top limb.
#[inline]
pub(crate) fn sub(a: &Limbs, b: &Limbs) -> Limbs {
    let mut r = [0; 5];
    for i in 0..5 {
        r[i] = a[i] - b[i];
    }
    norm(&mut r);
    r
}

/// `a - (b & mask)`, normalized.
#[inline]
pub(crate) fn cond_sub(a: &Limbs, b: &Limbs, mask: i64) -> Limbs {
    let mut r = [0; 5];
    for i in 0..5 {
        r[i] = a[i] - (b[i] & mask);
    }
    norm(&mut r);
    r
}

/// `a + (b & mask)`, normalized.
#[inline]
pub(crate) fn cond_add(a: &Limbs, b: &Limbs, mask: i64) -> Limbs {
    let mut r = [0; 5];
    for i in 0..5 {
        r[i] = a[i] + (b[i] & mask);
    }
    norm(&mut r);
    r
}

/// Constant-time comparison of normalized values: `-1`, `0` or `1`.
pub(crate) fn cmp(a: &Limbs, b: &Limbs) -> i64 {
    let d = sub(a, b);
    let negative = d[4] >> 63;
    let nonzero = d.iter().fold(0, |acc, limb| acc | limb);
    negative | i64::from(nonzero != 0)
}

/// All-ones when `a` is zero, else zero.
#[inline]
pub(crate) fn zero_mask(a: &Limbs) -> i64 {
    let acc = a.iter().fold(0, |acc, limb| acc | limb);
    // `acc | -acc` has its sign bit set iff `acc != 0`
    ((acc | acc.wrapping_neg()) >> 63) ^ -1
}

/// Convert an all-ones or all-zeroes mask into a [`Choice`].
#[inline]
pub(crate) fn mask_choice(mask: i64) -> Choice {
    Choice::from((mask & 1) as u8)
}

/// Shift a normalized non-negative value right by one bit.
#[inline]
pub(crate) fn rshift1(a: &Limbs) -> Limbs {
    let mut r = [0; 5];
    for i in 0..4 {
        r[i] = (a[i] >> 1) | ((a[i + 1] & 1) << (LIMB_BITS - 1));
    }
    r[4] = a[4] >> 1;
    r
}

/// Full product `a·b` of canonical values.
pub(crate) fn mul(a: &Limbs, b: &Limbs) -> WideLimbs {
    let mut t = [0i128; 9];
    for i in 0..5 {
        for j in 0..5 {
            t[i + j] += i128::from(a[i]) * i128::from(b[j]);
        }
    }
    carry_columns(&t)
}

/// Full square `a²` of a canonical value.
pub(crate) fn sqr(a: &Limbs) -> WideLimbs {
    let mut t = [0i128; 9];
    for i in 0..5 {
        let ai = i128::from(a[i]);
        t[2 * i] += ai * ai;
        for j in (i + 1)..5 {
            t[i + j] += 2 * ai * i128::from(a[j]);
        }
    }
    carry_columns(&t)
}

/// Split column sums into ten normalized limbs.
#[inline(always)]
fn carry_columns(t: &[i128; 9]) -> WideLimbs {
    let mut r = [0; 10];
    let mut carry = 0i128;
    for k in 0..9 {
        let v = t[k] + carry;
        r[k] = (v as i64) & LIMB_MASK;
        carry = v >> LIMB_BITS;
    }
    r[9] = carry as i64;
    r
}

/// Product of a canonical value and a single limb `d < 2^52`.
#[inline]
pub(crate) fn mul_d(a: &Limbs, d: i64) -> [i64; 6] {
    let mut r = [0; 6];
    let mut carry = 0i128;
    for j in 0..5 {
        let v = i128::from(a[j]) * i128::from(d) + carry;
        r[j] = (v as i64) & LIMB_MASK;
        carry = v >> LIMB_BITS;
    }
    r[5] = carry as i64;
    r
}

/// Montgomery reduction: `a·R^-1 mod m` for `a < m·R`, canonical.
///
/// Four passes clear 52 bits each and a fifth clears the remaining 48, so
/// the value becomes divisible by `2^256`. The shifted value is below `2m`
/// and a final masked subtraction brings it into `[0, m)`.
pub(crate) fn mont_reduce(a: &WideLimbs, modulus: &Modulus) -> Limbs {
    let mut a = *a;

    for i in 0..4 {
        let mu = a[i].wrapping_mul(modulus.mp) & LIMB_MASK;
        let t = mul_d(&modulus.m, mu);
        for j in 0..6 {
            a[i + j] += t[j];
        }
        a[i + 1] += a[i] >> LIMB_BITS;
        a[i] = 0;
    }

    let mu = a[4].wrapping_mul(modulus.mp) & ((1 << TOP_BITS) - 1);
    let t = mul_d(&modulus.m, mu);
    for j in 0..6 {
        a[4 + j] += t[j];
    }

    mont_shift(&a, modulus)
}

/// Divide the reduced wide value by `2^256` and subtract `m` once if needed.
#[inline(always)]
fn mont_shift(a: &WideLimbs, modulus: &Modulus) -> Limbs {
    let mut r = [0; 5];
    for j in 0..5 {
        r[j] = a[j + 5] << (LIMB_BITS - TOP_BITS);
    }
    r[0] += a[4] >> TOP_BITS;
    norm(&mut r);
    modulus.reduce_once(&r)
}

/// Parse up to 32 big-endian bytes. Longer inputs keep the last 32 bytes.
pub(crate) fn from_be_slice(bytes: &[u8]) -> Limbs {
    let mut r = [0; 5];
    for (i, byte) in bytes.iter().rev().take(32).enumerate() {
        let bit = i as u32 * 8;
        let limb = (bit / LIMB_BITS) as usize;
        let shift = bit % LIMB_BITS;
        let byte = i64::from(*byte);
        r[limb] |= (byte << shift) & LIMB_MASK;
        if shift > LIMB_BITS - 8 {
            r[limb + 1] |= byte >> (LIMB_BITS - shift);
        }
    }
    r
}

/// Serialize a canonical value as 32 big-endian bytes.
pub(crate) fn to_be_bytes(a: &Limbs) -> [u8; 32] {
    let mut r = [0u8; 32];
    for i in 0..32 {
        let bit = i as u32 * 8;
        let limb = (bit / LIMB_BITS) as usize;
        let shift = bit % LIMB_BITS;
        let mut byte = a[limb] >> shift;
        if shift > LIMB_BITS - 8 {
            byte |= a[limb + 1] << (LIMB_BITS - shift);
        }
        r[31 - i] = byte as u8;
    }
    r
}

impl Modulus {
    /// `a·b·R^-1 mod m`.
    #[inline]
    pub(crate) fn mont_mul(&self, a: &Limbs, b: &Limbs) -> Limbs {
        mont_reduce(&mul(a, b), self)
    }

    /// `a²·R^-1 mod m`.
    #[inline]
    pub(crate) fn mont_sqr(&self, a: &Limbs) -> Limbs {
        mont_reduce(&sqr(a), self)
    }

    /// `a + b mod m`.
    #[inline]
    pub(crate) fn mont_add(&self, a: &Limbs, b: &Limbs) -> Limbs {
        self.reduce_once(&add(a, b))
    }

    /// `a - b mod m`.
    #[inline]
    pub(crate) fn mont_sub(&self, a: &Limbs, b: &Limbs) -> Limbs {
        let r = sub(a, b);
        cond_add(&r, &self.m, r[4] >> 63)
    }

    /// `2a mod m`.
    #[inline]
    pub(crate) fn mont_dbl(&self, a: &Limbs) -> Limbs {
        self.mont_add(a, a)
    }

    /// `3a mod m`.
    #[inline]
    pub(crate) fn mont_tpl(&self, a: &Limbs) -> Limbs {
        self.mont_add(&self.mont_dbl(a), a)
    }

    /// `a / 2 mod m`: add `m` when odd, then shift.
    #[inline]
    pub(crate) fn mont_div2(&self, a: &Limbs) -> Limbs {
        let odd = (a[0] & 1).wrapping_neg();
        rshift1(&cond_add(a, &self.m, odd))
    }

    /// Subtract `m` from `a < 2m` unless that underflows.
    #[inline]
    pub(crate) fn reduce_once(&self, a: &Limbs) -> Limbs {
        let mask = !(sub(a, &self.m)[4] >> 63);
        cond_sub(a, &self.m, mask)
    }

    /// Enter Montgomery form. Accepts any value below `2^256`.
    #[inline]
    pub(crate) fn to_montgomery(&self, a: &Limbs) -> Limbs {
        self.mont_mul(a, &self.r2)
    }

    /// Leave Montgomery form.
    #[inline]
    pub(crate) fn from_montgomery(&self, a: &Limbs) -> Limbs {
        let mut wide = [0; 10];
        wide[..5].copy_from_slice(a);
        mont_reduce(&wide, self)
    }

    /// All-ones when the normalized `a` is below `m`.
    #[inline]
    pub(crate) fn lt_mask(&self, a: &Limbs) -> i64 {
        cmp(a, &self.m) >> 63
    }
}
