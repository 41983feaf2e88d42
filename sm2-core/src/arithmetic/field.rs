//! Field arithmetic modulo p = 0xfffffffeffffffffffffffffffffffffffffffff00000000ffffffffffffffff
//!
//! Elements are stored in Montgomery form `a·2^256 mod p` over five 52-bit
//! limbs and are always canonical, so equality is limb equality.

use super::limbs::{self, Limbs, P};
use crate::{FieldBytes, U256};
use core::fmt::{self, Debug};
use elliptic_curve::{
    bigint::Encoding,
    subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption},
    zeroize::DefaultIsZeroes,
};

/// `p - 2` as little-endian 64-bit words.
const P_MINUS_TWO: [u64; 4] = [
    0xffff_ffff_ffff_fffd,
    0xffff_ffff_0000_0000,
    0xffff_ffff_ffff_ffff,
    0xffff_fffe_ffff_ffff,
];

/// `(p + 1) / 4` as little-endian 64-bit words.
const SQRT_POWER: [u64; 4] = [
    0x4000_0000_0000_0000,
    0xffff_ffff_c000_0000,
    0xffff_ffff_ffff_ffff,
    0x3fff_ffff_bfff_ffff,
];

/// Element of the SM2 base field, in Montgomery form.
#[derive(Clone, Copy, Default)]
pub struct FieldElement(pub(crate) Limbs);

impl FieldElement {
    /// Zero element.
    pub const ZERO: Self = Self([0; 5]);

    /// Multiplicative identity.
    pub const ONE: Self = Self(P.one);

    /// Convert a small integer into a field element.
    pub fn from_u64(w: u64) -> Self {
        Self::from_canonical(&limbs::from_be_slice(&w.to_be_bytes()))
    }

    /// Enter Montgomery form from any 256-bit canonical limb value.
    #[inline]
    pub(crate) fn from_canonical(a: &Limbs) -> Self {
        Self(P.to_montgomery(a))
    }

    /// Leave Montgomery form.
    #[inline]
    pub(crate) fn to_canonical(self) -> Limbs {
        P.from_montgomery(&self.0)
    }

    /// Parse a big-endian encoded field element.
    ///
    /// Returns `None` unless the bytes encode an integer in `[0, p)`.
    pub fn from_bytes(bytes: &FieldBytes) -> CtOption<Self> {
        let a = limbs::from_be_slice(bytes);
        let in_range = limbs::mask_choice(P.lt_mask(&a));
        CtOption::new(Self::from_canonical(&a), in_range)
    }

    /// Parse a big integer as a field element.
    ///
    /// Returns `None` unless the integer is in `[0, p)`.
    pub fn from_uint(uint: &U256) -> CtOption<Self> {
        Self::from_bytes(&uint.to_be_bytes().into())
    }

    /// Reduce any 256-bit integer modulo `p`.
    pub fn from_uint_reduced(uint: &U256) -> Self {
        Self::from_canonical(&limbs::from_be_slice(&uint.to_be_bytes()))
    }

    /// Serialize as big-endian bytes.
    pub fn to_bytes(self) -> FieldBytes {
        limbs::to_be_bytes(&self.to_canonical()).into()
    }

    /// Convert into a canonical big integer.
    pub fn to_uint(self) -> U256 {
        U256::from_be_bytes(limbs::to_be_bytes(&self.to_canonical()))
    }

    /// Determine if this element is zero.
    pub fn is_zero(&self) -> Choice {
        limbs::mask_choice(limbs::zero_mask(&self.0))
    }

    /// Determine if the canonical value of this element is odd.
    pub fn is_odd(&self) -> Choice {
        limbs::mask_choice((self.to_canonical()[0] & 1).wrapping_neg())
    }

    /// Returns `self + rhs mod p`.
    #[inline]
    pub fn add(&self, rhs: &Self) -> Self {
        Self(P.mont_add(&self.0, &rhs.0))
    }

    /// Returns `self - rhs mod p`.
    #[inline]
    pub fn sub(&self, rhs: &Self) -> Self {
        Self(P.mont_sub(&self.0, &rhs.0))
    }

    /// Returns `self * rhs mod p`.
    #[inline]
    pub fn mul(&self, rhs: &Self) -> Self {
        Self(P.mont_mul(&self.0, &rhs.0))
    }

    /// Returns `-self mod p`.
    #[inline]
    pub fn neg(&self) -> Self {
        Self::ZERO.sub(self)
    }

    /// Returns `self^2 mod p`.
    #[inline]
    pub fn square(&self) -> Self {
        Self(P.mont_sqr(&self.0))
    }

    /// Returns `2 * self mod p`.
    #[inline]
    pub fn double(&self) -> Self {
        Self(P.mont_dbl(&self.0))
    }

    /// Returns `3 * self mod p`.
    #[inline]
    pub fn triple(&self) -> Self {
        Self(P.mont_tpl(&self.0))
    }

    /// Returns `self / 2 mod p`.
    #[inline]
    pub fn half(&self) -> Self {
        Self(P.mont_div2(&self.0))
    }

    /// Returns `self^(2^k)`.
    pub fn sqn(&self, k: usize) -> Self {
        let mut x = *self;
        for _ in 0..k {
            x = x.square();
        }
        x
    }

    /// Raise to a public exponent given as little-endian 64-bit words.
    ///
    /// Not constant-time in the exponent.
    pub fn pow_vartime(&self, exp: &[u64; 4]) -> Self {
        let mut res = Self::ONE;
        for i in (0..256).rev() {
            res = res.square();
            if (exp[i / 64] >> (i % 64)) & 1 == 1 {
                res = res.mul(self);
            }
        }
        res
    }

    /// Returns the multiplicative inverse of self, if self is non-zero.
    pub fn invert(&self) -> CtOption<Self> {
        CtOption::new(self.invert_unchecked(), !self.is_zero())
    }

    /// Returns `self^(p-2)` using a fixed addition chain. Zero maps to zero.
    pub(crate) fn invert_unchecked(&self) -> Self {
        // p - 2 = fffffffe ffffffff ffffffff ffffffff ffffffff 00000000 ffffffff fffffffd
        let a = *self;
        let x3 = a.square().mul(&a);
        let t = x3.sqn(2);
        let xd = t.mul(&a);
        let xf = x3.mul(&t);

        let t = xf.sqn(4);
        let xfd = xd.mul(&t);
        let xff = xf.mul(&t);

        let t = xff.sqn(8);
        let xfffd = xfd.mul(&t);
        let xffff = xff.mul(&t);

        let t = xffff.sqn(16);
        let x32d = xfffd.mul(&t);
        let x32e = x32d.mul(&a);
        let x32 = x32e.mul(&a);

        // fffffffe ffffffff
        let t = x32e.sqn(32).mul(&x32);
        // fffffffe ffffffff ffffffff
        let r = t.sqn(32).mul(&x32);
        // fffffffe ffffffff ffffffff ffffffff
        let r = r.sqn(32).mul(&x32);
        // ... ffffffff ffffffff
        let r = r.sqn(32).mul(&x32);
        // ... ffffffff 00000000 ffffffff
        let r = r.sqn(64).mul(&x32);
        // ... fffffffd
        r.sqn(32).mul(&x32d)
    }

    /// Inverse by plain square-and-multiply over the bits of `p - 2`.
    pub fn invert_naive(&self) -> CtOption<Self> {
        CtOption::new(self.pow_vartime(&P_MINUS_TWO), !self.is_zero())
    }

    /// Returns the square root of self mod p, or `None` if no square root exists.
    pub fn sqrt(&self) -> CtOption<Self> {
        // p ≡ 3 (mod 4) so a^((p+1)/4) is a root whenever one exists
        let root = self.pow_vartime(&SQRT_POWER);
        CtOption::new(root, root.square().ct_eq(self))
    }
}

impl_mont_ops!(FieldElement);

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut r = [0; 5];
        for (i, limb) in r.iter_mut().enumerate() {
            *limb = i64::conditional_select(&a.0[i], &b.0[i], choice);
        }
        Self(r)
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(Choice::from(1), |acc, (a, b)| acc & a.ct_eq(b))
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FieldElement {}

impl DefaultIsZeroes for FieldElement {}

impl Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement(0x")?;
        for byte in self.to_bytes() {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}
