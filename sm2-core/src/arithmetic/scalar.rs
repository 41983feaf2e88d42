//! SM2 scalar field elements.

use super::limbs::{self, Limbs, N};
use crate::{Error, FieldBytes, Result, U256};
use core::fmt::{self, Debug};
use elliptic_curve::{
    bigint::Encoding,
    subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption},
    zeroize::{DefaultIsZeroes, Zeroizing},
};
use rand_core::CryptoRngCore;

/// Low 128 bits of `n - 2`. The high half is all ones apart from bit 224.
const ORDER_MINUS_TWO_LOW: u128 = 0x7203df6b21c6052b53bbf40939d54121;

/// Scalars are elements in the finite field modulo `n`.
///
/// Stored in Montgomery form over five 52-bit limbs and always canonical.
#[derive(Clone, Copy, Default)]
pub struct Scalar(pub(crate) Limbs);

impl Scalar {
    /// Zero scalar.
    pub const ZERO: Self = Self([0; 5]);

    /// Multiplicative identity.
    pub const ONE: Self = Self(N.one);

    /// Convert a small integer into a scalar.
    pub fn from_u64(w: u64) -> Self {
        Self::from_canonical(&limbs::from_be_slice(&w.to_be_bytes()))
    }

    #[inline]
    fn from_canonical(a: &Limbs) -> Self {
        Self(N.to_montgomery(a))
    }

    #[inline]
    fn to_canonical(self) -> Limbs {
        N.from_montgomery(&self.0)
    }

    /// Parse a big-endian encoded scalar.
    ///
    /// Returns `None` unless the bytes encode an integer in `[0, n)`.
    pub fn from_bytes(bytes: &FieldBytes) -> CtOption<Self> {
        let a = limbs::from_be_slice(bytes);
        CtOption::new(Self::from_canonical(&a), limbs::mask_choice(N.lt_mask(&a)))
    }

    /// Parse a big integer as a scalar.
    ///
    /// Returns `None` unless the integer is in `[0, n)`.
    pub fn from_uint(uint: &U256) -> CtOption<Self> {
        Self::from_bytes(&uint.to_be_bytes().into())
    }

    /// Reduce any 256-bit integer modulo `n`.
    pub fn reduce(uint: &U256) -> Self {
        Self::from_canonical(&limbs::from_be_slice(&uint.to_be_bytes()))
    }

    /// Reduce a big-endian encoded 256-bit integer modulo `n`.
    pub fn reduce_bytes(bytes: &FieldBytes) -> Self {
        Self::from_canonical(&limbs::from_be_slice(bytes))
    }

    /// Serialize as big-endian bytes.
    pub fn to_bytes(self) -> FieldBytes {
        limbs::to_be_bytes(&self.to_canonical()).into()
    }

    /// Convert into a canonical big integer.
    pub fn to_uint(self) -> U256 {
        U256::from_be_bytes(limbs::to_be_bytes(&self.to_canonical()))
    }

    /// Determine if this scalar is zero.
    pub fn is_zero(&self) -> Choice {
        limbs::mask_choice(limbs::zero_mask(&self.0))
    }

    /// Returns `self + rhs mod n`.
    #[inline]
    pub fn add(&self, rhs: &Self) -> Self {
        Self(N.mont_add(&self.0, &rhs.0))
    }

    /// Returns `self - rhs mod n`.
    #[inline]
    pub fn sub(&self, rhs: &Self) -> Self {
        Self(N.mont_sub(&self.0, &rhs.0))
    }

    /// Returns `self * rhs mod n`.
    #[inline]
    pub fn mul(&self, rhs: &Self) -> Self {
        Self(N.mont_mul(&self.0, &rhs.0))
    }

    /// Returns `-self mod n`.
    #[inline]
    pub fn neg(&self) -> Self {
        Self::ZERO.sub(self)
    }

    /// Returns `self^2 mod n`.
    #[inline]
    pub fn square(&self) -> Self {
        Self(N.mont_sqr(&self.0))
    }

    fn sqn(&self, k: usize) -> Self {
        let mut x = *self;
        for _ in 0..k {
            x = x.square();
        }
        x
    }

    /// Compute [`Scalar`] inversion: `1 / self`.
    pub fn invert(&self) -> CtOption<Self> {
        CtOption::new(self.invert_unchecked(), !self.is_zero())
    }

    /// Returns `self^(n-2)`. Zero maps to zero.
    pub(crate) fn invert_unchecked(&self) -> Self {
        let a = *self;

        // upper half: fffffffe ffffffff ffffffff ffffffff
        let t4 = a.square();
        let t = t4.mul(&a);
        let t2 = t.sqn(2);
        let t4 = t2.mul(&t4);
        let x4 = t2.mul(&t);

        let t2 = x4.sqn(4);
        let t4 = t2.mul(&t4);
        let t = t2.mul(&x4);

        let t2 = t.sqn(8);
        let t4 = t2.mul(&t4);
        let t = t2.mul(&t);

        let t2 = t.sqn(16);
        let t4 = t2.mul(&t4);
        let t = t2.mul(&t);

        let t4 = t4.sqn(32).mul(&t);
        let t = t.sqn(32).mul(&t);
        let mut r = t4.sqn(64).mul(&t);

        // lower half, with the runs of four ones at bits 107..104 and 47..44
        // taken from the cached `x4`
        let bit = |i: u32| (ORDER_MINUS_TWO_LOW >> i) & 1 == 1;
        for i in (108..128).rev() {
            r = r.square();
            if bit(i) {
                r = r.mul(&a);
            }
        }
        r = r.sqn(4).mul(&x4);
        for i in (48..104).rev() {
            r = r.square();
            if bit(i) {
                r = r.mul(&a);
            }
        }
        r = r.sqn(4).mul(&x4);
        for i in (4..44).rev() {
            r = r.square();
            if bit(i) {
                r = r.mul(&a);
            }
        }
        r.sqn(4).mul(&a)
    }

    /// Draw a uniformly random scalar in `[1, n - 1]`.
    ///
    /// Samples 32 bytes until they encode a value at most `n - 2`, then adds one.
    pub fn generate<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        let one = limbs::from_be_slice(&[1]);
        loop {
            rng.try_fill_bytes(&mut bytes[..])?;
            let candidate = Zeroizing::new(limbs::add(&limbs::from_be_slice(&bytes[..]), &one));
            if N.lt_mask(&candidate) != 0 {
                return Ok(Self::from_canonical(&candidate));
            }
        }
    }
}

impl_mont_ops!(Scalar);

impl ConditionallySelectable for Scalar {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut r = [0; 5];
        for (i, limb) in r.iter_mut().enumerate() {
            *limb = i64::conditional_select(&a.0[i], &b.0[i], choice);
        }
        Self(r)
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(Choice::from(1), |acc, (a, b)| acc & a.ct_eq(b))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Scalar {}

impl DefaultIsZeroes for Scalar {}

impl Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar(0x")?;
        for byte in self.to_bytes() {
            write!(f, "{:02X}", byte)?;
        }
        write!(f, ")")
    }
}

impl From<Scalar> for FieldBytes {
    fn from(scalar: Scalar) -> Self {
        scalar.to_bytes()
    }
}

impl From<&Scalar> for U256 {
    fn from(scalar: &Scalar) -> U256 {
        scalar.to_uint()
    }
}

impl TryFrom<U256> for Scalar {
    type Error = Error;

    fn try_from(w: U256) -> Result<Self> {
        Option::from(Self::from_uint(&w)).ok_or(Error::OutOfRange)
    }
}
