//! Support for SM2DSA signing.
//!
//! ## Algorithm
//!
//! ```text
//! A1: set M~=ZA || M
//! A2: calculate e=Hv(M~)
//! A3: pick a random number k in [1, n-1] via a random number generator
//! A4: calculate the elliptic curve point (x1, y1)=[k]G
//! A5: calculate r=(e+x1) modn, return to A3 if r=0 or r+k=n
//! A6: calculate s=((1+dA)^(-1)*(k-r*dA)) modn, return to A3 if s=0
//! A7: the digital signature of M is (r, s)
//! ```
//!
//! The first `k` is derived with RFC6979. Retries draw fresh nonces from the
//! caller's RNG, so [`PrehashSigner`] fails on the (negligible) chance that
//! the derived nonce is rejected.

use super::{Signature, VerifyingKey};
use crate::{FieldBytes, ORDER, Scalar, Sm2, distid::DistId, ecc::Ecc, mul_base};
use core::fmt::{self, Debug};
use elliptic_curve::{
    FieldBytesEncoding,
    subtle::{Choice, ConstantTimeEq},
    zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing},
};
use signature::{
    Error, KeypairRef, RandomizedSigner, Result, Signer,
    hazmat::{PrehashSigner, RandomizedPrehashSigner},
    rand_core::CryptoRngCore,
};
use sm3::Sm3;

/// SM2DSA secret key used for signing messages and producing signatures.
///
/// ## Usage
///
/// The [`signature`] crate defines the following traits which are the
/// primary API for signing:
///
/// - [`Signer`]: sign a message using this key
/// - [`PrehashSigner`]: sign the low-level raw output bytes of a message digest
#[derive(Clone)]
pub struct SigningKey {
    /// Secret key, in `[1, n-2]`.
    secret_scalar: Scalar,

    /// Verifying key for this signing key.
    verifying_key: VerifyingKey,
}

impl SigningKey {
    /// Generate a random signing key for the given distinguishing identifier.
    pub fn random(distid: &DistId, rng: &mut impl CryptoRngCore) -> Result<Self> {
        loop {
            let secret_scalar = Scalar::generate(rng)?;
            // `n - 1` has no `(1 + d)⁻¹`
            if bool::from((secret_scalar + Scalar::ONE).is_zero()) {
                continue;
            }
            return Self::from_scalar(distid, secret_scalar);
        }
    }

    /// Parse signing key from big endian-encoded bytes.
    pub fn from_bytes(distid: &DistId, bytes: &FieldBytes) -> Result<Self> {
        let secret_scalar = Option::from(Scalar::from_bytes(bytes)).ok_or_else(Error::new)?;
        Self::from_scalar(distid, secret_scalar)
    }

    /// Parse signing key from big endian-encoded byte slice containing a secret
    /// scalar value.
    pub fn from_slice(distid: &DistId, slice: &[u8]) -> Result<Self> {
        Self::from_bytes(distid, &super::field_bytes(slice)?)
    }

    /// Create a signing key from a secret scalar.
    ///
    /// Returns an [`Error`] for `0` and `n - 1`, which cannot sign.
    pub fn from_scalar(distid: &DistId, secret_scalar: Scalar) -> Result<Self> {
        if bool::from(secret_scalar.is_zero() | (secret_scalar + Scalar::ONE).is_zero()) {
            return Err(Error::new());
        }

        let secret_uint = Zeroizing::new(secret_scalar.to_uint());
        let public_key = mul_base(&secret_uint).to_affine();
        let verifying_key = VerifyingKey::from_affine(distid, public_key)?;
        Ok(Self {
            secret_scalar,
            verifying_key,
        })
    }

    /// Serialize as bytes.
    pub fn to_bytes(&self) -> FieldBytes {
        self.secret_scalar.to_bytes()
    }

    /// Borrow the secret [`Scalar`] value for this key.
    ///
    /// # ⚠️ Warning
    ///
    /// This value is key material.
    ///
    /// Please treat it with the care it deserves!
    pub fn as_scalar(&self) -> &Scalar {
        &self.secret_scalar
    }

    /// Get the [`VerifyingKey`] which corresponds to this [`SigningKey`].
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Get the distinguishing identifier for this key.
    pub fn distid(&self) -> &DistId {
        self.verifying_key.distid()
    }
}

//
// `*Signer` trait impls
//

impl PrehashSigner<Signature> for SigningKey {
    fn sign_prehash(&self, prehash: &[u8]) -> Result<Signature> {
        sign_prehash_rfc6979(&self.secret_scalar, prehash, &[], None)
    }
}

impl RandomizedPrehashSigner<Signature> for SigningKey {
    fn sign_prehash_with_rng(
        &self,
        rng: &mut impl CryptoRngCore,
        prehash: &[u8],
    ) -> Result<Signature> {
        let mut data = FieldBytes::default();
        rng.try_fill_bytes(&mut data)?;
        let rng: &mut dyn CryptoRngCore = rng;
        sign_prehash_rfc6979(&self.secret_scalar, prehash, &data, Some(rng))
    }
}

impl RandomizedSigner<Signature> for SigningKey {
    fn try_sign_with_rng(&self, rng: &mut impl CryptoRngCore, msg: &[u8]) -> Result<Signature> {
        // A1: set M~=ZA || M
        let hash = self.verifying_key.hash_msg(msg);
        self.sign_prehash_with_rng(rng, &hash)
    }
}

impl Signer<Signature> for SigningKey {
    fn try_sign(&self, msg: &[u8]) -> Result<Signature> {
        // A1: set M~=ZA || M
        let hash = self.verifying_key.hash_msg(msg);
        self.sign_prehash(&hash)
    }
}

//
// Other trait impls
//

impl AsRef<VerifyingKey> for SigningKey {
    fn as_ref(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

impl ConstantTimeEq for SigningKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.secret_scalar.ct_eq(&other.secret_scalar)
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("verifying_key", &self.verifying_key)
            .finish_non_exhaustive()
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.secret_scalar.zeroize();
    }
}

impl ZeroizeOnDrop for SigningKey {}

/// Constant-time comparison
impl Eq for SigningKey {}
impl PartialEq for SigningKey {
    fn eq(&self, other: &SigningKey) -> bool {
        self.ct_eq(other).into()
    }
}

impl KeypairRef for SigningKey {
    type VerifyingKey = VerifyingKey;
}

/// Compute a signature using RFC6979 to deterministically derive `k`.
fn sign_prehash_rfc6979(
    secret_scalar: &Scalar,
    prehash: &[u8],
    data: &[u8],
    rng: Option<&mut dyn CryptoRngCore>,
) -> Result<Signature> {
    // A2: calculate e=Hv(M~)
    let e = super::prehash_to_scalar(prehash)?;

    // A3: pick a random number k in [1, n-1] via a random number generator
    let mut x = secret_scalar.to_bytes();
    let mut k_bytes = rfc6979::generate_k::<Sm3, _>(
        &x,
        &FieldBytesEncoding::<Sm2>::encode_field_bytes(&ORDER),
        &e.to_bytes(),
        data,
    );
    x.zeroize();
    let k = Scalar::from_bytes(&k_bytes);
    k_bytes.zeroize();
    let mut k = Option::<Scalar>::from(k).ok_or_else(Error::new)?;

    // A4 - A6, retrying from A3 on degenerate values
    let signed = Ecc::new().sign_prehash(&e, secret_scalar, Some(&k), rng);
    k.zeroize();
    let (r, s) = signed?;

    // A7: the digital signature of M is (r, s)
    Signature::from_scalars(r, s)
}
