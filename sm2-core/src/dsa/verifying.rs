//! Support for verifying SM2DSA signatures.
//!
//! ## Algorithm
//!
//! ```text
//! B1: verify whether r' in [1,n-1], verification failed if not
//! B2: verify whether s' in [1,n-1], verification failed if not
//! B3: set M'~=ZA || M'
//! B4: calculate e'=Hv(M'~)
//! B5: calculate t = (r' + s') modn, verification failed if t=0
//! B6: calculate the point (x1', y1')=[s']G + [t]PA
//! B7: calculate R=(e'+x1') modn, verification pass if yes, otherwise failed
//! ```

use super::Signature;
use crate::{
    AffinePoint, EncodedPoint, Hash, ProjectivePoint, Sm2,
    distid::{DistId, hash_z},
    ecc::Ecc,
};
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use signature::{Error, Result, Verifier, hazmat::PrehashVerifier};
use sm3::{Sm3, digest::Digest};

/// SM2DSA public key used for verifying signatures are valid for a given
/// message.
///
/// ## Usage
///
/// The [`signature`] crate defines the following traits which are the
/// primary API for verifying:
///
/// - [`Verifier`]: verify a message against a provided key and signature
/// - [`PrehashVerifier`]: verify the low-level raw output bytes of a message digest
///
/// Verification multiplies by the public point through the process-wide
/// [`PointCache`](crate::PointCache), so keys that verify repeatedly get a
/// precomputed table after their second use.
#[derive(Clone, Debug)]
pub struct VerifyingKey {
    /// Signer's public key.
    public_key: AffinePoint,

    /// Signer's user information hash `Z`.
    identity_hash: Hash,

    /// Distinguishing identifier used to compute `Z`.
    distid: String,
}

impl VerifyingKey {
    /// Initialize [`VerifyingKey`] from a signer's distinguishing identifier
    /// and a public point.
    ///
    /// Returns an [`Error`] if the point is the additive identity (a.k.a.
    /// point at infinity) or if the identifier is longer than 8191 bytes.
    pub fn from_affine(distid: &DistId, public_key: AffinePoint) -> Result<Self> {
        if !bool::from(public_key.is_on_curve()) {
            return Err(Error::new());
        }
        let identity_hash = hash_z(distid, &public_key)?;

        Ok(Self {
            identity_hash,
            public_key,
            distid: distid.into(),
        })
    }

    /// Initialize [`VerifyingKey`] from a SEC1-encoded public key.
    pub fn from_sec1_bytes(distid: &DistId, bytes: &[u8]) -> Result<Self> {
        let point = EncodedPoint::from_bytes(bytes).map_err(|_| Error::new())?;
        let public_key =
            Option::from(AffinePoint::from_encoded_point(&point)).ok_or_else(Error::new)?;
        Self::from_affine(distid, public_key)
    }

    /// Borrow the inner [`AffinePoint`] for this public key.
    pub fn as_affine(&self) -> &AffinePoint {
        &self.public_key
    }

    /// Get the distinguishing identifier for this key.
    pub fn distid(&self) -> &DistId {
        self.distid.as_str()
    }

    /// Signer's user information hash `Z`.
    pub fn identity_hash(&self) -> &Hash {
        &self.identity_hash
    }

    /// Convert this [`VerifyingKey`] into the
    /// `Elliptic-Curve-Point-to-Octet-String` encoding described in
    /// SEC 1: Elliptic Curve Cryptography (Version 2.0) section 2.3.3
    /// (page 10).
    ///
    /// <http://www.secg.org/sec1-v2.pdf>
    pub fn to_sec1_bytes(&self) -> Box<[u8]> {
        self.public_key.to_encoded_point(false).to_bytes()
    }

    /// Compute message hash `e` according to [draft-shen-sm2-ecdsa § 5.2.1]
    ///
    /// [draft-shen-sm2-ecdsa § 5.2.1]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#section-5.2.1
    pub fn hash_msg(&self, msg: &[u8]) -> Hash {
        Sm3::new_with_prefix(self.identity_hash)
            .chain_update(msg)
            .finalize()
    }
}

//
// `*Verifier` trait impls
//

impl PrehashVerifier<Signature> for VerifyingKey {
    fn verify_prehash(&self, prehash: &[u8], signature: &Signature) -> Result<()> {
        // B1, B2: `r` and `s` were range checked when the signature was parsed
        let (r, s) = signature.split_scalars();

        // B4: calculate e'=Hv(M'~)
        let e = super::prehash_to_scalar(prehash)?;

        // B5 - B7
        let q = ProjectivePoint::from(&self.public_key);
        if Ecc::new().verify_prehash(&e, &q, &r.to_uint(), &s.to_uint()) {
            Ok(())
        } else {
            Err(Error::new())
        }
    }
}

impl Verifier<Signature> for VerifyingKey {
    fn verify(&self, msg: &[u8], signature: &Signature) -> Result<()> {
        // B3: set M'~=ZA || M'
        let hash = self.hash_msg(msg);
        self.verify_prehash(&hash, signature)
    }
}

#[cfg(feature = "der")]
impl PrehashVerifier<super::der::Signature> for VerifyingKey {
    fn verify_prehash(&self, prehash: &[u8], signature: &super::der::Signature) -> Result<()> {
        let signature = Signature::try_from(signature)?;
        PrehashVerifier::<Signature>::verify_prehash(self, prehash, &signature)
    }
}

#[cfg(feature = "der")]
impl Verifier<super::der::Signature> for VerifyingKey {
    fn verify(&self, msg: &[u8], signature: &super::der::Signature) -> Result<()> {
        let signature = Signature::try_from(signature)?;
        Verifier::<Signature>::verify(self, msg, &signature)
    }
}

//
// Other trait impls
//

impl AsRef<AffinePoint> for VerifyingKey {
    fn as_ref(&self) -> &AffinePoint {
        self.as_affine()
    }
}

impl From<&VerifyingKey> for AffinePoint {
    fn from(verifying_key: &VerifyingKey) -> AffinePoint {
        verifying_key.public_key
    }
}

impl ToEncodedPoint<Sm2> for VerifyingKey {
    fn to_encoded_point(&self, compress: bool) -> EncodedPoint {
        self.as_affine().to_encoded_point(compress)
    }
}

impl PartialEq for VerifyingKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key && self.distid == other.distid
    }
}

impl Eq for VerifyingKey {}
