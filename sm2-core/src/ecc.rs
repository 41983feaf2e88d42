//! SM2 key, key-agreement and signature operations over big integers.
//!
//! This is the boundary used by protocol code that keeps its values as
//! [`U256`] integers. Coordinates are reduced modulo `p` on entry and every
//! output is canonical. A point is an [`EccPoint`] in Jacobian coordinates;
//! `x = y = 0` (or `z = 0`) is the point at infinity.
//!
//! ```
//! # fn example() -> sm2_core::Result<()> {
//! use rand_core::OsRng; // requires `getrandom` feature
//! use sm2_core::ecc::Ecc;
//!
//! let ecc = Ecc::new();
//! let (d, q) = ecc.make_key(&mut OsRng, true)?;
//! ecc.check_key(&q.x, &q.y, Some(&d))?;
//!
//! let hash = [0x5a; 32];
//! let (r, s) = ecc.sign(&hash, &mut OsRng, &d, None)?;
//! assert!(ecc.verify(&hash, &q, &r, &s)?);
//! # Ok(())
//! # }
//! ```

use crate::{
    AffinePoint, Error, FieldElement, MODULUS, MulStrategy, ORDER, PointCache, ProjectivePoint,
    Result, Scalar, U256, mul_base, mul_windowed,
};
use elliptic_curve::{
    bigint::{Encoding, Limb},
    subtle::Choice,
    zeroize::Zeroizing,
};
use rand_core::CryptoRngCore;

/// Maximum number of nonces tried by one signing call.
pub const SIGN_RETRIES: usize = 64;

/// Curve point at the big-integer boundary, in Jacobian coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EccPoint {
    /// `X` coordinate.
    pub x: U256,
    /// `Y` coordinate.
    pub y: U256,
    /// `Z` coordinate. One for affine points.
    pub z: U256,
}

impl EccPoint {
    /// The point at infinity.
    pub const IDENTITY: Self = Self {
        x: U256::ZERO,
        y: U256::ZERO,
        z: U256::ZERO,
    };

    /// Affine point `(x, y)`.
    pub const fn new(x: U256, y: U256) -> Self {
        Self { x, y, z: U256::ONE }
    }

    /// Is this the point at infinity?
    pub fn is_identity(&self) -> bool {
        self.z == U256::ZERO || (self.x == U256::ZERO && self.y == U256::ZERO)
    }

    fn to_projective(self) -> ProjectivePoint {
        if self.is_identity() {
            return ProjectivePoint::IDENTITY;
        }
        ProjectivePoint::from_jacobian(
            FieldElement::from_uint_reduced(&self.x),
            FieldElement::from_uint_reduced(&self.y),
            FieldElement::from_uint_reduced(&self.z),
        )
    }

    fn from_projective(p: &ProjectivePoint, map: bool) -> Self {
        if bool::from(p.is_identity()) {
            return Self::IDENTITY;
        }
        if map {
            return Self::from(&p.to_affine());
        }
        let (x, y, z) = p.to_jacobian();
        Self {
            x: x.to_uint(),
            y: y.to_uint(),
            z: z.to_uint(),
        }
    }
}

impl From<&AffinePoint> for EccPoint {
    fn from(p: &AffinePoint) -> Self {
        if bool::from(p.is_identity()) {
            Self::IDENTITY
        } else {
            Self::new(p.x.to_uint(), p.y.to_uint())
        }
    }
}

/// SM2 operations bound to a [`PointCache`] and a [`MulStrategy`].
#[derive(Clone, Copy, Debug)]
pub struct Ecc<'a> {
    cache: &'a PointCache,
    strategy: MulStrategy,
}

impl Ecc<'static> {
    /// Operations using the process-wide cache and the default strategy.
    pub fn new() -> Self {
        Self::with_cache(PointCache::global())
    }
}

impl Default for Ecc<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Ecc<'a> {
    /// Operations using `cache` for stripe tables.
    pub fn with_cache(cache: &'a PointCache) -> Self {
        Self {
            cache,
            strategy: MulStrategy::default(),
        }
    }

    /// Use `strategy` for multiplications.
    pub fn with_strategy(self, strategy: MulStrategy) -> Self {
        Self { strategy, ..self }
    }

    /// The multiplication strategy in use.
    pub fn strategy(&self) -> MulStrategy {
        self.strategy
    }

    /// The cache in use.
    pub fn cache(&self) -> &'a PointCache {
        self.cache
    }

    pub(crate) fn mul_point(&self, k: &U256, p: &ProjectivePoint) -> ProjectivePoint {
        match self.strategy {
            MulStrategy::Windowed => mul_windowed(p, k),
            MulStrategy::Stripe => {
                let affine = p.to_affine();
                if affine == AffinePoint::GENERATOR {
                    return mul_base(k);
                }
                match self.cache.lookup(&affine) {
                    Some(table) => table.mul(k),
                    None => mul_windowed(p, k),
                }
            }
        }
    }

    pub(crate) fn mul_generator(&self, k: &U256) -> ProjectivePoint {
        match self.strategy {
            MulStrategy::Windowed => mul_windowed(&ProjectivePoint::GENERATOR, k),
            MulStrategy::Stripe => mul_base(k),
        }
    }

    /// Compute `k·P`, normalized to `z = 1` when `map` is set.
    pub fn scalar_mul(&self, k: &U256, p: &EccPoint, map: bool) -> EccPoint {
        let r = self.mul_point(k, &p.to_projective());
        EccPoint::from_projective(&r, map)
    }

    /// Compute `k·P + Q`.
    pub fn scalar_mul_add(&self, k: &U256, p: &EccPoint, q: &EccPoint, map: bool) -> EccPoint {
        let r = self.mul_point(k, &p.to_projective()) + q.to_projective();
        EccPoint::from_projective(&r, map)
    }

    /// Compute `k·G`.
    pub fn scalar_mul_base(&self, k: &U256, map: bool) -> EccPoint {
        EccPoint::from_projective(&self.mul_generator(k), map)
    }

    /// Compute `k·G + Q`.
    pub fn scalar_mul_base_add(&self, k: &U256, q: &EccPoint, map: bool) -> EccPoint {
        let r = self.mul_generator(k) + q.to_projective();
        EccPoint::from_projective(&r, map)
    }

    /// Compute `P + Q` without normalizing.
    pub fn proj_add_point(&self, p: &EccPoint, q: &EccPoint) -> EccPoint {
        EccPoint::from_projective(&(p.to_projective() + q.to_projective()), false)
    }

    /// Compute `2·P` without normalizing.
    pub fn proj_dbl_point(&self, p: &EccPoint) -> EccPoint {
        EccPoint::from_projective(&p.to_projective().double(), false)
    }

    /// Normalize `P` to `z = 1`.
    pub fn map(&self, p: &EccPoint) -> EccPoint {
        EccPoint::from_projective(&p.to_projective(), true)
    }

    /// Check that `(x, y)` is a point on the curve.
    pub fn validate_point(&self, x: &U256, y: &U256) -> Result<()> {
        let p = affine_from_uints(x, y)?;
        if bool::from(p.is_on_curve()) {
            Ok(())
        } else {
            Err(Error::NotOnCurve)
        }
    }

    /// Check a public key and, if given, that the private key matches it.
    pub fn check_key(&self, x: &U256, y: &U256, private: Option<&U256>) -> Result<()> {
        let q = affine_from_uints(x, y)?;
        if let Some(d) = private {
            if d >= &ORDER {
                return Err(Error::OutOfRange);
            }
        }
        if x == &U256::ZERO && y == &U256::ZERO {
            return Err(Error::PointAtInfinity);
        }
        if !bool::from(q.is_on_curve()) {
            return Err(Error::NotOnCurve);
        }

        let q = ProjectivePoint::from(&q);
        if !bool::from(mul_windowed(&q, &ORDER).is_identity()) {
            return Err(Error::InvalidOrder);
        }
        if let Some(d) = private {
            if self.mul_generator(d) != q {
                return Err(Error::PrivateKeyMismatch);
            }
        }
        Ok(())
    }

    /// Recover `y` from `x` and the parity of `y`.
    pub fn uncompress(&self, x: &U256, odd: bool) -> Result<U256> {
        let x = FieldElement::from_uint(x);
        let x = Option::<FieldElement>::from(x).ok_or(Error::OutOfRange)?;
        let p = AffinePoint::decompress(&x.to_bytes(), Choice::from(u8::from(odd)));
        Option::<AffinePoint>::from(p)
            .map(|p| p.y.to_uint())
            .ok_or(Error::NotOnCurve)
    }

    /// Generate a key pair `(d, d·G)`.
    ///
    /// With `validate`, the public point is also checked to have order `n`.
    pub fn make_key<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        validate: bool,
    ) -> Result<(U256, EccPoint)> {
        loop {
            let d = Zeroizing::new(Scalar::generate(rng)?);
            let d = Zeroizing::new(d.to_uint());
            let q = self.mul_generator(&d);
            if bool::from(q.is_identity()) {
                log::debug!("key generation produced the identity, retrying");
                continue;
            }
            if validate && !bool::from(mul_windowed(&q, &ORDER).is_identity()) {
                return Err(Error::InvalidOrder);
            }
            return Ok((*d, EccPoint::from_projective(&q, true)));
        }
    }

    /// ECDH: write the x-coordinate of `d·Q` to `out` and return its length.
    pub fn secret_gen(&self, d: &U256, q: &EccPoint, out: &mut [u8]) -> Result<usize> {
        let out = out.get_mut(..32).ok_or(Error::BufferTooSmall)?;
        let q = q.to_projective();
        if bool::from(q.is_identity()) {
            return Err(Error::PointAtInfinity);
        }
        if !bool::from(q.to_affine().is_on_curve()) {
            return Err(Error::NotOnCurve);
        }

        let shared = Zeroizing::new(self.mul_point(d, &q));
        let shared = Zeroizing::new(shared.to_affine());
        if bool::from(shared.is_identity()) {
            return Err(Error::PointAtInfinity);
        }
        let x = Zeroizing::new(shared.x());
        out.copy_from_slice(&x);
        Ok(out.len())
    }

    /// Sign a message digest with private key `d`.
    ///
    /// `k`, when given, is used as the nonce of the first attempt. Later
    /// attempts and the inversion blinding draw from `rng`.
    pub fn sign<R: CryptoRngCore>(
        &self,
        hash: &[u8],
        rng: &mut R,
        d: &U256,
        k: Option<&U256>,
    ) -> Result<(U256, U256)> {
        let e = hash_to_scalar(hash)?;
        let d = Option::<Scalar>::from(Scalar::from_uint(d)).ok_or(Error::OutOfRange)?;
        let d = Zeroizing::new(d);
        let k = match k {
            Some(k) => {
                let k = Option::<Scalar>::from(Scalar::from_uint(k)).ok_or(Error::OutOfRange)?;
                if bool::from(k.is_zero()) {
                    return Err(Error::OutOfRange);
                }
                Some(Zeroizing::new(k))
            }
            None => None,
        };

        let (r, s) = self.sign_prehash(
            &e,
            &d,
            k.as_deref(),
            Some(rng as &mut dyn CryptoRngCore),
        )?;
        Ok((r.to_uint(), s.to_uint()))
    }

    /// Sign the reduced digest `e`.
    ///
    /// Without an RNG only the supplied nonce is tried and the inversion is
    /// not blinded.
    pub(crate) fn sign_prehash(
        &self,
        e: &Scalar,
        d: &Scalar,
        k: Option<&Scalar>,
        mut rng: Option<&mut dyn CryptoRngCore>,
    ) -> Result<(Scalar, Scalar)> {
        let d_plus_one = *d + Scalar::ONE;
        if bool::from(d.is_zero() | d_plus_one.is_zero()) {
            return Err(Error::OutOfRange);
        }
        let d_plus_one = Zeroizing::new(d_plus_one);

        for attempt in 0..SIGN_RETRIES {
            let k = match (attempt, k, rng.as_deref_mut()) {
                (0, Some(k), _) => Zeroizing::new(*k),
                (_, _, Some(rng)) => Zeroizing::new(Scalar::generate(rng)?),
                (_, _, None) => return Err(Error::RetryExhausted),
            };

            let k_uint = Zeroizing::new(k.to_uint());
            let x1 = self.mul_generator(&k_uint).to_affine().x;
            let r = *e + Scalar::reduce(&x1.to_uint());
            if bool::from(r.is_zero() | (r + *k).is_zero()) {
                log::debug!("sign: attempt {} gave a degenerate r, retrying", attempt);
                continue;
            }

            let b = match rng.as_deref_mut() {
                Some(rng) => Zeroizing::new(Scalar::generate(rng)?),
                None => Zeroizing::new(Scalar::ONE),
            };
            let inv = Zeroizing::new((*d_plus_one * *b).invert_unchecked());
            let rd = Zeroizing::new(r * d);
            let k_minus_rd = Zeroizing::new(*k - *rd);
            let s = *b * *k_minus_rd * *inv;
            if bool::from(s.is_zero()) {
                log::debug!("sign: attempt {} gave s = 0, retrying", attempt);
                continue;
            }
            return Ok((r, s));
        }

        Err(Error::RetryExhausted)
    }

    /// Verify signature `(r, s)` over a message digest with public key `Q`.
    pub fn verify(&self, hash: &[u8], q: &EccPoint, r: &U256, s: &U256) -> Result<bool> {
        let e = hash_to_scalar(hash)?;
        Ok(self.verify_prehash(&e, &q.to_projective(), r, s))
    }

    /// Verify against the reduced digest `e`.
    pub(crate) fn verify_prehash(
        &self,
        e: &Scalar,
        q: &ProjectivePoint,
        r: &U256,
        s: &U256,
    ) -> bool {
        let (Some(r), Some(s)) = (
            Option::<Scalar>::from(Scalar::from_uint(r)),
            Option::<Scalar>::from(Scalar::from_uint(s)),
        ) else {
            return false;
        };
        if bool::from(r.is_zero() | s.is_zero() | q.is_identity()) {
            return false;
        }

        let t = r + s;
        if bool::from(t.is_zero()) {
            return false;
        }

        let p = self.mul_generator(&s.to_uint()) + self.mul_point(&t.to_uint(), q);
        if bool::from(p.is_identity()) {
            return false;
        }

        // x1 ≡ r - e (mod n) and x1 < p, so x1 is v or v + n
        let (x, _, z) = p.to_jacobian();
        let zz = z.square();
        let v = (r - e).to_uint();
        if x == FieldElement::from_uint_reduced(&v) * zz {
            return true;
        }
        let (w, carry) = v.adc(&ORDER, Limb::ZERO);
        carry == Limb::ZERO && w < MODULUS && x == FieldElement::from_uint_reduced(&w) * zz
    }
}

/// Parse affine coordinates, rejecting values not below `p`.
fn affine_from_uints(x: &U256, y: &U256) -> Result<AffinePoint> {
    let x = Option::<FieldElement>::from(FieldElement::from_uint(x)).ok_or(Error::OutOfRange)?;
    let y = Option::<FieldElement>::from(FieldElement::from_uint(y)).ok_or(Error::OutOfRange)?;
    Ok(AffinePoint { x, y, infinity: 0 })
}

/// Leftmost 32 bytes of a digest as an integer, reduced modulo `n`.
pub(crate) fn hash_to_scalar(hash: &[u8]) -> Result<Scalar> {
    if hash.is_empty() {
        return Err(Error::BadArgument);
    }
    let hash = &hash[..hash.len().min(32)];
    let mut bytes = [0u8; 32];
    bytes[32 - hash.len()..].copy_from_slice(hash);
    Ok(Scalar::reduce(&U256::from_be_bytes(bytes)))
}
