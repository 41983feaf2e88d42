//! Projective curve points.
//!
//! Points use Jacobian coordinates: `(X, Y, Z)` represents the affine point
//! `(X/Z², Y/Z³)`. The curve has `a = -3`, which the doubling formulas exploit.

#![allow(clippy::op_ref)]

use super::{AffinePoint, FieldElement, GENERATOR, Scalar, mul::mul_windowed};
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use elliptic_curve::{
    subtle::{Choice, ConditionallySelectable, ConstantTimeEq},
    zeroize::DefaultIsZeroes,
};

/// Point on SM2 in Jacobian projective coordinates.
#[derive(Clone, Copy, Debug)]
pub struct ProjectivePoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) infinity: u8,
}

impl ProjectivePoint {
    /// Additive identity of the group a.k.a. the point at infinity.
    pub const IDENTITY: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
        infinity: 1,
    };

    /// Base point of SM2.
    pub const GENERATOR: Self = Self {
        x: GENERATOR.0,
        y: GENERATOR.1,
        z: FieldElement::ONE,
        infinity: 0,
    };

    /// Is this point the identity point?
    pub fn is_identity(&self) -> Choice {
        Choice::from(self.infinity)
    }

    /// Build a point from Jacobian coordinates.
    ///
    /// `Z = 0` yields the identity. The coordinates are not checked against the
    /// curve equation.
    pub fn from_jacobian(x: FieldElement, y: FieldElement, z: FieldElement) -> Self {
        let point = Self {
            x,
            y,
            z,
            infinity: 0,
        };
        Self::conditional_select(&point, &Self::IDENTITY, z.is_zero())
    }

    /// Jacobian coordinates `(X, Y, Z)`.
    pub fn to_jacobian(&self) -> (FieldElement, FieldElement, FieldElement) {
        (self.x, self.y, self.z)
    }

    /// Returns the affine representation of this point.
    pub fn to_affine(&self) -> AffinePoint {
        let zinv = self.z.invert_unchecked();
        let zinv2 = zinv.square();
        let affine = AffinePoint {
            x: self.x * &zinv2,
            y: self.y * &(zinv2 * &zinv),
            infinity: 0,
        };
        AffinePoint::conditional_select(&affine, &AffinePoint::IDENTITY, self.is_identity())
    }

    /// Returns `-self`.
    pub fn neg(&self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
            z: self.z,
            infinity: self.infinity,
        }
    }

    /// Returns `2 * self`.
    pub fn double(&self) -> Self {
        let t1 = self.z.square();
        let z = (self.y * &self.z).double();
        let t2 = self.x - &t1;
        let t1 = self.x + &t1;
        let a = (t1 * &t2).triple();

        let y = self.y.double().square();
        let t2 = y.square().half();
        let y = y * &self.x;

        let x = a.square() - &y.double();
        let y = (y - &x) * &a - &t2;

        let point = Self {
            x,
            y,
            z,
            infinity: 0,
        };
        Self::conditional_select(&point, &Self::IDENTITY, self.is_identity() | z.is_zero())
    }

    /// Returns `2^n * self`.
    ///
    /// Shares work between iterations by carrying `2Y` and `W = Z^4`.
    pub fn double_n(&self, n: usize) -> Self {
        let mut acc = DoubleN::new(self);
        for i in 0..n {
            acc.step(i + 1 < n);
        }
        acc.finish(self.is_identity())
    }

    /// Write `2 * self, 4 * self, …, 2^len * self` into `out`.
    pub fn double_n_store(&self, out: &mut [Self]) {
        let len = out.len();
        let mut acc = DoubleN::new(self);
        for (i, slot) in out.iter_mut().enumerate() {
            acc.step(i + 1 < len);
            *slot = acc.finish(self.is_identity());
        }
    }

    /// Returns `self + other`.
    pub fn add(&self, other: &Self) -> Self {
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = self.x * &z2z2;
        let u2 = other.x * &z1z1;
        let s1 = self.y * &z2z2 * &other.z;
        let s2 = other.y * &z1z1 * &self.z;

        let finite = !(self.is_identity() | other.is_identity());
        if bool::from(finite & u1.ct_eq(&u2) & s1.ct_eq(&s2)) {
            return self.double();
        }

        let h = u2 - &u1;
        let z = h * &self.z * &other.z;
        let sum = Self::sum(&u1, &s1, &h, &(s2 - &s1), z);

        let r = Self::conditional_select(&sum, other, self.is_identity());
        Self::conditional_select(&r, self, other.is_identity())
    }

    /// Returns `self + other` for an affine `other`.
    pub fn add_mixed(&self, other: &AffinePoint) -> Self {
        let z1z1 = self.z.square();
        let u2 = other.x * &z1z1;
        let s2 = other.y * &z1z1 * &self.z;

        let finite = !(self.is_identity() | other.is_identity());
        if bool::from(finite & self.x.ct_eq(&u2) & self.y.ct_eq(&s2)) {
            return self.double();
        }

        let h = u2 - &self.x;
        let z = self.z * &h;
        let sum = Self::sum(&self.x, &self.y, &h, &(s2 - &self.y), z);

        let r = Self::conditional_select(&sum, &Self::from(other), self.is_identity());
        Self::conditional_select(&r, self, other.is_identity())
    }

    /// Returns `(self + other, self - other)`.
    ///
    /// Both results share the `U`/`S` products and `H`.
    pub fn add_sub(&self, other: &Self) -> (Self, Self) {
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = self.x * &z2z2;
        let u2 = other.x * &z1z1;

        let finite = !(self.is_identity() | other.is_identity());
        if bool::from(finite & u1.ct_eq(&u2)) {
            return (self.add(other), self.sub(other));
        }

        let s1 = self.y * &z2z2 * &other.z;
        let s2 = other.y * &z1z1 * &self.z;
        let h = u2 - &u1;
        let z = h * &self.z * &other.z;

        let sum = Self::sum(&u1, &s1, &h, &(s2 - &s1), z);
        let difference = Self::sum(&u1, &s1, &h, &(-(s2 + &s1)), z);

        let sum = Self::conditional_select(&sum, other, self.is_identity());
        let sum = Self::conditional_select(&sum, self, other.is_identity());
        let difference = Self::conditional_select(&difference, &other.neg(), self.is_identity());
        let difference = Self::conditional_select(&difference, self, other.is_identity());
        (sum, difference)
    }

    /// Common tail of the addition formulas given `U1`, `S1`, `H`, `R` and `Z3`.
    #[inline]
    fn sum(
        u1: &FieldElement,
        s1: &FieldElement,
        h: &FieldElement,
        r: &FieldElement,
        z: FieldElement,
    ) -> Self {
        let hh = h.square();
        let hhh = hh * h;
        let v = *u1 * &hh;
        let x = r.square() - &hhh - &v.double();
        let y = *r * &(v - &x) - &(*s1 * &hhh);
        Self::from_jacobian(x, y, z)
    }

    /// Returns `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Returns `[k] self` using the windowed strategy.
    pub fn mul(&self, k: &Scalar) -> Self {
        mul_windowed(self, &k.to_uint())
    }
}

/// State of a run of repeated doublings.
struct DoubleN {
    x: FieldElement,
    /// `2Y`
    y: FieldElement,
    z: FieldElement,
    /// `Z^4`
    w: FieldElement,
}

impl DoubleN {
    fn new(p: &ProjectivePoint) -> Self {
        Self {
            x: p.x,
            y: p.y.double(),
            z: p.z,
            w: p.z.square().square(),
        }
    }

    /// One doubling. `W` is only needed when another doubling follows.
    #[inline]
    fn step(&mut self, more: bool) {
        let a = (self.x.square() - &self.w).triple();
        let t1 = self.y.square();
        let b = t1 * &self.x;
        self.x = a.square() - &b.double();
        let t2 = b - &self.x;
        self.z *= &self.y;
        let t1 = t1.square();
        if more {
            self.w *= &t1;
        }
        self.y = (a * &t2).double() - &t1;
    }

    fn finish(&self, infinity: Choice) -> ProjectivePoint {
        let point = ProjectivePoint {
            x: self.x,
            y: self.y.half(),
            z: self.z,
            infinity: 0,
        };
        ProjectivePoint::conditional_select(
            &point,
            &ProjectivePoint::IDENTITY,
            infinity | self.z.is_zero(),
        )
    }
}

impl ConditionallySelectable for ProjectivePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
            infinity: u8::conditional_select(&a.infinity, &b.infinity, choice),
        }
    }
}

impl ConstantTimeEq for ProjectivePoint {
    fn ct_eq(&self, other: &Self) -> Choice {
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let x_eq = (self.x * &z2z2).ct_eq(&(other.x * &z1z1));
        let y_eq = (self.y * &z2z2 * &other.z).ct_eq(&(other.y * &z1z1 * &self.z));
        let both = self.is_identity() & other.is_identity();
        let neither = !(self.is_identity() | other.is_identity());
        both | (neither & x_eq & y_eq)
    }
}

impl PartialEq for ProjectivePoint {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for ProjectivePoint {}

impl Default for ProjectivePoint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DefaultIsZeroes for ProjectivePoint {}

impl From<AffinePoint> for ProjectivePoint {
    fn from(p: AffinePoint) -> Self {
        Self::from(&p)
    }
}

impl From<&AffinePoint> for ProjectivePoint {
    fn from(p: &AffinePoint) -> Self {
        let projective = Self {
            x: p.x,
            y: p.y,
            z: FieldElement::ONE,
            infinity: 0,
        };
        Self::conditional_select(&projective, &Self::IDENTITY, p.is_identity())
    }
}

impl From<ProjectivePoint> for AffinePoint {
    fn from(p: ProjectivePoint) -> AffinePoint {
        p.to_affine()
    }
}

impl From<&ProjectivePoint> for AffinePoint {
    fn from(p: &ProjectivePoint) -> AffinePoint {
        p.to_affine()
    }
}

impl Add<ProjectivePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::add(&self, &other)
    }
}

impl Add<&ProjectivePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: &ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::add(&self, other)
    }
}

impl Add<&ProjectivePoint> for &ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: &ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::add(self, other)
    }
}

impl AddAssign<ProjectivePoint> for ProjectivePoint {
    fn add_assign(&mut self, rhs: ProjectivePoint) {
        *self = ProjectivePoint::add(self, &rhs);
    }
}

impl AddAssign<&ProjectivePoint> for ProjectivePoint {
    fn add_assign(&mut self, rhs: &ProjectivePoint) {
        *self = ProjectivePoint::add(self, rhs);
    }
}

impl Add<&AffinePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: &AffinePoint) -> ProjectivePoint {
        ProjectivePoint::add_mixed(&self, other)
    }
}

impl AddAssign<&AffinePoint> for ProjectivePoint {
    fn add_assign(&mut self, rhs: &AffinePoint) {
        *self = ProjectivePoint::add_mixed(self, rhs);
    }
}

impl Sub<ProjectivePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn sub(self, other: ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::sub(&self, &other)
    }
}

impl Sub<&ProjectivePoint> for &ProjectivePoint {
    type Output = ProjectivePoint;

    fn sub(self, other: &ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::sub(self, other)
    }
}

impl SubAssign<ProjectivePoint> for ProjectivePoint {
    fn sub_assign(&mut self, rhs: ProjectivePoint) {
        *self = ProjectivePoint::sub(self, &rhs);
    }
}

impl Mul<Scalar> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn mul(self, k: Scalar) -> ProjectivePoint {
        ProjectivePoint::mul(&self, &k)
    }
}

impl Mul<&Scalar> for &ProjectivePoint {
    type Output = ProjectivePoint;

    fn mul(self, k: &Scalar) -> ProjectivePoint {
        ProjectivePoint::mul(self, k)
    }
}

impl Neg for ProjectivePoint {
    type Output = ProjectivePoint;

    fn neg(self) -> ProjectivePoint {
        ProjectivePoint::neg(&self)
    }
}

impl Neg for &ProjectivePoint {
    type Output = ProjectivePoint;

    fn neg(self) -> ProjectivePoint {
        ProjectivePoint::neg(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{AffinePoint, ProjectivePoint};
    use crate::{FieldElement, Scalar};
    use proptest::prelude::*;

    fn point(k: u64) -> ProjectivePoint {
        let mut acc = ProjectivePoint::IDENTITY;
        for _ in 0..k {
            acc = acc.add_mixed(&AffinePoint::GENERATOR);
        }
        acc
    }

    #[test]
    fn affine_to_projective() {
        let basepoint_affine = AffinePoint::GENERATOR;
        let basepoint_projective = ProjectivePoint::GENERATOR;

        assert_eq!(ProjectivePoint::from(basepoint_affine), basepoint_projective);
        assert_eq!(basepoint_projective.to_affine(), basepoint_affine);
        assert!(bool::from(basepoint_projective.to_affine().is_on_curve()));

        assert!(bool::from(
            ProjectivePoint::IDENTITY.to_affine().is_identity()
        ));
        assert_eq!(
            ProjectivePoint::from(AffinePoint::IDENTITY),
            ProjectivePoint::IDENTITY
        );
    }

    #[test]
    fn identity_laws() {
        let g = ProjectivePoint::GENERATOR;
        let id = ProjectivePoint::IDENTITY;
        assert_eq!(g + id, g);
        assert_eq!(id + g, g);
        assert_eq!(id + id, id);
        assert_eq!(id.double(), id);
        assert_eq!(id.double_n(7), id);
        assert_eq!(g.add_mixed(&AffinePoint::IDENTITY), g);
        assert_eq!(id.add_mixed(&AffinePoint::GENERATOR), g);
    }

    #[test]
    fn inverse_is_identity() {
        let g = ProjectivePoint::GENERATOR;
        assert!(bool::from((g + (-g)).is_identity()));
        assert!(bool::from((g - g).is_identity()));
        assert!(bool::from(g.add_mixed(&(-AffinePoint::GENERATOR)).is_identity()));

        let p = point(5);
        let (sum, difference) = p.add_sub(&p);
        assert_eq!(sum, point(10));
        assert!(bool::from(difference.is_identity()));
    }

    #[test]
    fn add_sub_with_identity() {
        let p = point(5);
        let id = ProjectivePoint::IDENTITY;
        assert_eq!(id.add_sub(&p), (p, -p));
        assert_eq!(p.add_sub(&id), (p, p));

        let (sum, difference) = id.add_sub(&id);
        assert!(bool::from(sum.is_identity()));
        assert!(bool::from(difference.is_identity()));

        let (sum, difference) = p.add_sub(&-p);
        assert!(bool::from(sum.is_identity()));
        assert_eq!(difference, point(10));
    }

    #[test]
    fn zeroize_resets_to_identity() {
        use elliptic_curve::zeroize::Zeroize;

        let mut p = point(7);
        p.zeroize();
        assert!(bool::from(p.is_identity()));
        assert_eq!(p, ProjectivePoint::IDENTITY);
    }

    #[test]
    fn add_equal_points_doubles() {
        let g = ProjectivePoint::GENERATOR;
        assert_eq!(g + g, g.double());
        assert_eq!(g.add_mixed(&AffinePoint::GENERATOR), g.double());
        assert_eq!(point(3) + point(3), point(6));
    }

    #[test]
    fn projective_add_and_sub() {
        for i in 1..12 {
            for j in 1..6 {
                let (p, q) = (point(i), point(j));
                assert_eq!(p + q, point(i + j));
                let (sum, difference) = p.add_sub(&q);
                assert_eq!(sum, point(i + j));
                assert_eq!(difference + q, p);
            }
        }
    }

    #[test]
    fn double_n_matches_repeated_double() {
        let p = point(7);
        let mut expected = p;
        let mut stored = [ProjectivePoint::IDENTITY; 6];
        p.double_n_store(&mut stored);
        for (i, entry) in stored.iter().enumerate() {
            expected = expected.double();
            assert_eq!(*entry, expected);
            assert_eq!(p.double_n(i + 1), expected);
            assert!(bool::from(entry.to_affine().is_on_curve()));
        }
        assert_eq!(p.double_n(0), p);
    }

    #[test]
    fn jacobian_scaling_is_invisible() {
        let p = point(9).to_affine();
        let z = FieldElement::from_u64(0x1234_5678);
        let z2 = z.square();
        let scaled = ProjectivePoint::from_jacobian(p.x * &z2, p.y * &(z2 * &z), z);
        assert_eq!(scaled, ProjectivePoint::from(p));
        assert_eq!(scaled.to_affine(), p);
        assert!(bool::from(
            ProjectivePoint::from_jacobian(p.x, p.y, FieldElement::ZERO).is_identity()
        ));
    }

    prop_compose! {
        fn small_point()(k in 1u64..64) -> ProjectivePoint {
            point(k)
        }
    }

    proptest! {
        #[test]
        fn associativity(p in small_point(), q in small_point(), r in small_point()) {
            prop_assert_eq!((p + q) + r, p + (q + r));
        }

        #[test]
        fn commutativity(p in small_point(), q in small_point()) {
            prop_assert_eq!(p + q, q + p);
            prop_assert_eq!(p.add_mixed(&q.to_affine()), p + q);
        }

        #[test]
        fn double_is_add(p in small_point()) {
            prop_assert_eq!(p.double(), p + p);
        }

        #[test]
        fn scalar_mul_distributes(a in 1u64..1000, b in 1u64..1000) {
            let g = ProjectivePoint::GENERATOR;
            let sum = g * Scalar::from_u64(a) + g * Scalar::from_u64(b);
            prop_assert_eq!(sum, g * Scalar::from_u64(a + b));
        }
    }
}
