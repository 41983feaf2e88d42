//! Affine curve points.

#![allow(clippy::op_ref)]

use super::{EQUATION_A, EQUATION_B, FieldElement, GENERATOR};
use crate::{EncodedPoint, FieldBytes, Sm2};
use core::ops::Neg;
use elliptic_curve::{
    point::DecompressPoint,
    sec1::{self, FromEncodedPoint, ToEncodedPoint},
    subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption},
    zeroize::DefaultIsZeroes,
};

/// Point on SM2 in affine coordinates.
///
/// The identity has no affine coordinates and is flagged separately.
#[derive(Clone, Copy, Debug)]
pub struct AffinePoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) infinity: u8,
}

impl AffinePoint {
    /// Additive identity of the group a.k.a. the point at infinity.
    pub const IDENTITY: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ZERO,
        infinity: 1,
    };

    /// Base point of SM2.
    pub const GENERATOR: Self = Self {
        x: GENERATOR.0,
        y: GENERATOR.1,
        infinity: 0,
    };

    /// Build a point from coordinates, checking the curve equation.
    pub fn from_coordinates(x: FieldElement, y: FieldElement) -> CtOption<Self> {
        let point = Self { x, y, infinity: 0 };
        CtOption::new(point, point.is_on_curve())
    }

    /// Parse big-endian coordinates, checking range and the curve equation.
    pub fn from_bytes(x: &FieldBytes, y: &FieldBytes) -> CtOption<Self> {
        FieldElement::from_bytes(x)
            .and_then(|x| FieldElement::from_bytes(y).and_then(|y| Self::from_coordinates(x, y)))
    }

    /// Is this point the identity point?
    pub fn is_identity(&self) -> Choice {
        Choice::from(self.infinity)
    }

    /// Does this point satisfy `y² = x³ - 3x + b`?
    ///
    /// The identity is not on the curve in this sense.
    pub fn is_on_curve(&self) -> Choice {
        let lhs = self.y.square();
        lhs.ct_eq(&curve_rhs(&self.x)) & !self.is_identity()
    }

    /// Big-endian x-coordinate.
    pub fn x(&self) -> FieldBytes {
        self.x.to_bytes()
    }

    /// Big-endian y-coordinate.
    pub fn y(&self) -> FieldBytes {
        self.y.to_bytes()
    }

    /// Is the y-coordinate odd?
    pub fn y_is_odd(&self) -> Choice {
        self.y.is_odd()
    }

    /// The x-coordinate as a field element.
    pub fn x_element(&self) -> FieldElement {
        self.x
    }

    /// The y-coordinate as a field element.
    pub fn y_element(&self) -> FieldElement {
        self.y
    }

    /// Recover the point with the given x-coordinate and y parity.
    ///
    /// Returns `None` if `x` is not below `p` or has no point on the curve.
    pub fn decompress(x: &FieldBytes, y_is_odd: Choice) -> CtOption<Self> {
        FieldElement::from_bytes(x).and_then(|x| {
            curve_rhs(&x).sqrt().map(|beta| {
                let y = FieldElement::conditional_select(
                    &-beta,
                    &beta,
                    beta.is_odd().ct_eq(&y_is_odd),
                );
                Self { x, y, infinity: 0 }
            })
        })
    }

    /// Returns `-self`.
    pub fn neg(&self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
            infinity: self.infinity,
        }
    }
}

/// `x³ + a·x + b`
fn curve_rhs(x: &FieldElement) -> FieldElement {
    x.square() * x + &(EQUATION_A * x) + &EQUATION_B
}

impl ConditionallySelectable for AffinePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            infinity: u8::conditional_select(&a.infinity, &b.infinity, choice),
        }
    }
}

impl ConstantTimeEq for AffinePoint {
    fn ct_eq(&self, other: &Self) -> Choice {
        let both = self.is_identity() & other.is_identity();
        let neither = !(self.is_identity() | other.is_identity());
        both | (neither & self.x.ct_eq(&other.x) & self.y.ct_eq(&other.y))
    }
}

impl PartialEq for AffinePoint {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for AffinePoint {}

impl Default for AffinePoint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DefaultIsZeroes for AffinePoint {}

impl Neg for AffinePoint {
    type Output = AffinePoint;

    fn neg(self) -> AffinePoint {
        AffinePoint::neg(&self)
    }
}

impl DecompressPoint<Sm2> for AffinePoint {
    fn decompress(x: &FieldBytes, y_is_odd: Choice) -> CtOption<Self> {
        AffinePoint::decompress(x, y_is_odd)
    }
}

impl FromEncodedPoint<Sm2> for AffinePoint {
    /// Attempts to parse the given [`EncodedPoint`] as an SEC1-encoded
    /// [`AffinePoint`].
    ///
    /// # Returns
    ///
    /// `None` value if `encoded_point` is not on the SM2 curve.
    fn from_encoded_point(encoded_point: &EncodedPoint) -> CtOption<Self> {
        match encoded_point.coordinates() {
            sec1::Coordinates::Identity => CtOption::new(Self::IDENTITY, Choice::from(1)),
            sec1::Coordinates::Compact { x } => Self::decompress(x, Choice::from(0)),
            sec1::Coordinates::Compressed { x, y_is_odd } => {
                Self::decompress(x, Choice::from(u8::from(y_is_odd)))
            }
            sec1::Coordinates::Uncompressed { x, y } => Self::from_bytes(x, y),
        }
    }
}

impl ToEncodedPoint<Sm2> for AffinePoint {
    fn to_encoded_point(&self, compress: bool) -> EncodedPoint {
        if bool::from(self.is_identity()) {
            EncodedPoint::identity()
        } else {
            EncodedPoint::from_affine_coordinates(&self.x(), &self.y(), compress)
        }
    }
}

impl TryFrom<&EncodedPoint> for AffinePoint {
    type Error = crate::Error;

    fn try_from(point: &EncodedPoint) -> crate::Result<AffinePoint> {
        Option::from(AffinePoint::from_encoded_point(point)).ok_or(crate::Error::NotOnCurve)
    }
}

impl From<&AffinePoint> for EncodedPoint {
    fn from(affine: &AffinePoint) -> EncodedPoint {
        affine.to_encoded_point(false)
    }
}
