//! Pure Rust implementation of group operations on the SM2 elliptic curve.
//!
//! Curve parameters can be found in [draft-shen-sm2-ecdsa Appendix D]:
//! Recommended Parameters.
//!
//! [draft-shen-sm2-ecdsa Appendix D]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#appendix-D

#[macro_use]
mod macros;

pub(crate) mod affine;
#[cfg(feature = "std")]
pub(crate) mod cache;
pub(crate) mod field;
pub(crate) mod limbs;
pub(crate) mod mul;
pub(crate) mod projective;
pub(crate) mod scalar;

pub use self::{
    affine::AffinePoint,
    field::FieldElement,
    mul::{MulStrategy, StripeTable},
    projective::ProjectivePoint,
    scalar::Scalar,
};

/// a = -3 (0xFFFFFFFE FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFF 00000000 FFFFFFFF FFFFFFFC)
pub(crate) const EQUATION_A: FieldElement = FieldElement([
    0xffffffffffffc,
    0xfc00000003fff,
    0xfffffffffffff,
    0xfffffffffffff,
    0x0fffffffbffff,
]);

/// b = 0x28E9FA9E 9D9F5E34 4D5A9E4B CF6509A7 F39789F5 15AB8F92 DDBCBD41 4D940E93
pub(crate) const EQUATION_B: FieldElement = FieldElement([
    0x230632bc0dd42,
    0x9ae9b537ab90d,
    0xea51c3c71cf37,
    0xe2c8527981505,
    0x0240fe188ba20,
]);

/// Base point of SM2.
///
/// ```text
/// Gₓ = 0x32C4AE2C 1F198119 5F990446 6A39C994 8FE30BBF F2660BE1 715A4589 334C74C7
/// Gᵧ = 0xBC3736A2 F4F6779C 59BDCEE3 6B692153 D0A9877C C62A4740 02DF32E5 2139F0A0
/// ```
pub(crate) const GENERATOR: (FieldElement, FieldElement) = (
    FieldElement([
        0x28990f418029e,
        0xeddca6c050613,
        0xc24c3c33e7981,
        0x3b05d6a1ed99a,
        0x091167a5ee1c1,
    ]),
    FieldElement([
        0x54e593c2d0ddd,
        0x788d3295fac13,
        0xe2a48f8c1f5e5,
        0x35bd8d4cfb066,
        0x063cd65d481d7,
    ]),
);
