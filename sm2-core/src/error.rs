//! Error types.

use core::fmt::{self, Display, Formatter};

/// Result type with the `sm2-core` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by the key and signature protocol layer.
///
/// Field, scalar and point arithmetic never fail. Scratch space is fixed-size,
/// so there is no allocation failure to report either.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Error {
    /// Input has the wrong length or shape.
    BadArgument,
    /// Value is not below the field modulus or group order.
    OutOfRange,
    /// Output buffer cannot hold the result.
    BufferTooSmall,
    /// The random number generator failed.
    Rng,
    /// Signing gave up after the maximum number of attempts.
    ///
    /// Calling again with fresh randomness may succeed.
    RetryExhausted,
    /// Point does not satisfy the curve equation.
    NotOnCurve,
    /// Point is the point at infinity.
    PointAtInfinity,
    /// Point does not have order `n`.
    InvalidOrder,
    /// Private scalar does not generate the public point.
    PrivateKeyMismatch,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadArgument => write!(f, "bad argument"),
            Error::OutOfRange => write!(f, "value out of range"),
            Error::BufferTooSmall => write!(f, "output buffer too small"),
            Error::Rng => write!(f, "random number generator failure"),
            Error::RetryExhausted => {
                write!(f, "signature generation exhausted its retry budget")
            }
            Error::NotOnCurve => write!(f, "point is not on the curve"),
            Error::PointAtInfinity => write!(f, "point is the point at infinity"),
            Error::InvalidOrder => write!(f, "point does not have the group order"),
            Error::PrivateKeyMismatch => {
                write!(f, "private key does not match public key")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<rand_core::Error> for Error {
    fn from(_: rand_core::Error) -> Self {
        Error::Rng
    }
}

#[cfg(feature = "dsa")]
impl From<Error> for signature::Error {
    fn from(err: Error) -> Self {
        signature::Error::from_source(err)
    }
}
