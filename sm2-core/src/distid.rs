//! Distinguishing identifier support.

use crate::{
    AffinePoint, Error, Hash, Result,
    arithmetic::{EQUATION_A, EQUATION_B, GENERATOR},
};
use sm3::{Digest, Sm3};

/// Type which represents distinguishing identifiers.
pub(crate) type DistId = str;

/// Compute user information hash `Z` according to [draft-shen-sm2-ecdsa § 5.1.4.4].
///
/// ```text
/// ZA=H256(ENTLA || IDA || a || b || xG || yG || xA || yA)
/// ```
///
/// `ENTLA` is the identifier length in bits as a 16-bit integer, so
/// identifiers longer than 8191 bytes are rejected.
///
/// [draft-shen-sm2-ecdsa § 5.1.4.4]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#section-5.1.4.4
pub(crate) fn hash_z(distid: &DistId, public_key: &AffinePoint) -> Result<Hash> {
    let entla: u16 = distid
        .len()
        .checked_mul(8)
        .and_then(|l| l.try_into().ok())
        .ok_or(Error::BadArgument)?;

    if bool::from(public_key.is_identity()) {
        return Err(Error::PointAtInfinity);
    }

    let mut sm3 = Sm3::new();
    sm3.update(entla.to_be_bytes());
    sm3.update(distid);
    sm3.update(EQUATION_A.to_bytes());
    sm3.update(EQUATION_B.to_bytes());
    sm3.update(GENERATOR.0.to_bytes());
    sm3.update(GENERATOR.1.to_bytes());
    sm3.update(public_key.x());
    sm3.update(public_key.y());
    Ok(sm3.finalize())
}
