//! ASN.1 DER encoding for SM2 signatures.
//!
//! ```text
//! SM2Signature ::= SEQUENCE {
//!     r INTEGER,
//!     s INTEGER
//! }
//! ```
//!
//! Decoding goes through the [`der`] crate and so rejects non-minimal
//! integers, negative integers, indefinite lengths and trailing data.

use core::{
    fmt::{self, Debug},
    ops::Range,
};
use der::{
    Decode, DecodeValue, Encode, EncodeValue, FixedTag, Header, Length, Reader, Sequence, Tag,
    Writer, asn1::UintRef,
};
use signature::{Error, Result, SignatureEncoding};

/// Size of a big-endian scalar.
const SCALAR_SIZE: usize = super::Signature::BYTE_SIZE / 2;

/// Two `INTEGER`s of up to 33 bytes each, plus the tag and length octets.
const MAX_SIZE: usize = 2 * SCALAR_SIZE + 9;

/// Byte array containing a serialized ASN.1 signature
type SignatureBytes = [u8; MAX_SIZE];

/// ASN.1 DER-encoded SM2 signature.
#[derive(Clone)]
pub struct Signature {
    /// ASN.1 DER-encoded signature data
    bytes: SignatureBytes,

    /// Range of the `r` value within the signature, without padding
    r_range: Range<usize>,

    /// Range of the `s` value within the signature, without padding
    s_range: Range<usize>,
}

#[allow(clippy::len_without_is_empty)]
impl Signature {
    /// Parse signature from DER-encoded bytes.
    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        let SignatureRef { r, s } = SignatureRef::from_der(input).map_err(|_| Error::new())?;

        if r.as_bytes().len() > SCALAR_SIZE || s.as_bytes().len() > SCALAR_SIZE {
            return Err(Error::new());
        }

        let r_range = find_scalar_range(input, r.as_bytes())?;
        let s_range = find_scalar_range(input, s.as_bytes())?;

        if s_range.end != input.len() {
            return Err(Error::new());
        }

        let mut bytes = [0u8; MAX_SIZE];
        bytes
            .get_mut(..input.len())
            .ok_or_else(Error::new)?
            .copy_from_slice(input);

        Ok(Self {
            bytes,
            r_range,
            s_range,
        })
    }

    /// Borrow this signature as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Serialize this signature as a boxed byte slice
    pub fn to_bytes(&self) -> Box<[u8]> {
        self.as_bytes().into()
    }

    /// Serialize this signature as a vector
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Get the length of the signature in bytes
    pub fn len(&self) -> usize {
        self.s_range.end
    }

    /// Get the `r` component of the signature (leading zeros removed)
    pub(crate) fn r(&self) -> &[u8] {
        &self.bytes[self.r_range.clone()]
    }

    /// Get the `s` component of the signature (leading zeros removed)
    pub(crate) fn s(&self) -> &[u8] {
        &self.bytes[self.s_range.clone()]
    }
}

/// Append `INTEGER` for the big-endian unsigned `value` at `*pos`, returning
/// the range of its minimal magnitude bytes.
#[allow(clippy::cast_possible_truncation)]
fn push_uint(bytes: &mut SignatureBytes, pos: &mut usize, value: &[u8]) -> Range<usize> {
    let first = value
        .iter()
        .position(|&byte| byte != 0)
        .unwrap_or(value.len() - 1);
    let magnitude = &value[first..];
    let pad = usize::from(magnitude[0] >= 0x80);

    bytes[*pos] = Tag::Integer.into();
    // at most 33, so the short length form applies
    bytes[*pos + 1] = (magnitude.len() + pad) as u8;
    let start = *pos + 2 + pad;
    let end = start + magnitude.len();
    bytes[start..end].copy_from_slice(magnitude);
    *pos = end;
    start..end
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sm2_core::dsa::der::Signature(")?;

        for &byte in self.as_ref() {
            write!(f, "{byte:02X}")?;
        }

        write!(f, ")")
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Signature {}

impl<'a> Decode<'a> for Signature {
    fn decode<R: Reader<'a>>(reader: &mut R) -> der::Result<Self> {
        let header = reader.peek_header()?;
        header.tag.assert_eq(Tag::Sequence)?;

        let mut buf = [0u8; MAX_SIZE];
        let len = (header.encoded_len()? + header.length)?;
        let slice = buf
            .get_mut(..usize::try_from(len)?)
            .ok_or_else(|| Tag::Sequence.length_error())?;

        reader.read_into(slice)?;
        Self::from_bytes(slice).map_err(|_| Tag::Integer.value_error())
    }
}

impl Encode for Signature {
    fn encoded_len(&self) -> der::Result<Length> {
        Length::try_from(self.len())
    }

    fn encode(&self, writer: &mut impl Writer) -> der::Result<()> {
        writer.write(self.as_bytes())
    }
}

impl FixedTag for Signature {
    const TAG: Tag = Tag::Sequence;
}

impl From<super::Signature> for Signature {
    #[allow(clippy::cast_possible_truncation)]
    fn from(sig: super::Signature) -> Signature {
        let mut bytes = [0u8; MAX_SIZE];
        let mut pos = 2;
        let r_range = push_uint(&mut bytes, &mut pos, &sig.r_bytes());
        let s_range = push_uint(&mut bytes, &mut pos, &sig.s_bytes());
        bytes[0] = Tag::Sequence.into();
        bytes[1] = (pos - 2) as u8;

        Signature {
            bytes,
            r_range,
            s_range,
        }
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = Error;

    fn try_from(input: &[u8]) -> Result<Self> {
        Self::from_bytes(input)
    }
}

impl TryFrom<Signature> for super::Signature {
    type Error = Error;

    fn try_from(sig: Signature) -> Result<super::Signature> {
        Self::try_from(&sig)
    }
}

impl TryFrom<&Signature> for super::Signature {
    type Error = Error;

    fn try_from(sig: &Signature) -> Result<super::Signature> {
        let mut bytes = [0u8; super::Signature::BYTE_SIZE];
        let r_begin = SCALAR_SIZE.saturating_sub(sig.r().len());
        let s_begin = bytes.len().saturating_sub(sig.s().len());
        bytes[r_begin..SCALAR_SIZE].copy_from_slice(sig.r());
        bytes[s_begin..].copy_from_slice(sig.s());
        super::Signature::from_bytes(&bytes)
    }
}

impl From<Signature> for Box<[u8]> {
    fn from(signature: Signature) -> Box<[u8]> {
        signature.to_bytes()
    }
}

impl SignatureEncoding for Signature {
    type Repr = Box<[u8]>;

    fn to_bytes(&self) -> Self::Repr {
        self.to_bytes()
    }

    fn encoded_len(&self) -> usize {
        self.len()
    }
}

struct SignatureRef<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

impl EncodeValue for SignatureRef<'_> {
    fn value_len(&self) -> der::Result<Length> {
        self.r.encoded_len()? + self.s.encoded_len()?
    }

    fn encode_value(&self, encoder: &mut impl Writer) -> der::Result<()> {
        self.r.encode(encoder)?;
        self.s.encode(encoder)?;
        Ok(())
    }
}

impl<'a> DecodeValue<'a> for SignatureRef<'a> {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            Ok(Self {
                r: UintRef::decode(reader)?,
                s: UintRef::decode(reader)?,
            })
        })
    }
}

impl<'a> Sequence<'a> for SignatureRef<'a> {}

/// Locate the range within a slice at which a particular subslice is located
fn find_scalar_range(outer: &[u8], inner: &[u8]) -> Result<Range<usize>> {
    let outer_start = outer.as_ptr() as usize;
    let inner_start = inner.as_ptr() as usize;
    let start = inner_start.checked_sub(outer_start).ok_or_else(Error::new)?;
    let end = start.checked_add(inner.len()).ok_or_else(Error::new)?;
    Ok(Range { start, end })
}
