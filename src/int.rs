//! BER encoded integers.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use bytes::Bytes;
use crate::decode::{ContentError, DecodeError, Primitive};


//------------ Macros for built-in integers ----------------------------------

macro_rules! signed_impl {
    ( $slice:ident, $type:ident) => {{
        const LEN: usize = $type::BITS as usize / 8;
        if $slice.len() > LEN {
            return None
        }
        // Sign-extend the first octet, then shift the remaining ones in.
        let (&first, rest) = $slice.split_first()?;
        let mut res = $type::from(first as i8);
        for &octet in rest {
            res = (res << 8) | $type::from(octet);
        }
        Some(res)
    }}
}

macro_rules! unsigned_impl {
    ( $slice:ident, $type:ident) => {{
        const LEN: usize = $type::BITS as usize / 8;
        if $slice.first()? & 0x80 != 0 {
            return None
        }
        // A leading zero octet only serves to keep the sign bit clear.
        let slice = match $slice.split_first() {
            Some((0, rest)) if !rest.is_empty() => rest,
            _ => $slice,
        };
        if slice.len() > LEN {
            return None
        }
        let mut res: $type = 0;
        for &octet in slice {
            res = (res << 8) | $type::from(octet);
        }
        Some(res)
    }}
}


//------------ Integer -------------------------------------------------------

/// A BER encoded integer.
///
/// As integers are variable length in BER, this type is just a simple wrapper
/// atop the underlying `Bytes` value containing the raw content. A value of
/// this type is a signed integer. If a value is defined as an unsigned
/// integer, i.e., as `INTEGER (0..MAX)`, you can check for that using
/// [`is_negative`][Self::is_negative].
///
/// Conversion into Rust’s built-in integer types is available through the
/// `to_*` methods which return `None` if the value doesn’t fit.
///
/// # BER Encoding
///
/// In BER, an INTEGER is encoded as a primitive value with the content octets
/// providing a variable-length, big-endian, two‘s complement byte sequence of
/// that integer. Thus, the most-significant bit of the first octet serves as
/// the sign bit.
///
/// The encoding must use the smallest possible number of octets. This is
/// required for all encoding rules and allows comparing values by comparing
/// their content octets.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Integer(Bytes);

impl Integer {
    /// Creates an integer from the content of a primitive value.
    pub fn from_primitive(prim: Primitive) -> Result<Self, DecodeError> {
        match Self::check_head(prim.as_slice()) {
            Ok(()) => Ok(Integer(prim.into_bytes())),
            Err(err) => Err(prim.content_err(err)),
        }
    }

    /// Creates an integer from its content octets.
    pub fn from_bytes(bytes: Bytes) -> Result<Self, ContentError> {
        Self::check_head(bytes.as_ref())?;
        Ok(Integer(bytes))
    }

    /// Checks that an integer is started correctly.
    ///
    /// Specifically, checks that there is at least one octet and that the
    /// first nine bits of a multi-octet integer are not all the same.
    ///
    /// The latter ensures that an integer is encoded in the smallest possible
    /// number of octets. If we insist on this rule, we can use the content
    /// octets as the value for large integers and use simply compare slices
    /// for comparision.
    fn check_head(slice: &[u8]) -> Result<(), ContentError> {
        match (slice.first(), slice.get(1).map(|x| x & 0x80 != 0)) {
            (None, _) => {
                Err(ContentError::from_static("invalid integer"))
            }
            (Some(0), Some(false)) | (Some(0xFF), Some(true)) => {
                Err(ContentError::from_static("invalid integer"))
            }
            _ => Ok(())
        }
    }

    /// Returns the content octets.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Converts the integer into its content octets.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Returns whether the integer is less than zero.
    pub fn is_negative(&self) -> bool {
        self.0.first().map(|x| x & 0x80 != 0).unwrap_or(false)
    }

    /// Returns whether the integer lies within the given range.
    ///
    /// Both ends of the range are inclusive.
    pub fn is_in_range(&self, min: i128, max: i128) -> bool {
        match self.to_i128() {
            Some(value) => min <= value && value <= max,
            None => false,
        }
    }
}

/// # Conversion into built-in types
///
impl Integer {
    pub fn to_i8(&self) -> Option<i8> {
        match *self.as_slice() {
            [x] => Some(x as i8),
            _ => None
        }
    }

    pub fn to_i16(&self) -> Option<i16> {
        let slice = self.as_slice();
        signed_impl!(slice, i16)
    }

    pub fn to_i32(&self) -> Option<i32> {
        let slice = self.as_slice();
        signed_impl!(slice, i32)
    }

    pub fn to_i64(&self) -> Option<i64> {
        let slice = self.as_slice();
        signed_impl!(slice, i64)
    }

    pub fn to_i128(&self) -> Option<i128> {
        let slice = self.as_slice();
        signed_impl!(slice, i128)
    }

    pub fn to_u8(&self) -> Option<u8> {
        match *self.as_slice() {
            [x] if x & 0x80 == 0 => Some(x),
            [0, x] if x & 0x80 != 0 => Some(x),
            _ => None
        }
    }

    pub fn to_u16(&self) -> Option<u16> {
        let slice = self.as_slice();
        unsigned_impl!(slice, u16)
    }

    pub fn to_u32(&self) -> Option<u32> {
        let slice = self.as_slice();
        unsigned_impl!(slice, u32)
    }

    pub fn to_u64(&self) -> Option<u64> {
        let slice = self.as_slice();
        unsigned_impl!(slice, u64)
    }

    pub fn to_u128(&self) -> Option<u128> {
        let slice = self.as_slice();
        unsigned_impl!(slice, u128)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(value) = self.to_i128() {
            return value.fmt(f)
        }
        if let Some(value) = self.to_u128() {
            return value.fmt(f)
        }
        f.write_str("0x")?;
        for octet in self.as_slice() {
            write!(f, "{:02X}", octet)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Integer({})", self)
    }
}


//============ Tests =========================================================
