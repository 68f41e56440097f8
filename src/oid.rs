//! ASN.1 Object Identifiers.
//!
//! The [`Oid`] type is also available at the crate root.

use std::fmt;
use bytes::Bytes;
use crate::decode::{ContentError, DecodeError, Primitive};


//------------ Oid -----------------------------------------------------------

/// An object identifer.
///
/// Object identifiers are globally unique, hierarchical values that are used
/// to identify objects or their type. When written, they are presented as a
/// sequence of integers separated by dots such as ‘1.3.6.1.5.5.7.1’ or with
/// the integers separated by white space and enclosed in curly braces such
/// as ‘{ 1 3 6 1 5 5 7 1 }’.
///
/// Values of this type keep a single object identifer in its BER encoding.
/// The encoding is checked when the value is created, so iterating over
/// the components never fails.
///
/// # Limitations
///
/// Components must fit into a `u64`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Oid(Bytes);

impl Oid {
    /// Creates an object identifier from the content of a primitive value.
    pub fn from_primitive(prim: Primitive) -> Result<Self, DecodeError> {
        match Self::check(prim.as_slice()) {
            Ok(()) => Ok(Oid(prim.into_bytes())),
            Err(err) => Err(prim.content_err(err)),
        }
    }

    /// Creates an object identifier from its content octets.
    pub fn from_bytes(bytes: Bytes) -> Result<Self, ContentError> {
        Self::check(bytes.as_ref())?;
        Ok(Oid(bytes))
    }

    /// Checks that the octets are a correctly encoded object identifier.
    ///
    /// There must be at least one subidentifier, each subidentifier must be
    /// encoded in the minimal number of octets, and the last octet must
    /// finish a subidentifier.
    fn check(slice: &[u8]) -> Result<(), ContentError> {
        if slice.is_empty() {
            return Err(ContentError::from_static("empty object identifier"))
        }
        let mut start = true;
        let mut head = 0u8;
        let mut len = 0;
        for &octet in slice {
            if start {
                if octet == 0x80 {
                    return Err(ContentError::from_static(
                        "invalid object identifier"
                    ))
                }
                head = octet & 0x7F;
                len = 0;
            }
            len += 1;
            // Ten septets hold 64 bits only if the first carries one bit.
            if len > 10 || (len == 10 && head > 1) {
                return Err(ContentError::from_static(
                    "object identifier component too large"
                ))
            }
            start = octet & 0x80 == 0;
        }
        if !start {
            return Err(ContentError::from_static(
                "invalid object identifier"
            ))
        }
        Ok(())
    }

    /// Returns the content octets.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns an iterator to the components of this object identifier.
    pub fn iter(&self) -> Iter {
        Iter::new(self.as_slice())
    }
}

//--- AsRef

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}


//--- Display

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for component in self.iter() {
            if first {
                write!(f, "{}", component)?;
                first = false;
            }
            else {
                write!(f, ".{}", component)?;
            }
        }
        Ok(())
    }
}


//------------ Iter ----------------------------------------------------------

/// An iterator over the components of an object identifier.
///
/// As the first two components are encoded in the first subidentifier of the
/// encoded value, the iterator returns one more item than there are
/// subidentifiers.
pub struct Iter<'a> {
    /// The remainder of the object identifier’s encoded octets.
    slice: &'a [u8],

    /// The second component if it has been split off the first.
    second: Option<u64>,

    /// Whether we have produced the first component.
    started: bool,
}

impl<'a> Iter<'a> {
    /// Creates a new iterator.
    fn new(slice: &'a [u8]) -> Self {
        Iter { slice, second: None, started: false }
    }

    /// Takes the next subidentifier from the slice.
    fn next_subid(&mut self) -> Option<u64> {
        let mut res = 0u64;
        while let Some((&octet, tail)) = self.slice.split_first() {
            self.slice = tail;
            res = (res << 7) | u64::from(octet & 0x7F);
            if octet & 0x80 == 0 {
                return Some(res)
            }
        }
        None
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(second) = self.second.take() {
            return Some(second)
        }
        let subid = self.next_subid()?;
        if self.started {
            return Some(subid)
        }
        self.started = true;
        let (first, second) = match subid {
            0..=39 => (0, subid),
            40..=79 => (1, subid - 40),
            _ => (2, subid - 80),
        };
        self.second = Some(second);
        Some(first)
    }
}


//============ Tests =========================================================
