//! Decoding primitive values.
//!
//! This is a private module. The relevant items are re-exported by the
//! parent.

use bytes::Bytes;
use crate::mode::Mode;
use crate::tag::Tag;
use super::error::{ContentError, DecodeError};
use super::source::Pos;


//------------ Primitive -----------------------------------------------------

/// The content of a primitive value.
///
/// A primitive is produced by [`Source::take_primitive`] and holds the
/// complete content octets of the value. The octets share the buffer of
/// the source, so turning a primitive into bytes doesn’t copy.
///
/// The primitive remembers the encoding rules of its source. This can be
/// used when certain types have different requirements for the different
/// modes.
///
/// [`Source::take_primitive`]: super::Source::take_primitive
#[derive(Clone, Debug)]
pub struct Primitive {
    /// The tag of the value.
    tag: Tag,

    /// The content octets.
    content: Bytes,

    /// The position of the first content octet.
    ///
    /// This is only used for the ability to produce errors at that position.
    start: Pos,

    /// The encoding rules of the source.
    mode: Mode,
}

impl Primitive {
    /// Creates a new primitive.
    pub(super) fn new(tag: Tag, content: Bytes, start: Pos, mode: Mode) -> Self {
        Primitive { tag, content, start, mode }
    }

    /// Returns the tag of the value.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns the encoding rules.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the position of the start of the content.
    pub fn start(&self) -> Pos {
        self.start
    }

    /// Returns the content octets.
    pub fn as_slice(&self) -> &[u8] {
        self.content.as_ref()
    }

    /// Converts the primitive into its content octets.
    pub fn into_bytes(self) -> Bytes {
        self.content
    }

    /// Returns a content error at the start of the value.
    pub fn content_err(&self, err: impl Into<ContentError>) -> DecodeError {
        DecodeError::content(err, self.start)
    }
}

/// # Decoding basic types
///
impl Primitive {
    /// Converts the content into a BOOLEAN value.
    ///
    /// The content must be exactly one octet. In CER and DER mode, true
    /// must be encoded as `0xFF`.
    pub fn to_bool(&self) -> Result<bool, DecodeError> {
        let &[res] = self.as_slice() else {
            return Err(self.content_err("invalid boolean"))
        };
        if self.mode.is_restricted() && res != 0 && res != 0xFF {
            return Err(self.content_err("invalid boolean"))
        }
        Ok(res != 0)
    }

    /// Checks that the content is that of a NULL value.
    pub fn to_null(&self) -> Result<(), DecodeError> {
        if self.as_slice().is_empty() {
            Ok(())
        }
        else {
            Err(self.content_err("invalid NULL value"))
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn prim(content: &'static [u8], mode: Mode) -> Primitive {
        Primitive::new(
            Tag::BOOLEAN, Bytes::from_static(content), Pos::from(0), mode
        )
    }

    #[test]
    fn bool_values() {
        assert!(!prim(b"\x00", Mode::Der).to_bool().unwrap());
        assert!(prim(b"\xFF", Mode::Der).to_bool().unwrap());
        assert!(prim(b"\x01", Mode::Ber).to_bool().unwrap());
        assert!(prim(b"\x01", Mode::Der).to_bool().is_err());
        assert!(prim(b"\x01", Mode::Cer).to_bool().is_err());
        assert!(prim(b"", Mode::Ber).to_bool().is_err());
        assert!(prim(b"\x00\x00", Mode::Ber).to_bool().is_err());
    }

    #[test]
    fn null_values() {
        assert!(prim(b"", Mode::Der).to_null().is_ok());
        assert!(prim(b"\x00", Mode::Ber).to_null().is_err());
    }
}
