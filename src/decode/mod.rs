//! Reading encoded data.
//!
//! The [`Source`] type is a reader over a buffer of BER, CER, or DER encoded
//! data. It parses the identifier and length octets of values, hands out
//! the content of primitive values as [`Primitive`]s, and lets you enter
//! constructed values, producing a new source for their content. Whether
//! definite or indefinite length forms are acceptable is determined by the
//! [`Mode`][crate::Mode] of the source.
//!
//! Errors are reported as [`DecodeError`]s which carry the position in the
//! data and a chain of context. Code interpreting the content of a value
//! can produce a [`ContentError`] which is turned into a decode error once
//! a position is attached.

pub use self::error::{ContentError, DecodeError};
pub use self::primitive::Primitive;
pub use self::source::{Header, Limits, Pos, Source};

mod error;
mod primitive;
mod source;
mod test;
