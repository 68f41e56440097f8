//! Schema-driven decoding of data in Basic Encoding Rules.
//!
//! This crate decodes data encoded in the Basic Encoding Rules (BER) of
//! ASN.1 or its restricted siblings, the Canonical and Distinguished
//! Encoding Rules (CER and DER), into plain Rust types. Instead of writing
//! decoding code by hand, you describe each of your types once via a
//! schema. The schema names the fields of a type, their tags, and how they
//! are encoded. From it, a decoder is built the first time the type is
//! decoded and cached for all later uses.
//!
//! The [`schema`] module contains the schema vocabulary and the
//! [`Registry`][schema::Registry] that builds and keeps the decoders. Its
//! documentation is the best place to start.
//!
//! Underneath, the [`decode`] module provides a reader for the
//! tag-length-value structure of encoded data, and the types and functions
//! in the crate root and the [`string`] module interpret the content of
//! the individual built-in ASN.1 types.
//!
//! Finally, the [`kerberos`] module describes the KRB-ERROR message of
//! Kerberos 5 as an example of what real-world schemas look like.

pub use self::int::Integer;
pub use self::length::Length;
pub use self::mode::Mode;
pub use self::oid::Oid;
pub use self::string::BitString;
pub use self::tag::{Class, Ident, Tag};
pub use self::time::{
    parse_generalized_time, parse_utc_time, DEFAULT_TWO_DIGIT_YEAR_MAX
};

pub mod decode;
pub mod kerberos;
pub mod oid;
pub mod schema;
pub mod string;

mod int;
mod length;
mod mode;
mod tag;
mod time;
