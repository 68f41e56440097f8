//! Binary and character strings.
//!
//! There are two types of strings for binary data. OCTET STRINGs contain
//! an unrestricted sequence of octets and are decoded via [`take_octets`]
//! into a plain `Bytes` value. [`BitString`]s contain a sequence of bits
//! that does not need to be of a length divisible by eight.
//!
//! In addition, there are a number of so-called restricted character strings
//! that each contain a sequence of characters according to a pre-defined
//! character set. These are described by [`StringKind`]. They share the
//! encoding of OCTET STRING, so their content is taken via [`take_octets`]
//! and then checked and converted by the string kind.

//--- Re-exports

pub use self::bit::BitString;
pub use self::octet::take_octets;
pub use self::restricted::{CharSetError, StringKind};

//--- Private modules

mod bit;
mod octet;
mod restricted;
