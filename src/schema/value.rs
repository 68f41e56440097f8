//! Decoded values.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::any::Any;
use std::fmt;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use crate::decode::ContentError;
use crate::int::Integer;
use crate::oid::Oid;
use crate::string::BitString;


//------------ Value ---------------------------------------------------------

/// A value produced by a decoder.
///
/// Decoders produce values of this type which are then converted into the
/// Rust type of a field via [`Asn1Type::from_value`]. Composite types are
/// kept as boxed `Any` values in the `Object` variant.
///
/// [`Asn1Type::from_value`]: super::Asn1Type::from_value
pub enum Value {
    /// An OPTIONAL field was not present.
    Absent,

    Boolean(bool),
    Integer(Integer),
    BitString(BitString),

    /// A named bit list with bit _n_ as the _n_th least significant bit.
    Flags(u64),

    Bytes(Bytes),
    Oid(Oid),
    Text(String),
    Time(DateTime<Utc>),
    Collection(Vec<Value>),

    /// A SEQUENCE or CHOICE type.
    Object(Box<dyn Any + Send>),
}

impl Value {
    /// Returns a short description of the variant for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Value::Absent => "absent value",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::BitString(_) => "bit string",
            Value::Flags(_) => "named bit list",
            Value::Bytes(_) => "octets",
            Value::Oid(_) => "object identifier",
            Value::Text(_) => "text",
            Value::Time(_) => "time",
            Value::Collection(_) => "collection",
            Value::Object(_) => "object",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ContentError {
        ContentError::from_string(
            format!("expected {}, got {}", expected, self.describe())
        )
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn into_bool(self) -> Result<bool, ContentError> {
        match self {
            Value::Boolean(value) => Ok(value),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn into_integer(self) -> Result<Integer, ContentError> {
        match self {
            Value::Integer(value) => Ok(value),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn into_bit_string(self) -> Result<BitString, ContentError> {
        match self {
            Value::BitString(value) => Ok(value),
            other => Err(other.mismatch("bit string")),
        }
    }

    pub fn into_flags(self) -> Result<u64, ContentError> {
        match self {
            Value::Flags(value) => Ok(value),
            other => Err(other.mismatch("named bit list")),
        }
    }

    pub fn into_bytes(self) -> Result<Bytes, ContentError> {
        match self {
            Value::Bytes(value) => Ok(value),
            other => Err(other.mismatch("octets")),
        }
    }

    pub fn into_oid(self) -> Result<Oid, ContentError> {
        match self {
            Value::Oid(value) => Ok(value),
            other => Err(other.mismatch("object identifier")),
        }
    }

    pub fn into_text(self) -> Result<String, ContentError> {
        match self {
            Value::Text(value) => Ok(value),
            other => Err(other.mismatch("text")),
        }
    }

    pub fn into_time(self) -> Result<DateTime<Utc>, ContentError> {
        match self {
            Value::Time(value) => Ok(value),
            other => Err(other.mismatch("time")),
        }
    }

    pub fn into_collection(self) -> Result<Vec<Value>, ContentError> {
        match self {
            Value::Collection(value) => Ok(value),
            other => Err(other.mismatch("collection")),
        }
    }

    /// Converts an object value back into its concrete type.
    pub fn into_object<T: Any>(self) -> Result<T, ContentError> {
        match self {
            Value::Object(value) => match value.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(ContentError::from_static(
                    "object of unexpected type"
                )),
            },
            other => Err(other.mismatch("object")),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Absent => f.write_str("Absent"),
            Value::Boolean(value) => write!(f, "Boolean({})", value),
            Value::Integer(value) => write!(f, "{:?}", value),
            Value::BitString(value) => write!(f, "{:?}", value),
            Value::Flags(value) => write!(f, "Flags({:#x})", value),
            Value::Bytes(value) => write!(f, "Bytes({:?})", value),
            Value::Oid(value) => write!(f, "Oid({})", value),
            Value::Text(value) => write!(f, "Text({:?})", value),
            Value::Time(value) => write!(f, "Time({})", value),
            Value::Collection(value) => {
                f.debug_tuple("Collection").field(value).finish()
            }
            Value::Object(_) => f.write_str("Object(..)"),
        }
    }
}


//============ Tests =========================================================
