//! The encoding kinds.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use crate::string::StringKind;
use crate::tag::Tag;
use crate::time::DEFAULT_TWO_DIGIT_YEAR_MAX;


//------------ EncodingKind --------------------------------------------------

/// The ASN.1 type a field is encoded as.
///
/// Exactly one kind applies to every field. It is either derived from the
/// field’s Rust type or given explicitly through an annotation. Some kinds
/// carry parameters that only make sense for them.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EncodingKind {
    /// BOOLEAN.
    Boolean,

    /// INTEGER.
    Integer,

    /// ENUMERATED.
    Enumerated,

    /// BIT STRING.
    BitString,

    /// OCTET STRING.
    OctetString,

    /// OBJECT IDENTIFIER.
    ObjectIdentifier,

    /// One of the restricted character strings.
    String(StringKind),

    /// GeneralString with its content checked against a character set.
    GeneralString(StringKind),

    /// UTCTime.
    ///
    /// Two-digit years are mapped into the century ending with
    /// `two_digit_year_max`.
    UtcTime {
        two_digit_year_max: u16,
    },

    /// GeneralizedTime.
    GeneralizedTime {
        disallow_fractions: bool,
    },

    /// SEQUENCE.
    Sequence,

    /// SEQUENCE OF.
    SequenceOf,

    /// SET OF.
    SetOf,

    /// ANY, i.e., a complete encoded value taken as is.
    Any,

    /// CHOICE.
    Choice,
}

impl EncodingKind {
    /// UTCTime with the default two-digit-year mapping.
    pub const fn utc_time() -> Self {
        EncodingKind::UtcTime {
            two_digit_year_max: DEFAULT_TWO_DIGIT_YEAR_MAX
        }
    }

    /// GeneralizedTime allowing fractional seconds.
    pub const fn generalized_time() -> Self {
        EncodingKind::GeneralizedTime { disallow_fractions: false }
    }

    /// Returns the universal tag of the kind.
    ///
    /// Returns `None` for ANY and CHOICE which don’t have a tag of their
    /// own.
    pub fn universal_tag(self) -> Option<Tag> {
        match self {
            EncodingKind::Boolean => Some(Tag::BOOLEAN),
            EncodingKind::Integer => Some(Tag::INTEGER),
            EncodingKind::Enumerated => Some(Tag::ENUMERATED),
            EncodingKind::BitString => Some(Tag::BIT_STRING),
            EncodingKind::OctetString => Some(Tag::OCTET_STRING),
            EncodingKind::ObjectIdentifier => Some(Tag::OID),
            EncodingKind::String(kind) => Some(kind.tag()),
            EncodingKind::GeneralString(_) => Some(Tag::GENERAL_STRING),
            EncodingKind::UtcTime { .. } => Some(Tag::UTC_TIME),
            EncodingKind::GeneralizedTime { .. } => {
                Some(Tag::GENERALIZED_TIME)
            }
            EncodingKind::Sequence => Some(Tag::SEQUENCE),
            EncodingKind::SequenceOf => Some(Tag::SEQUENCE),
            EncodingKind::SetOf => Some(Tag::SET),
            EncodingKind::Any | EncodingKind::Choice => None,
        }
    }

    /// Returns whether values of this kind contain no other schema types.
    ///
    /// Decoding a leaf kind never needs the registry, so DEFAULT values of
    /// leaf kinds can be checked as soon as the schema is built.
    pub fn is_leaf(self) -> bool {
        !matches!(
            self,
            EncodingKind::Sequence | EncodingKind::SequenceOf
            | EncodingKind::SetOf | EncodingKind::Choice
        )
    }

    /// Returns the ASN.1 name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            EncodingKind::Boolean => "BOOLEAN",
            EncodingKind::Integer => "INTEGER",
            EncodingKind::Enumerated => "ENUMERATED",
            EncodingKind::BitString => "BIT STRING",
            EncodingKind::OctetString => "OCTET STRING",
            EncodingKind::ObjectIdentifier => "OBJECT IDENTIFIER",
            EncodingKind::String(kind) => kind.name(),
            EncodingKind::GeneralString(_) => "GeneralString",
            EncodingKind::UtcTime { .. } => "UTCTime",
            EncodingKind::GeneralizedTime { .. } => "GeneralizedTime",
            EncodingKind::Sequence => "SEQUENCE",
            EncodingKind::SequenceOf => "SEQUENCE OF",
            EncodingKind::SetOf => "SET OF",
            EncodingKind::Any => "ANY",
            EncodingKind::Choice => "CHOICE",
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodingKind::GeneralString(charset) => {
                write!(f, "GeneralString ({})", charset)
            }
            kind => f.write_str(kind.name())
        }
    }
}
