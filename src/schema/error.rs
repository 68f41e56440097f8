//! Error types of the schema engine.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::borrow::Cow;
use crate::decode::DecodeError;
use crate::tag::Tag;
use super::kind::EncodingKind;


//------------ Error ---------------------------------------------------------

/// An error happened while decoding a value through a schema.
///
/// There are two disjoint classes of errors. Schema errors are mistakes in
/// the description of a type and happen for every input. Decode errors are
/// caused by the input data.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The schema of a type involved in decoding is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The data is not a valid encoding of the type.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Adds an outer context to a decode error.
    ///
    /// Schema errors are returned unchanged since they already name the
    /// type and member they concern.
    pub fn context(self, ctx: impl Into<Cow<'static, str>>) -> Self {
        match self {
            Error::Decode(err) => Error::Decode(err.context(ctx)),
            err => err,
        }
    }

    /// Returns whether this is a schema error.
    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    /// Returns the decode error if this is one.
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self {
            Error::Decode(err) => Some(err),
            Error::Schema(_) => None,
        }
    }
}


//------------ SchemaError ---------------------------------------------------

/// The description of a type is invalid.
///
/// The error names the type and, if applicable, the field or alternative
/// that is at fault.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid schema for {type_name}{}: {kind}", member_suffix(.member))]
pub struct SchemaError {
    type_name: &'static str,
    member: Option<&'static str>,
    kind: SchemaErrorKind,
}

impl SchemaError {
    pub(crate) fn new(
        type_name: &'static str,
        member: Option<&'static str>,
        kind: SchemaErrorKind
    ) -> Self {
        SchemaError { type_name, member, kind }
    }

    /// Returns the name of the type whose schema is invalid.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the name of the field or alternative at fault.
    pub fn member(&self) -> Option<&'static str> {
        self.member
    }

    /// Returns what exactly is wrong.
    pub fn kind(&self) -> &SchemaErrorKind {
        &self.kind
    }
}

fn member_suffix(member: &Option<&'static str>) -> String {
    match member {
        Some(member) => format!(".{}", member),
        None => String::new(),
    }
}


//------------ SchemaErrorKind -----------------------------------------------

/// What is wrong with a schema.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SchemaErrorKind {
    #[error("{0} matches more than one encoding kind, annotate the kind")]
    AmbiguousFieldType(&'static str),

    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    #[error("{kind} cannot be decoded into {target}")]
    KindMismatch {
        kind: EncodingKind,
        target: &'static str,
    },

    #[error("OPTIONAL on a type that cannot express absence")]
    OptionalNotNullable,

    #[error("field is both OPTIONAL and DEFAULT")]
    OptionalWithDefault,

    #[error("DEFAULT on a CHOICE alternative")]
    DefaultInChoice,

    #[error("OPTIONAL on a CHOICE alternative")]
    OptionalInChoice,

    #[error("tag {tag} already used by alternative '{existing}'")]
    ConflictingChoiceTags {
        tag: Tag,
        existing: &'static str,
    },

    #[error("tag {tag} already used by field '{existing}'")]
    DuplicateFieldTag {
        tag: Tag,
        existing: &'static str,
    },

    #[error("CHOICE {0} contains itself")]
    ChoiceCycle(&'static str),

    #[error("collections of collections are not supported")]
    NestedCollection,

    #[error("a CHOICE can only be tagged explicitly")]
    ImplicitTagOnChoice,

    #[error("untagged ANY alternative in a CHOICE")]
    UntaggedAnyInChoice,

    #[error("invalid DEFAULT value: {0}")]
    InvalidDefault(String),

    #[error("DEFAULT value out of range: {0}")]
    DefaultOutOfRange(String),

    #[error("invalid range {min}..={max}")]
    InvalidRange {
        min: i128,
        max: i128,
    },

    #[error("two-digit year maximum {0} is less than 99")]
    InvalidTwoDigitYearMax(u16),
}


//============ Tests =========================================================
