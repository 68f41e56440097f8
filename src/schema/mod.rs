//! Schema-driven decoding.
//!
//! This module decodes encoded data directly into Rust types. Each type
//! describes how it is encoded: built-in types through the [`Asn1Type`]
//! trait, SEQUENCE types through [`SequenceType`], and CHOICE types through
//! [`ChoiceType`]. From these descriptions, a [`Registry`] builds decoders
//! the first time a type is used and keeps them for later.
//!
//! A SEQUENCE type lists its fields in a [`SequenceSchema`]. Each field
//! names a setter for its value and can carry annotations through the
//! [`Annotate`] trait: an explicit or implicit tag, the encoding kind if it
//! can’t be derived from the Rust type, OPTIONAL or DEFAULT, and a range
//! constraint for integers.
//!
//! ```
//! use bcschema::{Mode, Tag};
//! use bcschema::schema::{
//!     Annotate, Field, Registry, SequenceSchema, SequenceType
//! };
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     label: Option<bool>,
//! }
//!
//! impl SequenceType for Point {
//!     const NAME: &'static str = "Point";
//!
//!     fn schema() -> SequenceSchema<Self> {
//!         SequenceSchema::default()
//!             .field(Field::new("x", |s: &mut Self, v| s.x = v))
//!             .field(
//!                 Field::new("y", |s: &mut Self, v| s.y = v)
//!                     .explicit(Tag::ctx(0))
//!             )
//!             .field(
//!                 Field::new("label", |s: &mut Self, v| s.label = v)
//!                     .optional()
//!             )
//!     }
//! }
//!
//! bcschema::impl_sequence!(Point);
//!
//! let registry = Registry::new();
//! let point: Point = registry.decode(
//!     b"\x30\x08\x02\x01\x03\xa0\x03\x02\x01\x04".as_slice(), Mode::Der
//! ).unwrap();
//! assert_eq!((point.x, point.y, point.label), (3, 4, None));
//! ```
//!
//! Fields of a SEQUENCE are matched by their tag, so they can appear in
//! any order and values with unknown tags are skipped. Two fields of the
//! same type therefore need distinct tags.

pub use self::declare::{
    Alternative, Annotate, Annotations, ChoiceSchema, ChoiceType, Field,
    SequenceSchema, SequenceType,
};
pub use self::error::{Error, SchemaError, SchemaErrorKind};
pub use self::kind::EncodingKind;
pub use self::registry::{decode, Registry};
pub use self::resolve::FieldSchema;
pub use self::types::{
    Asn1Type, ChoiceRef, IntWidth, Repr, StructureRef, Target,
};
pub use self::value::Value;

mod choice;
mod collection;
mod compile;
mod declare;
mod error;
mod kind;
mod registry;
mod resolve;
mod structure;
mod types;
mod value;
