//! Rust types as decoding targets.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use crate::decode::{ContentError, Source};
use crate::int::Integer;
use crate::oid::Oid;
use crate::string::BitString;
use crate::tag::Tag;
use super::choice::{self, ErasedChoice};
use super::declare::{ChoiceType, SequenceType};
use super::error::{Error, SchemaError};
use super::kind::EncodingKind;
use super::registry::Registry;
use super::structure;
use super::value::Value;


//------------ Asn1Type ------------------------------------------------------

/// A Rust type that values can be decoded into.
///
/// The trait describes the shape of the type through [`target`] and builds
/// a value of the type from what the decoder produced via [`from_value`].
///
/// The trait is implemented for the built-in types that have a natural
/// ASN.1 representation. For types implementing [`SequenceType`] or
/// [`ChoiceType`], use the [`impl_sequence!`] and [`impl_choice!`] macros.
/// Integer-valued enums implement it by hand using
/// [`Target::enumerated`].
///
/// [`target`]: Self::target
/// [`from_value`]: Self::from_value
/// [`impl_sequence!`]: crate::impl_sequence
/// [`impl_choice!`]: crate::impl_choice
pub trait Asn1Type: Sized + Send + 'static {
    /// Returns the description of the type.
    fn target() -> Target;

    /// Converts a decoded value into a value of the type.
    fn from_value(value: Value) -> Result<Self, ContentError>;
}


//------------ Target --------------------------------------------------------

/// The description of a Rust type as seen by the schema engine.
#[derive(Clone, Debug)]
pub struct Target {
    /// How the type represents values.
    pub(crate) repr: Repr,

    /// Whether the type can express an absent value.
    pub(crate) nullable: bool,

    /// A range constraint that applies wherever the type is used.
    pub(crate) range: Option<(i128, i128)>,

    /// The name of the type for error messages.
    pub(crate) name: &'static str,
}

impl Target {
    pub fn new(repr: Repr, name: &'static str) -> Self {
        Target { repr, nullable: false, range: None, name }
    }

    /// A SEQUENCE type.
    pub fn sequence<S: SequenceType>() -> Self {
        Target::new(Repr::Structure(StructureRef::of::<S>()), S::NAME)
    }

    /// A CHOICE type.
    pub fn choice<C: ChoiceType>() -> Self {
        Target::new(Repr::Choice(ChoiceRef::of::<C>()), C::NAME)
    }

    /// An enum whose variants are identified by integer values.
    pub fn enumerated(name: &'static str) -> Self {
        Target::new(Repr::Enum, name)
    }

    /// A set of flags decoded from a named bit list.
    ///
    /// The type receives a [`Value::Flags`] with bit _n_ of the BIT STRING
    /// as its _n_th least significant bit.
    pub fn flags(name: &'static str) -> Self {
        Target::new(Repr::Flags, name)
    }

    /// A type that can express absence.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// A type whose integer value is limited to `min..=max`.
    pub fn with_range(mut self, min: i128, max: i128) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn repr(&self) -> &Repr {
        &self.repr
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the encoding kind used when none is annotated.
    ///
    /// Types that can represent several kinds equally well return `None`
    /// and need an explicit kind.
    pub(crate) fn default_kind(&self) -> Option<EncodingKind> {
        match self.repr {
            Repr::Bool => Some(EncodingKind::Boolean),
            Repr::Int(_) | Repr::BigInt => Some(EncodingKind::Integer),
            Repr::Enum => Some(EncodingKind::Enumerated),
            Repr::Bits | Repr::Flags => Some(EncodingKind::BitString),
            Repr::Oid => Some(EncodingKind::ObjectIdentifier),
            Repr::Structure(_) => Some(EncodingKind::Sequence),
            Repr::Choice(_) => Some(EncodingKind::Choice),
            Repr::Collection(_) => Some(EncodingKind::SequenceOf),
            Repr::Bytes | Repr::Text | Repr::Time => None,
        }
    }

    /// Returns whether values of the kind can be decoded into the type.
    pub(crate) fn admits(&self, kind: EncodingKind) -> bool {
        use EncodingKind as K;

        match self.repr {
            Repr::Bool => matches!(kind, K::Boolean),
            Repr::Int(_) | Repr::BigInt | Repr::Enum => {
                matches!(kind, K::Integer | K::Enumerated)
            }
            Repr::Bytes => {
                matches!(
                    kind,
                    K::Integer | K::BitString | K::OctetString | K::Any
                )
            }
            Repr::Bits | Repr::Flags => matches!(kind, K::BitString),
            Repr::Oid => matches!(kind, K::ObjectIdentifier),
            Repr::Text => {
                matches!(
                    kind,
                    K::String(_) | K::GeneralString(_) | K::ObjectIdentifier
                )
            }
            Repr::Time => {
                matches!(kind, K::UtcTime { .. } | K::GeneralizedTime { .. })
            }
            Repr::Structure(_) => matches!(kind, K::Sequence),
            Repr::Choice(_) => matches!(kind, K::Choice),
            Repr::Collection(_) => matches!(kind, K::SequenceOf | K::SetOf),
        }
    }
}


//------------ Repr ----------------------------------------------------------

/// How a Rust type represents values.
#[derive(Clone, Debug)]
pub enum Repr {
    Bool,

    /// A built-in integer of the given width.
    Int(IntWidth),

    /// An arbitrary-size integer.
    BigInt,

    /// An enum identified by integer values.
    Enum,

    /// Raw octets.
    Bytes,

    /// A bit string with its unused bits.
    Bits,

    /// A set of flags encoded as a named bit list.
    Flags,

    Oid,
    Text,
    Time,

    /// A type implementing [`SequenceType`].
    Structure(StructureRef),

    /// A type implementing [`ChoiceType`].
    Choice(ChoiceRef),

    /// A list of elements.
    Collection(Box<Target>),
}


//------------ IntWidth ------------------------------------------------------

/// The built-in integer types.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IntWidth {
    I8, I16, I32, I64, I128,
    U8, U16, U32, U64, U128,
}

impl IntWidth {
    /// Returns whether the integer fits into the type.
    pub fn fits(self, int: &Integer) -> bool {
        match self {
            IntWidth::I8 => int.to_i8().is_some(),
            IntWidth::I16 => int.to_i16().is_some(),
            IntWidth::I32 => int.to_i32().is_some(),
            IntWidth::I64 => int.to_i64().is_some(),
            IntWidth::I128 => int.to_i128().is_some(),
            IntWidth::U8 => int.to_u8().is_some(),
            IntWidth::U16 => int.to_u16().is_some(),
            IntWidth::U32 => int.to_u32().is_some(),
            IntWidth::U64 => int.to_u64().is_some(),
            IntWidth::U128 => int.to_u128().is_some(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
            IntWidth::I128 => "i128",
            IntWidth::U8 => "u8",
            IntWidth::U16 => "u16",
            IntWidth::U32 => "u32",
            IntWidth::U64 => "u64",
            IntWidth::U128 => "u128",
        }
    }
}


//------------ StructureRef --------------------------------------------------

/// The decoder function of a SEQUENCE type.
///
/// The optional tag replaces the outer tag of the type if it is implicitly
/// tagged.
pub(crate) type DecodeFn = fn(
    &Registry, &mut Source, Option<Tag>
) -> Result<Value, Error>;

/// The function preparing all decoders reachable from a type.
pub(crate) type PrepareFn = fn(
    &Registry, &mut HashSet<TypeId>
) -> Result<(), SchemaError>;

/// A reference to a SEQUENCE type.
///
/// This only carries function pointers. The actual decoder of the type is
/// built by the registry when first needed, which allows types to refer to
/// themselves.
#[derive(Clone, Copy)]
pub struct StructureRef {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) tag: Option<Tag>,
    pub(crate) decode: DecodeFn,
    pub(crate) prepare: PrepareFn,
}

impl StructureRef {
    pub fn of<S: SequenceType>() -> Self {
        StructureRef {
            id: TypeId::of::<S>(),
            name: S::NAME,
            tag: S::TAG,
            decode: structure::decode_value::<S>,
            prepare: structure::prepare::<S>,
        }
    }

    /// Returns the tag of an untagged value of the type.
    pub(crate) fn natural_tag(&self) -> Tag {
        self.tag.unwrap_or(Tag::SEQUENCE)
    }
}

impl fmt::Debug for StructureRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StructureRef({})", self.name)
    }
}


//------------ ChoiceRef -----------------------------------------------------

/// A reference to a CHOICE type.
#[derive(Clone, Copy)]
pub struct ChoiceRef {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) describe: fn() -> ErasedChoice,
}

impl ChoiceRef {
    pub fn of<C: ChoiceType>() -> Self {
        ChoiceRef {
            id: TypeId::of::<C>(),
            name: C::NAME,
            describe: choice::describe::<C>,
        }
    }
}

impl fmt::Debug for ChoiceRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ChoiceRef({})", self.name)
    }
}


//------------ Implementations for built-in types ----------------------------

impl Asn1Type for bool {
    fn target() -> Target {
        Target::new(Repr::Bool, "bool")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_bool()
    }
}

macro_rules! int_impl {
    ( $type:ident, $width:ident, $to:ident ) => {
        impl Asn1Type for $type {
            fn target() -> Target {
                Target::new(
                    Repr::Int(IntWidth::$width), stringify!($type)
                )
            }

            fn from_value(value: Value) -> Result<Self, ContentError> {
                value.into_integer()?.$to().ok_or(
                    ContentError::from_static(concat!(
                        "integer out of range for ", stringify!($type)
                    ))
                )
            }
        }
    }
}

int_impl!(i8, I8, to_i8);
int_impl!(i16, I16, to_i16);
int_impl!(i32, I32, to_i32);
int_impl!(i64, I64, to_i64);
int_impl!(i128, I128, to_i128);
int_impl!(u8, U8, to_u8);
int_impl!(u16, U16, to_u16);
int_impl!(u32, U32, to_u32);
int_impl!(u64, U64, to_u64);
int_impl!(u128, U128, to_u128);

impl Asn1Type for Integer {
    fn target() -> Target {
        Target::new(Repr::BigInt, "Integer")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_integer()
    }
}

impl Asn1Type for Bytes {
    fn target() -> Target {
        Target::new(Repr::Bytes, "Bytes")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_bytes()
    }
}

impl Asn1Type for BitString {
    fn target() -> Target {
        Target::new(Repr::Bits, "BitString")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_bit_string()
    }
}

impl Asn1Type for Oid {
    fn target() -> Target {
        Target::new(Repr::Oid, "Oid")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_oid()
    }
}

impl Asn1Type for String {
    fn target() -> Target {
        Target::new(Repr::Text, "String")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_text()
    }
}

impl Asn1Type for DateTime<Utc> {
    fn target() -> Target {
        Target::new(Repr::Time, "DateTime<Utc>")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_time()
    }
}

impl<T: Asn1Type> Asn1Type for Vec<T> {
    fn target() -> Target {
        Target::new(Repr::Collection(Box::new(T::target())), "Vec")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        value.into_collection()?.into_iter().map(T::from_value).collect()
    }
}

impl<T: Asn1Type> Asn1Type for Option<T> {
    fn target() -> Target {
        T::target().nullable()
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        if value.is_absent() {
            Ok(None)
        }
        else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: Asn1Type> Asn1Type for Box<T> {
    fn target() -> Target {
        T::target()
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        T::from_value(value).map(Box::new)
    }
}


//------------ Macros --------------------------------------------------------

/// Implements [`Asn1Type`] for a type implementing [`SequenceType`].
///
/// [`Asn1Type`]: crate::schema::Asn1Type
/// [`SequenceType`]: crate::schema::SequenceType
#[macro_export]
macro_rules! impl_sequence {
    ( $type:ty ) => {
        impl $crate::schema::Asn1Type for $type {
            fn target() -> $crate::schema::Target {
                $crate::schema::Target::sequence::<Self>()
            }

            fn from_value(
                value: $crate::schema::Value
            ) -> Result<Self, $crate::decode::ContentError> {
                value.into_object()
            }
        }
    }
}

/// Implements [`Asn1Type`] for a type implementing [`ChoiceType`].
///
/// [`Asn1Type`]: crate::schema::Asn1Type
/// [`ChoiceType`]: crate::schema::ChoiceType
#[macro_export]
macro_rules! impl_choice {
    ( $type:ty ) => {
        impl $crate::schema::Asn1Type for $type {
            fn target() -> $crate::schema::Target {
                $crate::schema::Target::choice::<Self>()
            }

            fn from_value(
                value: $crate::schema::Value
            ) -> Result<Self, $crate::decode::ContentError> {
                value.into_object()
            }
        }
    }
}


//============ Tests =========================================================
