//! Declaring the schema of SEQUENCE and CHOICE types.
//!
//! This is a private module. Its public items are re-exported by the parent.

use bytes::Bytes;
use crate::decode::ContentError;
use crate::tag::Tag;
use super::kind::EncodingKind;
use super::types::{Asn1Type, Target};
use super::value::Value;


//------------ SequenceType --------------------------------------------------

/// A Rust type decoded from a SEQUENCE.
///
/// The type describes its fields through a [`SequenceSchema`]. The schema
/// is only evaluated once per [`Registry`], the resulting decoder is cached.
///
/// If the type has an outer tag of its own, it is given through `TAG`. An
/// application or private tag wraps the SEQUENCE in the encoding, i.e., it
/// is treated as an explicit tag.
///
/// [`Registry`]: super::Registry
pub trait SequenceType: Send + Sized + 'static {
    /// The ASN.1 name of the type.
    const NAME: &'static str;

    /// The outer tag of the type if it isn’t SEQUENCE.
    const TAG: Option<Tag> = None;

    /// Returns the description of the fields.
    fn schema() -> SequenceSchema<Self>;
}


//------------ ChoiceType ----------------------------------------------------

/// A Rust type decoded from a CHOICE.
pub trait ChoiceType: Send + Sized + 'static {
    /// The ASN.1 name of the type.
    const NAME: &'static str;

    /// Returns the description of the alternatives.
    fn schema() -> ChoiceSchema<Self>;
}


//------------ Annotations ---------------------------------------------------

/// The annotations attached to a field or alternative.
#[derive(Clone, Debug, Default)]
pub struct Annotations {
    /// The encoding kind if not derived from the type.
    pub(crate) kind: Option<EncodingKind>,

    /// A tag replacing or wrapping the natural tag.
    pub(crate) tag: Option<Tag>,

    /// Whether the tag wraps the value.
    pub(crate) explicit: bool,

    pub(crate) optional: bool,

    /// The encoding of the default value.
    pub(crate) default: Option<Bytes>,

    /// The encoding kind of the elements of a collection.
    pub(crate) elements: Option<EncodingKind>,

    /// A range constraint on an integer value.
    pub(crate) range: Option<(i128, i128)>,
}


//------------ Annotate ------------------------------------------------------

/// Adds annotations to a field or alternative.
///
/// All methods consume and return the value so they can be chained.
pub trait Annotate: Sized {
    /// Provides access to the annotations.
    fn annotations_mut(&mut self) -> &mut Annotations;

    /// Sets the encoding kind.
    fn kind(mut self, kind: EncodingKind) -> Self {
        self.annotations_mut().kind = Some(kind);
        self
    }

    /// Sets an implicit tag.
    fn implicit(mut self, tag: Tag) -> Self {
        let ann = self.annotations_mut();
        ann.tag = Some(tag);
        ann.explicit = false;
        self
    }

    /// Sets an explicit tag.
    fn explicit(mut self, tag: Tag) -> Self {
        let ann = self.annotations_mut();
        ann.tag = Some(tag);
        ann.explicit = true;
        self
    }

    /// Marks the field as OPTIONAL.
    fn optional(mut self) -> Self {
        self.annotations_mut().optional = true;
        self
    }

    /// Sets the DER encoding of a DEFAULT value.
    ///
    /// The encoding is that of the untagged value.
    fn default_value(mut self, encoded: &'static [u8]) -> Self {
        self.annotations_mut().default = Some(Bytes::from_static(encoded));
        self
    }

    /// Sets the encoding kind of the elements of a collection.
    fn elements(mut self, kind: EncodingKind) -> Self {
        self.annotations_mut().elements = Some(kind);
        self
    }

    /// Limits an integer value to `min..=max`.
    fn range(mut self, min: i128, max: i128) -> Self {
        self.annotations_mut().range = Some((min, max));
        self
    }
}


//------------ Field ---------------------------------------------------------

/// Stores a decoded value in its field.
pub(crate) type Setter<S> = Box<
    dyn Fn(&mut S, Value) -> Result<(), ContentError> + Send + Sync
>;

/// A field of a SEQUENCE type.
///
/// The field is created with its name and a function that stores the
/// decoded value. The type of the field is derived from that function.
pub struct Field<S> {
    pub(crate) name: &'static str,
    pub(crate) target: Target,
    pub(crate) annotations: Annotations,
    pub(crate) setter: Setter<S>,
}

impl<S: 'static> Field<S> {
    pub fn new<T: Asn1Type>(
        name: &'static str,
        set: impl Fn(&mut S, T) + Send + Sync + 'static,
    ) -> Self {
        Field {
            name,
            target: T::target(),
            annotations: Annotations::default(),
            setter: Box::new(move |res, value| {
                set(res, T::from_value(value)?);
                Ok(())
            }),
        }
    }
}

impl<S> Annotate for Field<S> {
    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}


//------------ SequenceSchema ------------------------------------------------

/// The description of a SEQUENCE type.
///
/// Decoding starts with a value created by the factory into which each
/// field is stored. Fields not listed here are not part of the schema and
/// keep the value given by the factory.
pub struct SequenceSchema<S> {
    pub(crate) factory: Box<dyn Fn() -> S + Send + Sync>,
    pub(crate) fields: Vec<Field<S>>,
}

impl<S> SequenceSchema<S> {
    pub fn new(factory: impl Fn() -> S + Send + Sync + 'static) -> Self {
        SequenceSchema { factory: Box::new(factory), fields: Vec::new() }
    }

    /// Adds the next field.
    pub fn field(mut self, field: Field<S>) -> Self {
        self.fields.push(field);
        self
    }
}

impl<S: Default + 'static> Default for SequenceSchema<S> {
    fn default() -> Self {
        SequenceSchema::new(S::default)
    }
}


//------------ Alternative ---------------------------------------------------

/// Creates the choice value from the value of an alternative.
pub(crate) type Wrap<C> = Box<
    dyn Fn(Value) -> Result<C, ContentError> + Send + Sync
>;

/// An alternative of a CHOICE type.
pub struct Alternative<C> {
    pub(crate) name: &'static str,
    pub(crate) target: Target,
    pub(crate) annotations: Annotations,
    pub(crate) wrap: Wrap<C>,
}

impl<C: 'static> Alternative<C> {
    pub fn new<T: Asn1Type>(
        name: &'static str,
        ctor: impl Fn(T) -> C + Send + Sync + 'static,
    ) -> Self {
        Alternative {
            name,
            target: T::target(),
            annotations: Annotations::default(),
            wrap: Box::new(move |value| T::from_value(value).map(&ctor)),
        }
    }
}

impl<C> Annotate for Alternative<C> {
    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}


//------------ ChoiceSchema --------------------------------------------------

/// The description of a CHOICE type.
pub struct ChoiceSchema<C> {
    pub(crate) alternatives: Vec<Alternative<C>>,
    pub(crate) null: Option<Box<dyn Fn() -> C + Send + Sync>>,
}

impl<C> ChoiceSchema<C> {
    pub fn new() -> Self {
        ChoiceSchema { alternatives: Vec::new(), null: None }
    }

    /// Adds an alternative.
    pub fn alternative(mut self, alternative: Alternative<C>) -> Self {
        self.alternatives.push(alternative);
        self
    }

    /// Accepts a NULL value in place of any alternative.
    ///
    /// When a NULL is encountered, the value is created by `factory`.
    pub fn allow_null(
        mut self, factory: impl Fn() -> C + Send + Sync + 'static
    ) -> Self {
        self.null = Some(Box::new(factory));
        self
    }
}

impl<C> Default for ChoiceSchema<C> {
    fn default() -> Self {
        Self::new()
    }
}
