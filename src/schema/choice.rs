//! Decoding CHOICE types.
//!
//! This is a private module.
//!
//! A CHOICE is decoded by looking at the tag of the next value. Untagged
//! alternatives that are CHOICEs themselves are flattened into their
//! parent, so a single lookup finds the innermost alternative. Its value
//! is then wrapped back up through each enclosing CHOICE.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use smallvec::SmallVec;
use tracing::debug;
use crate::decode::{ContentError, Source};
use crate::tag::Tag;
use super::compile::Decoder;
use super::declare::{Annotations, ChoiceType};
use super::error::{Error, SchemaError, SchemaErrorKind};
use super::kind::EncodingKind;
use super::registry::Registry;
use super::resolve::FieldSchema;
use super::types::{ChoiceRef, Repr, Target};
use super::value::Value;


//------------ ErasedChoice --------------------------------------------------

/// Wraps the value of an alternative into the value of its CHOICE.
type Segment = Arc<dyn Fn(Value) -> Result<Value, ContentError> + Send + Sync>;

/// Creates the value of a CHOICE for a NULL.
type NullFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// The schema of a CHOICE type without the concrete type.
pub(crate) struct ErasedChoice {
    alternatives: Vec<ErasedAlternative>,
    null: Option<NullFactory>,
}

struct ErasedAlternative {
    name: &'static str,
    target: Target,
    annotations: Annotations,
    wrap: Segment,
}

/// Returns the type-erased schema of `C`.
pub(crate) fn describe<C: ChoiceType>() -> ErasedChoice {
    let schema = C::schema();
    ErasedChoice {
        alternatives: schema.alternatives.into_iter().map(|alt| {
            let wrap = alt.wrap;
            ErasedAlternative {
                name: alt.name,
                target: alt.target,
                annotations: alt.annotations,
                wrap: Arc::new(move |value| {
                    wrap(value).map(|res| Value::Object(Box::new(res)))
                }),
            }
        }).collect(),
        null: schema.null.map(|factory| {
            Arc::new(move || Value::Object(Box::new(factory()))) as NullFactory
        }),
    }
}


//------------ ChoiceLookup --------------------------------------------------

/// The compiled decoder of a CHOICE type.
pub(crate) struct ChoiceLookup {
    name: &'static str,
    entries: HashMap<Tag, Entry>,
    null: Option<NullFactory>,
}

/// A leaf alternative reachable from the CHOICE.
struct Entry {
    /// The name of the alternative for error messages.
    name: &'static str,

    decoder: Decoder,

    /// The wrappers from the outermost CHOICE to the leaf.
    path: SmallVec<[Segment; 2]>,
}

impl ChoiceLookup {
    /// Builds the lookup table for a CHOICE type.
    pub(crate) fn build(
        registry: &Registry, choice: &ChoiceRef
    ) -> Result<Self, SchemaError> {
        let erased = (choice.describe)();
        let mut res = ChoiceLookup {
            name: choice.name,
            entries: HashMap::new(),
            null: erased.null.clone(),
        };
        let mut visiting = vec![choice.id];
        res.populate(
            registry, choice.name, erased, &mut SmallVec::new(), &mut visiting
        )?;
        debug!(
            type_name = choice.name,
            alternatives = res.entries.len(),
            "built CHOICE decoder"
        );
        Ok(res)
    }

    /// Adds the alternatives of a CHOICE to the table.
    ///
    /// The CHOICE is either the one the table is for or an untagged
    /// CHOICE nested inside it. In the latter case, `path` contains the
    /// wrappers leading to it.
    fn populate(
        &mut self,
        registry: &Registry,
        owner: &'static str,
        choice: ErasedChoice,
        path: &mut SmallVec<[Segment; 2]>,
        visiting: &mut Vec<TypeId>,
    ) -> Result<(), SchemaError> {
        for alt in choice.alternatives {
            let err = |kind| SchemaError::new(owner, Some(alt.name), kind);
            if alt.annotations.default.is_some() {
                return Err(err(SchemaErrorKind::DefaultInChoice))
            }
            if alt.annotations.optional {
                return Err(err(SchemaErrorKind::OptionalInChoice))
            }

            if let (Repr::Choice(nested), None) = (
                &alt.target.repr, alt.annotations.tag
            ) {
                if matches!(
                    alt.annotations.kind, None | Some(EncodingKind::Choice)
                ) {
                    if visiting.contains(&nested.id) {
                        return Err(err(
                            SchemaErrorKind::ChoiceCycle(nested.name)
                        ))
                    }
                    visiting.push(nested.id);
                    path.push(alt.wrap.clone());
                    self.populate(
                        registry, nested.name, (nested.describe)(),
                        path, visiting
                    )?;
                    path.pop();
                    visiting.pop();
                    continue
                }
            }

            let schema = FieldSchema::resolve(
                &alt.target, &alt.annotations, owner, Some(alt.name)
            )?;
            let Some(tag) = schema.tag else {
                return Err(err(SchemaErrorKind::UntaggedAnyInChoice))
            };
            if let Some(existing) = self.entries.get(&tag) {
                return Err(err(SchemaErrorKind::ConflictingChoiceTags {
                    tag, existing: existing.name
                }))
            }
            if tag == Tag::NULL && self.null.is_some() {
                return Err(err(SchemaErrorKind::ConflictingChoiceTags {
                    tag, existing: "NULL"
                }))
            }
            let mut entry_path = path.clone();
            entry_path.push(alt.wrap);
            self.entries.insert(tag, Entry {
                name: alt.name,
                decoder: Decoder::compile(&schema, registry)?,
                path: entry_path,
            });
        }
        Ok(())
    }

    /// Returns all tags that start a value of the CHOICE.
    pub(crate) fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.keys().copied().chain(
            self.null.as_ref().map(|_| Tag::NULL)
        )
    }

    /// Decodes a value of the CHOICE.
    pub(crate) fn decode(
        &self, registry: &Registry, source: &mut Source
    ) -> Result<Value, Error> {
        let ident = source.peek_ident().map_err(|err| err.context(self.name))?;
        let tag = ident.tag();
        if let (Tag::NULL, Some(null)) = (tag, self.null.as_ref()) {
            source.take_primitive(Tag::NULL)?.to_null()?;
            return Ok(null())
        }
        let Some(entry) = self.entries.get(&tag) else {
            return Err(source.content_err(format!(
                "no alternative of {} for tag {}", self.name, tag
            )).into())
        };
        let start = source.pos();
        let mut res = entry.decoder.decode(registry, source).map_err(|err| {
            err.context(format!(
                "alternative '{}' of {}", entry.name, self.name
            ))
        })?;
        for segment in entry.path.iter().rev() {
            res = segment(res).map_err(|err| err.at(start))?;
        }
        Ok(res)
    }

    /// Prepares the decoders of all alternatives.
    pub(crate) fn prepare(
        &self, registry: &Registry, visited: &mut HashSet<TypeId>
    ) -> Result<(), SchemaError> {
        for entry in self.entries.values() {
            entry.decoder.prepare(registry, visited)?;
        }
        Ok(())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;
    use crate::mode::Mode;
    use crate::schema::{Alternative, Annotate, ChoiceSchema};
    use crate::string::StringKind;

    #[derive(Debug, PartialEq)]
    enum Inner {
        Number(i64),
        Flag(bool),
    }

    impl ChoiceType for Inner {
        const NAME: &'static str = "Inner";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new()
                .alternative(Alternative::new("number", Inner::Number))
                .alternative(Alternative::new("flag", Inner::Flag))
        }
    }

    crate::impl_choice!(Inner);

    #[derive(Debug, PartialEq)]
    enum Outer {
        Inner(Inner),
        Text(String),
        Tagged(Inner),
        Nothing,
    }

    impl ChoiceType for Outer {
        const NAME: &'static str = "Outer";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new()
                .alternative(Alternative::new("inner", Outer::Inner))
                .alternative(
                    Alternative::new("text", Outer::Text)
                        .kind(EncodingKind::String(StringKind::Utf8))
                )
                .alternative(
                    Alternative::new("tagged", Outer::Tagged)
                        .explicit(Tag::ctx(0))
                )
                .allow_null(|| Outer::Nothing)
        }
    }

    crate::impl_choice!(Outer);

    #[allow(dead_code)]
    enum Clash {
        _A(i32),
        _B(u8),
    }

    impl ChoiceType for Clash {
        const NAME: &'static str = "Clash";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new()
                .alternative(Alternative::new("a", Clash::_A))
                .alternative(Alternative::new("b", Clash::_B))
        }
    }

    crate::impl_choice!(Clash);

    #[allow(dead_code)]
    enum Loop {
        _Again(Box<Loop>),
    }

    impl ChoiceType for Loop {
        const NAME: &'static str = "Loop";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new().alternative(
                Alternative::new("again", |x| Loop::_Again(x))
            )
        }
    }

    crate::impl_choice!(Loop);

    #[allow(dead_code)]
    enum WithOptional {
        _A(Option<i32>),
    }

    impl ChoiceType for WithOptional {
        const NAME: &'static str = "WithOptional";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new().alternative(
                Alternative::new("a", WithOptional::_A).optional()
            )
        }
    }

    crate::impl_choice!(WithOptional);

    #[allow(dead_code)]
    enum ImplicitNested {
        Inner(Inner),
    }

    impl ChoiceType for ImplicitNested {
        const NAME: &'static str = "ImplicitNested";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new().alternative(
                Alternative::new("inner", ImplicitNested::Inner)
                    .implicit(Tag::ctx(1))
            )
        }
    }

    crate::impl_choice!(ImplicitNested);

    #[allow(dead_code)]
    enum WithDefault {
        Number(i32),
    }

    impl ChoiceType for WithDefault {
        const NAME: &'static str = "WithDefault";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new().alternative(
                Alternative::new("number", WithDefault::Number)
                    .default_value(b"\x02\x01\x00")
            )
        }
    }

    crate::impl_choice!(WithDefault);

    #[allow(dead_code)]
    enum Anything {
        Number(i32),
        Raw(Bytes),
    }

    impl ChoiceType for Anything {
        const NAME: &'static str = "Anything";

        fn schema() -> ChoiceSchema<Self> {
            ChoiceSchema::new()
                .alternative(Alternative::new("number", Anything::Number))
                .alternative(
                    Alternative::new("raw", Anything::Raw)
                        .kind(EncodingKind::Any)
                )
        }
    }

    crate::impl_choice!(Anything);

    fn decode<T: crate::schema::Asn1Type>(
        data: &'static [u8]
    ) -> Result<T, Error> {
        Registry::new().decode(data, Mode::Der)
    }

    fn schema_err<T: crate::schema::Asn1Type>() -> SchemaErrorKind {
        match Registry::new().register::<T>() {
            Err(err) => err.kind().clone(),
            Ok(()) => panic!("schema accepted"),
        }
    }

    #[test]
    fn flattened_alternatives() {
        assert_eq!(
            decode::<Outer>(b"\x02\x01\x05").unwrap(),
            Outer::Inner(Inner::Number(5))
        );
        assert_eq!(
            decode::<Outer>(b"\x01\x01\xff").unwrap(),
            Outer::Inner(Inner::Flag(true))
        );
        assert_eq!(
            decode::<Outer>(b"\x0c\x02hi").unwrap(),
            Outer::Text("hi".into())
        );
        assert_eq!(
            decode::<Outer>(b"\xa0\x03\x02\x01\x07").unwrap(),
            Outer::Tagged(Inner::Number(7))
        );
    }

    #[test]
    fn null_alternative() {
        assert_eq!(decode::<Outer>(b"\x05\x00").unwrap(), Outer::Nothing);
        assert!(decode::<Outer>(b"\x05\x01\x00").is_err());
        assert!(decode::<Inner>(b"\x05\x00").is_err());
    }

    #[test]
    fn unknown_tag() {
        let err = decode::<Outer>(b"\x04\x00").unwrap_err();
        assert_eq!(
            err.to_string(),
            "no alternative of Outer for tag OCTET STRING (at position 0)"
        );
    }

    #[test]
    fn invalid_schemas() {
        assert_eq!(
            schema_err::<Clash>(),
            SchemaErrorKind::ConflictingChoiceTags {
                tag: Tag::INTEGER, existing: "a"
            }
        );
        assert_eq!(schema_err::<Loop>(), SchemaErrorKind::ChoiceCycle("Loop"));
        assert_eq!(
            schema_err::<WithOptional>(),
            SchemaErrorKind::OptionalInChoice
        );
        assert_eq!(
            schema_err::<ImplicitNested>(),
            SchemaErrorKind::ImplicitTagOnChoice
        );
        assert_eq!(
            schema_err::<WithDefault>(),
            SchemaErrorKind::DefaultInChoice
        );
        assert_eq!(
            schema_err::<Anything>(),
            SchemaErrorKind::UntaggedAnyInChoice
        );
        assert!(matches!(
            decode::<Anything>(b"\x02\x01\x00"),
            Err(Error::Schema(_))
        ));
    }
}
