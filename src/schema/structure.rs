//! Decoding SEQUENCE types.
//!
//! This is a private module.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};
use crate::decode::Source;
use crate::tag::Tag;
use super::compile::Decoder;
use super::declare::{SequenceType, Setter};
use super::error::{Error, SchemaError, SchemaErrorKind};
use super::kind::EncodingKind;
use super::registry::Registry;
use super::resolve::FieldSchema;
use super::types::Repr;
use super::value::Value;


//------------ Structure -----------------------------------------------------

/// The compiled decoder of a SEQUENCE type.
///
/// Fields are located by their tag rather than their position. This means
/// fields may appear in any order and values with unknown tags are
/// skipped, which gives us extensibility for free.
pub(crate) struct Structure<S> {
    fields: Vec<CompiledField<S>>,

    /// The index of the field for each tag that can start it.
    by_tag: HashMap<Tag, usize>,

    factory: Box<dyn Fn() -> S + Send + Sync>,
}

struct CompiledField<S> {
    name: &'static str,
    schema: FieldSchema,
    decoder: Decoder,
    setter: Setter<S>,
}

impl<S: SequenceType> Structure<S> {
    /// Builds the decoder from the type’s schema.
    pub(crate) fn build(registry: &Registry) -> Result<Self, SchemaError> {
        let schema = S::schema();
        let mut fields: Vec<CompiledField<S>> = Vec::with_capacity(
            schema.fields.len()
        );
        let mut by_tag = HashMap::new();

        for field in schema.fields {
            let resolved = FieldSchema::resolve(
                &field.target, &field.annotations, S::NAME, Some(field.name)
            )?;
            let decoder = Decoder::compile(&resolved, registry)?;
            let tags = match resolved.tag {
                Some(tag) => vec![tag],
                None => match (resolved.kind, &resolved.target.repr) {
                    (EncodingKind::Choice, Repr::Choice(choice)) => {
                        registry.choice(choice)?.tags().collect()
                    }
                    _ => {
                        return Err(resolved.error(
                            SchemaErrorKind::UnsupportedType(
                                "untagged ANY in a SEQUENCE"
                            )
                        ))
                    }
                }
            };
            for tag in tags {
                if let Some(&existing) = by_tag.get(&tag) {
                    let existing: &CompiledField<S> = &fields[existing];
                    return Err(resolved.error(
                        SchemaErrorKind::DuplicateFieldTag {
                            tag, existing: existing.name
                        }
                    ))
                }
                by_tag.insert(tag, fields.len());
            }
            fields.push(CompiledField {
                name: field.name,
                schema: resolved,
                decoder,
                setter: field.setter,
            });
        }

        debug!(
            type_name = S::NAME,
            fields = fields.len(),
            "built SEQUENCE decoder"
        );
        Ok(Structure { fields, by_tag, factory: schema.factory })
    }

    /// Decodes a value of the type.
    ///
    /// If `implicit` is given, it replaces the outer tag of the type.
    /// Otherwise an application or private tag of the type is treated as
    /// an explicit tag wrapping the SEQUENCE.
    fn decode(
        &self, registry: &Registry, source: &mut Source, implicit: Option<Tag>
    ) -> Result<S, Error> {
        let (tag, nested) = match (implicit, S::TAG) {
            (Some(tag), _) => (tag, false),
            (None, Some(tag)) => (tag, !tag.is_universal()),
            (None, None) => (Tag::SEQUENCE, false),
        };
        let mut content = source.enter(tag).map_err(|err| err.context(S::NAME))?;
        if nested {
            let inner = content.enter(Tag::SEQUENCE).map_err(|err| {
                err.context(S::NAME)
            })?;
            content.check_exhausted().map_err(|err| err.context(S::NAME))?;
            content = inner;
        }

        let mut values: Vec<Option<Value>> = self.fields.iter().map(|_| {
            None
        }).collect();
        while !content.is_exhausted() {
            let ident = content.peek_ident().map_err(|err| {
                err.context(S::NAME)
            })?;
            let Some(&idx) = self.by_tag.get(&ident.tag()) else {
                let pos = content.pos();
                let len = content.peek_value_len().map_err(|err| {
                    err.context(S::NAME)
                })?;
                trace!(
                    type_name = S::NAME, tag = %ident.tag(), len, %pos,
                    "skipping unknown field"
                );
                content.skip(len)?;
                continue
            };
            let field = &self.fields[idx];
            if values[idx].is_some() {
                return Err(Error::from(content.content_err(
                    format!("duplicate field '{}'", field.name)
                )).context(S::NAME))
            }
            let value = field.decoder.decode(
                registry, &mut content
            ).map_err(|err| field.context(err))?;
            values[idx] = Some(value);
        }

        let mut res = (self.factory)();
        for (field, value) in self.fields.iter().zip(values) {
            let value = match value {
                Some(value) => value,
                None if field.schema.optional
                    || field.schema.default.is_some() =>
                {
                    field.decoder.decode(
                        registry, &mut content.empty()
                    ).map_err(|err| field.context(err))?
                }
                None => {
                    return Err(Error::from(content.content_err(
                        format!("missing field '{}'", field.name)
                    )).context(S::NAME))
                }
            };
            (field.setter)(&mut res, value).map_err(|err| {
                field.context(err.at(content.pos()).into())
            })?;
        }
        Ok(res)
    }
}

impl<S: SequenceType> CompiledField<S> {
    fn context(&self, err: Error) -> Error {
        err.context(format!("field '{}' of {}", self.name, S::NAME))
    }
}


//------------ Entry points for StructureRef ---------------------------------

/// Decodes a value of type `S` and boxes it.
pub(crate) fn decode_value<S: SequenceType>(
    registry: &Registry, source: &mut Source, implicit: Option<Tag>
) -> Result<Value, Error> {
    let structure = registry.structure::<S>()?;
    let res = structure.decode(registry, source, implicit)?;
    Ok(Value::Object(Box::new(res)))
}

/// Builds the decoders for `S` and everything reachable from it.
pub(crate) fn prepare<S: SequenceType>(
    registry: &Registry, visited: &mut HashSet<TypeId>
) -> Result<(), SchemaError> {
    let structure = registry.structure::<S>()?;
    for field in &structure.fields {
        field.decoder.prepare(registry, visited)?;
    }
    Ok(())
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::Limits;
    use crate::mode::Mode;
    use crate::schema::{Annotate, Field, SequenceSchema};
    use crate::string::StringKind;

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        first: u8,
        second: Option<String>,
        third: bool,
    }

    impl SequenceType for Pair {
        const NAME: &'static str = "Pair";

        fn schema() -> SequenceSchema<Self> {
            SequenceSchema::default()
                .field(
                    Field::new("first", |s: &mut Self, v| s.first = v)
                        .explicit(Tag::ctx(0))
                )
                .field(
                    Field::new("second", |s: &mut Self, v| s.second = v)
                        .kind(EncodingKind::String(StringKind::Utf8))
                        .explicit(Tag::ctx(1))
                        .optional()
                )
                .field(
                    Field::new("third", |s: &mut Self, v| s.third = v)
                        .implicit(Tag::ctx(2))
                        .default_value(b"\x01\x01\xff")
                )
        }
    }

    crate::impl_sequence!(Pair);

    #[derive(Debug, Default, PartialEq)]
    struct Tagged {
        value: u8,
    }

    impl SequenceType for Tagged {
        const NAME: &'static str = "Tagged";
        const TAG: Option<Tag> = Some(Tag::application(5));

        fn schema() -> SequenceSchema<Self> {
            SequenceSchema::default().field(
                Field::new("value", |s: &mut Self, v| s.value = v)
                    .explicit(Tag::ctx(0))
            )
        }
    }

    crate::impl_sequence!(Tagged);

    #[derive(Debug, Default)]
    struct Clash {
        _a: u8,
        _b: u8,
    }

    impl SequenceType for Clash {
        const NAME: &'static str = "Clash";

        fn schema() -> SequenceSchema<Self> {
            SequenceSchema::default()
                .field(Field::new("a", |s: &mut Self, v| s._a = v))
                .field(Field::new("b", |s: &mut Self, v| s._b = v))
        }
    }

    crate::impl_sequence!(Clash);

    #[derive(Debug, Default, PartialEq)]
    struct Node {
        value: u8,
        next: Option<Box<Node>>,
    }

    impl SequenceType for Node {
        const NAME: &'static str = "Node";

        fn schema() -> SequenceSchema<Self> {
            SequenceSchema::default()
                .field(
                    Field::new("value", |s: &mut Self, v| s.value = v)
                        .explicit(Tag::ctx(0))
                )
                .field(
                    Field::new("next", |s: &mut Self, v| s.next = v)
                        .explicit(Tag::ctx(1))
                        .optional()
                )
        }
    }

    crate::impl_sequence!(Node);

    /// Encodes a chain of `count` nodes.
    fn chain(count: u8) -> Vec<u8> {
        let mut content = vec![0xa0, 0x03, 0x02, 0x01, count];
        if count > 1 {
            let next = chain(count - 1);
            content.push(0xa1);
            content.push(next.len() as u8);
            content.extend_from_slice(&next);
        }
        let mut res = vec![0x30, content.len() as u8];
        res.extend_from_slice(&content);
        res
    }

    fn decode<T: crate::schema::Asn1Type>(
        data: &'static [u8]
    ) -> Result<T, Error> {
        Registry::new().decode(data, Mode::Ber)
    }

    #[test]
    fn fields_in_order() {
        assert_eq!(
            decode::<Pair>(
                b"\x30\x10\
                  \xa0\x03\x02\x01\x01\
                  \xa1\x06\x0c\x04abcd\
                  \x82\x01\x00"
            ).unwrap(),
            Pair { first: 1, second: Some("abcd".into()), third: false }
        );
    }

    #[test]
    fn fields_out_of_order_and_unknown() {
        assert_eq!(
            decode::<Pair>(
                b"\x30\x0c\
                  \x82\x01\x00\
                  \xa7\x02\x05\x00\
                  \xa0\x03\x02\x01\x01"
            ).unwrap(),
            Pair { first: 1, second: None, third: false }
        );
    }

    #[test]
    fn defaults_and_optionals() {
        assert_eq!(
            decode::<Pair>(b"\x30\x05\xa0\x03\x02\x01\x09").unwrap(),
            Pair { first: 9, second: None, third: true }
        );
    }

    #[test]
    fn missing_and_duplicate_fields() {
        let err = decode::<Pair>(b"\x30\x03\x82\x01\x00").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Pair: missing field 'first' (at position 5)"
        );
        let err = decode::<Pair>(
            b"\x30\x0a\xa0\x03\x02\x01\x01\xa0\x03\x02\x01\x02"
        ).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Pair: duplicate field 'first' (at position 7)"
        );
    }

    #[test]
    fn field_errors_carry_context() {
        let err = decode::<Pair>(
            b"\x30\x05\xa0\x03\x01\x01\x01"
        ).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'first' of Pair: \
             expected value with tag INTEGER, found BOOLEAN \
             (at position 4)"
        );
    }

    #[test]
    fn indefinite_length() {
        assert_eq!(
            decode::<Pair>(
                b"\x30\x80\
                  \xa0\x80\x02\x01\x03\x00\x00\
                  \x00\x00"
            ).unwrap(),
            Pair { first: 3, second: None, third: true }
        );
    }

    #[test]
    fn constructed_string_field() {
        let data = b"\x30\x10\
            \xa0\x03\x02\x01\x01\
            \xa1\x09\x2c\x07\x04\x02ab\x04\x01c";
        assert_eq!(
            decode::<Pair>(data).unwrap(),
            Pair { first: 1, second: Some("abc".into()), third: true }
        );
        assert!(
            Registry::new().decode::<Pair>(&data[..], Mode::Der).is_err()
        );
    }

    #[test]
    fn recursion_depth() {
        assert_eq!(
            Registry::new().decode::<Node>(chain(1), Mode::Der).unwrap(),
            Node { value: 1, next: None }
        );
        assert_eq!(
            Registry::new().decode::<Node>(chain(2), Mode::Der).unwrap(),
            Node {
                value: 2,
                next: Some(Box::new(Node { value: 1, next: None }))
            }
        );

        let registry = Registry::with_limits(
            Limits::default().with_max_depth(Some(4))
        );
        assert!(registry.decode::<Node>(chain(1), Mode::Der).is_ok());
        assert!(matches!(
            registry.decode::<Node>(chain(5), Mode::Der),
            Err(Error::Decode(_))
        ));
        assert!(
            Registry::new().decode::<Node>(chain(5), Mode::Der).is_ok()
        );
    }

    #[test]
    fn application_tag() {
        assert_eq!(
            decode::<Tagged>(b"\x65\x07\x30\x05\xa0\x03\x02\x01\x04").unwrap(),
            Tagged { value: 4 }
        );
        assert!(decode::<Tagged>(b"\x30\x05\xa0\x03\x02\x01\x04").is_err());
    }

    #[test]
    fn duplicate_tags_rejected() {
        let err = decode::<Clash>(b"\x30\x00").unwrap_err();
        let Error::Schema(err) = err else { panic!("expected schema error") };
        assert_eq!(err.type_name(), "Clash");
        assert_eq!(err.member(), Some("b"));
        assert_eq!(
            err.kind(),
            &SchemaErrorKind::DuplicateFieldTag {
                tag: Tag::INTEGER, existing: "a"
            }
        );
    }
}
