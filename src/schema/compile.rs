//! Turning field schemas into decoders.
//!
//! This is a private module.
//!
//! A field is decoded through a small chain of decoders. At its core sits
//! the decoder for the encoding kind. If the field is explicitly tagged,
//! this is wrapped into a decoder that enters the tag first. If the field
//! is OPTIONAL or has a DEFAULT, the outermost decoder checks whether the
//! value is present at all.

use std::any::TypeId;
use std::collections::HashSet;
use bytes::Bytes;
use crate::decode::{ContentError, DecodeError, Source};
use crate::int::Integer;
use crate::mode::Mode;
use crate::oid::Oid;
use crate::string::{take_octets, BitString, StringKind};
use crate::tag::Tag;
use crate::time::{parse_generalized_time, parse_utc_time};
use super::collection;
use super::error::{Error, SchemaError, SchemaErrorKind};
use super::kind::EncodingKind;
use super::registry::Registry;
use super::resolve::FieldSchema;
use super::types::{ChoiceRef, IntWidth, Repr, StructureRef};
use super::value::Value;


//------------ Decoder -------------------------------------------------------

/// The decoder for a field.
#[derive(Debug)]
pub(crate) enum Decoder {
    /// Decodes a value of the field’s encoding kind.
    Core(Box<Core>),

    /// Enters an explicit tag and decodes its content.
    Explicit {
        tag: Tag,
        inner: Box<Decoder>,
    },

    /// Decodes the value only if it is present.
    Fallback {
        /// The tag of a present value or `None` if any value will do.
        expected: Option<Tag>,
        inner: Box<Decoder>,
        absent: Absent,
    },
}

/// What to do if a value is absent.
#[derive(Debug)]
pub(crate) enum Absent {
    /// Produce an absent value.
    Optional,

    /// Decode the default value.
    Default(Box<DefaultValue>),
}

impl Decoder {
    /// Builds the decoder for a field.
    ///
    /// DEFAULT values of leaf kinds are checked right away. The DEFAULT
    /// values of other kinds depend on other types and are checked when
    /// the decoder is prepared.
    pub(crate) fn compile(
        schema: &FieldSchema, registry: &Registry
    ) -> Result<Self, SchemaError> {
        let mut res = Decoder::Core(Box::new(Core::new(schema, registry)?));
        if let (true, Some(tag)) = (schema.explicit, schema.tag) {
            res = Decoder::Explicit { tag, inner: Box::new(res) };
        }
        if schema.optional {
            res = Decoder::Fallback {
                expected: schema.tag,
                inner: Box::new(res),
                absent: Absent::Optional,
            };
        }
        else if let Some(encoded) = schema.default.as_ref() {
            let default = DefaultValue::new(schema, encoded.clone(), registry)?;
            if schema.kind.is_leaf() {
                default.decode(registry)?;
            }
            res = Decoder::Fallback {
                expected: schema.tag,
                inner: Box::new(res),
                absent: Absent::Default(Box::new(default)),
            };
        }
        Ok(res)
    }

    /// Decodes a value from the source.
    ///
    /// If the decoder is for an OPTIONAL or DEFAULT field and the source
    /// doesn’t start with the field’s value, nothing is consumed.
    pub(crate) fn decode(
        &self, registry: &Registry, source: &mut Source
    ) -> Result<Value, Error> {
        match self {
            Decoder::Core(core) => core.decode(registry, source),
            Decoder::Explicit { tag, inner } => {
                let mut content = source.enter(*tag)?;
                let res = inner.decode(registry, &mut content)?;
                content.check_exhausted()?;
                Ok(res)
            }
            Decoder::Fallback { expected, inner, absent } => {
                let present = match source.peek_opt_ident()? {
                    Some(ident) => match expected {
                        Some(tag) => tag.matches(ident),
                        None => true,
                    }
                    None => false,
                };
                if present {
                    return inner.decode(registry, source)
                }
                match absent {
                    Absent::Optional => Ok(Value::Absent),
                    Absent::Default(default) => {
                        default.decode(registry).map_err(Into::into)
                    }
                }
            }
        }
    }

    /// Builds the decoders of all types reachable from this one.
    ///
    /// Types already in `visited` are skipped. DEFAULT values are checked
    /// on the way.
    pub(crate) fn prepare(
        &self, registry: &Registry, visited: &mut HashSet<TypeId>
    ) -> Result<(), SchemaError> {
        match self {
            Decoder::Core(core) => core.prepare(registry, visited),
            Decoder::Explicit { inner, .. } => inner.prepare(registry, visited),
            Decoder::Fallback { inner, absent, .. } => {
                if let Absent::Default(default) = absent {
                    default.core.prepare(registry, visited)?;
                    default.decode(registry)?;
                }
                inner.prepare(registry, visited)
            }
        }
    }
}


//------------ Core ----------------------------------------------------------

/// The decoder for a value of an encoding kind.
#[derive(Debug)]
pub(crate) struct Core {
    kind: CoreKind,

    /// The range constraint on an integer value.
    range: Option<(i128, i128)>,
}

#[derive(Debug)]
enum CoreKind {
    Boolean(Tag),
    Integer {
        tag: Tag,

        /// The built-in type the value must fit into.
        width: Option<IntWidth>,

        /// Produce the content octets rather than an integer.
        raw: bool,
    },
    BitString {
        tag: Tag,
        form: BitForm,
    },
    OctetString(Tag),
    Oid {
        tag: Tag,

        /// Produce the dotted text form.
        text: bool,
    },
    String {
        tag: Tag,
        charset: StringKind,
    },
    UtcTime {
        tag: Tag,
        two_digit_year_max: u16,
    },
    GeneralizedTime {
        tag: Tag,
        disallow_fractions: bool,
    },

    /// A complete value with the given tag or any tag.
    Any(Option<Tag>),
    Structure {
        /// The tag replacing the outer tag of the type.
        implicit: Option<Tag>,
        structure: StructureRef,
    },
    Choice(ChoiceRef),
    Collection {
        tag: Tag,
        element: Box<Decoder>,
    },
}

/// What a BIT STRING is decoded into.
#[derive(Clone, Copy, Debug)]
enum BitForm {
    Bits,

    /// The octets without the unused-bits octet.
    Octets,

    /// A named bit list.
    Flags,
}

impl Core {
    fn new(
        schema: &FieldSchema, registry: &Registry
    ) -> Result<Self, SchemaError> {
        let inner_tag = schema.inner_tag();
        let tag = || inner_tag.ok_or_else(|| {
            schema.error(SchemaErrorKind::UnsupportedType("value without tag"))
        });
        let mismatch = || schema.error(SchemaErrorKind::KindMismatch {
            kind: schema.kind, target: schema.target.name
        });

        let kind = match schema.kind {
            EncodingKind::Boolean => CoreKind::Boolean(tag()?),
            EncodingKind::Integer | EncodingKind::Enumerated => {
                CoreKind::Integer {
                    tag: tag()?,
                    width: match schema.target.repr {
                        Repr::Int(width) => Some(width),
                        _ => None,
                    },
                    raw: matches!(schema.target.repr, Repr::Bytes),
                }
            }
            EncodingKind::BitString => CoreKind::BitString {
                tag: tag()?,
                form: match schema.target.repr {
                    Repr::Bytes => BitForm::Octets,
                    Repr::Flags => BitForm::Flags,
                    _ => BitForm::Bits,
                },
            },
            EncodingKind::OctetString => CoreKind::OctetString(tag()?),
            EncodingKind::ObjectIdentifier => CoreKind::Oid {
                tag: tag()?,
                text: matches!(schema.target.repr, Repr::Text),
            },
            EncodingKind::String(charset)
            | EncodingKind::GeneralString(charset) => {
                CoreKind::String { tag: tag()?, charset }
            }
            EncodingKind::UtcTime { two_digit_year_max } => {
                CoreKind::UtcTime { tag: tag()?, two_digit_year_max }
            }
            EncodingKind::GeneralizedTime { disallow_fractions } => {
                CoreKind::GeneralizedTime { tag: tag()?, disallow_fractions }
            }
            EncodingKind::Any => CoreKind::Any(inner_tag),
            EncodingKind::Sequence => match schema.target.repr {
                Repr::Structure(structure) => CoreKind::Structure {
                    implicit: if schema.implicit { schema.tag } else { None },
                    structure,
                },
                _ => return Err(mismatch()),
            },
            EncodingKind::Choice => match schema.target.repr {
                Repr::Choice(choice) => CoreKind::Choice(choice),
                _ => return Err(mismatch()),
            },
            EncodingKind::SequenceOf | EncodingKind::SetOf => {
                let element = match schema.element.as_ref() {
                    Some(element) => element,
                    None => return Err(mismatch()),
                };
                CoreKind::Collection {
                    tag: tag()?,
                    element: Box::new(Decoder::compile(element, registry)?),
                }
            }
        };
        Ok(Core { kind, range: schema.range })
    }

    /// Decodes a value and checks its constraints.
    fn decode(
        &self, registry: &Registry, source: &mut Source
    ) -> Result<Value, Error> {
        let start = source.pos();
        let res = self.decode_unconstrained(registry, source)?;
        self.check_range(&res).map_err(|err| err.at(start))?;
        Ok(self.finish(res))
    }

    /// Decodes a value without checking the range constraint.
    fn decode_unconstrained(
        &self, registry: &Registry, source: &mut Source
    ) -> Result<Value, Error> {
        let res = match self.kind {
            CoreKind::Boolean(tag) => {
                Value::Boolean(source.take_primitive(tag)?.to_bool()?)
            }
            CoreKind::Integer { tag, width, .. } => {
                let prim = source.take_primitive(tag)?;
                let start = prim.start();
                let int = Integer::from_primitive(prim)?;
                if let Some(width) = width {
                    if !width.fits(&int) {
                        return Err(DecodeError::content(
                            format!(
                                "value {} does not fit into {}",
                                int, width.name()
                            ),
                            start
                        ).into())
                    }
                }
                Value::Integer(int)
            }
            CoreKind::BitString { tag, form } => {
                let start = source.pos();
                let bits = BitString::take_from(source, tag)?;
                match form {
                    BitForm::Bits => Value::BitString(bits),
                    BitForm::Octets => Value::Bytes(bits.octet_bytes()),
                    BitForm::Flags => match bits.to_named_bits() {
                        Some(flags) => Value::Flags(flags),
                        None => {
                            return Err(DecodeError::content(
                                "named bit list too long", start
                            ).into())
                        }
                    }
                }
            }
            CoreKind::OctetString(tag) => {
                Value::Bytes(take_octets(source, tag)?)
            }
            CoreKind::Oid { tag, text } => {
                let oid = Oid::from_primitive(source.take_primitive(tag)?)?;
                if text {
                    Value::Text(oid.to_string())
                }
                else {
                    Value::Oid(oid)
                }
            }
            CoreKind::String { tag, charset } => {
                let start = source.pos();
                let octets = take_octets(source, tag)?;
                match charset.decode(&octets) {
                    Ok(text) => Value::Text(text),
                    Err(_) => {
                        return Err(DecodeError::content(
                            format!("invalid {} content", charset), start
                        ).into())
                    }
                }
            }
            CoreKind::UtcTime { tag, two_digit_year_max } => {
                let start = source.pos();
                let octets = take_octets(source, tag)?;
                Value::Time(
                    parse_utc_time(&octets, two_digit_year_max, source.mode())
                        .map_err(|err| err.at(start))?
                )
            }
            CoreKind::GeneralizedTime { tag, disallow_fractions } => {
                let start = source.pos();
                let octets = take_octets(source, tag)?;
                Value::Time(
                    parse_generalized_time(
                        &octets, disallow_fractions, source.mode()
                    ).map_err(|err| err.at(start))?
                )
            }
            CoreKind::Any(tag) => {
                if let Some(tag) = tag {
                    let ident = source.peek_ident()?;
                    if !tag.matches(ident) {
                        return Err(source.content_err(format!(
                            "expected value with tag {}, found {}",
                            tag, ident.tag()
                        )).into())
                    }
                }
                Value::Bytes(source.take_value()?)
            }
            CoreKind::Structure { implicit, ref structure } => {
                return (structure.decode)(registry, source, implicit)
            }
            CoreKind::Choice(ref choice) => {
                return registry.choice(choice)?.decode(registry, source)
            }
            CoreKind::Collection { tag, ref element } => {
                return collection::decode(registry, source, tag, element)
            }
        };
        Ok(res)
    }

    fn check_range(&self, value: &Value) -> Result<(), ContentError> {
        if let (Some((min, max)), Value::Integer(int)) = (self.range, value) {
            if !int.is_in_range(min, max) {
                return Err(ContentError::from_string(format!(
                    "value {} out of range {}..={}", int, min, max
                )))
            }
        }
        Ok(())
    }

    /// Converts the value into the form the target type expects.
    fn finish(&self, value: Value) -> Value {
        match (&self.kind, value) {
            (CoreKind::Integer { raw: true, .. }, Value::Integer(int)) => {
                Value::Bytes(int.into_bytes())
            }
            (_, value) => value,
        }
    }

    fn prepare(
        &self, registry: &Registry, visited: &mut HashSet<TypeId>
    ) -> Result<(), SchemaError> {
        match self.kind {
            CoreKind::Structure { ref structure, .. } => {
                if visited.insert(structure.id) {
                    (structure.prepare)(registry, visited)?;
                }
                Ok(())
            }
            CoreKind::Choice(ref choice) => {
                if visited.insert(choice.id) {
                    registry.choice(choice)?.prepare(registry, visited)?;
                }
                Ok(())
            }
            CoreKind::Collection { ref element, .. } => {
                element.prepare(registry, visited)
            }
            _ => Ok(())
        }
    }
}


//------------ DefaultValue --------------------------------------------------

/// The DEFAULT value of a field.
///
/// The value is kept in its DER encoding without any tags and decoded
/// whenever the field is absent.
#[derive(Debug)]
pub(crate) struct DefaultValue {
    encoded: Bytes,

    /// The decoder for the untagged value.
    core: Core,

    owner: &'static str,
    member: Option<&'static str>,
}

impl DefaultValue {
    fn new(
        schema: &FieldSchema, encoded: Bytes, registry: &Registry
    ) -> Result<Self, SchemaError> {
        Ok(DefaultValue {
            encoded,
            core: Core::new(&schema.untagged(), registry)?,
            owner: schema.owner,
            member: schema.member,
        })
    }

    fn decode(&self, registry: &Registry) -> Result<Value, SchemaError> {
        let mut source = Source::new(self.encoded.clone(), Mode::Der);
        let res = self.core.decode_unconstrained(
            registry, &mut source
        ).map_err(|err| match err {
            Error::Schema(err) => err,
            Error::Decode(err) => self.error(
                SchemaErrorKind::InvalidDefault(err.to_string())
            ),
        })?;
        source.check_exhausted().map_err(|err| {
            self.error(SchemaErrorKind::InvalidDefault(err.to_string()))
        })?;
        self.core.check_range(&res).map_err(|err| {
            self.error(SchemaErrorKind::DefaultOutOfRange(err.to_string()))
        })?;
        Ok(self.core.finish(res))
    }

    fn error(&self, kind: SchemaErrorKind) -> SchemaError {
        SchemaError::new(self.owner, self.member, kind)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::Pos;
    use crate::schema::declare::Annotations;
    use crate::schema::Asn1Type;

    fn compile<T: Asn1Type>(
        ann: Annotations
    ) -> Result<Decoder, SchemaError> {
        let schema = FieldSchema::resolve(
            &T::target(), &ann, "Test", Some("field")
        )?;
        Decoder::compile(&schema, &Registry::new())
    }

    fn decode<T: Asn1Type>(
        ann: Annotations, data: &'static [u8], mode: Mode
    ) -> Result<(T, usize), Error> {
        let registry = Registry::new();
        let schema = FieldSchema::resolve(
            &T::target(), &ann, "Test", Some("field")
        )?;
        let decoder = Decoder::compile(&schema, &registry)?;
        let mut source = Source::new(Bytes::from_static(data), mode);
        let value = decoder.decode(&registry, &mut source)?;
        let left = source.remaining().len();
        let value = T::from_value(value).map_err(|err| {
            Error::Decode(err.at(Pos::from(0)))
        })?;
        Ok((value, data.len() - left))
    }

    #[test]
    fn explicit_tag() {
        let ann = Annotations {
            tag: Some(Tag::ctx(0)),
            explicit: true,
            .. Default::default()
        };
        assert_eq!(
            decode::<i32>(ann.clone(), b"\xa0\x03\x02\x01\x05", Mode::Der)
                .unwrap(),
            (5, 5)
        );
        // Implicit encoding where explicit is expected.
        assert!(decode::<i32>(ann.clone(), b"\x80\x01\x05", Mode::Der)
            .is_err());
        // Trailing data inside the wrapper.
        assert!(decode::<i32>(
            ann, b"\xa0\x06\x02\x01\x05\x02\x01\x06", Mode::Der
        ).is_err());
    }

    #[test]
    fn implicit_tag() {
        let ann = Annotations {
            tag: Some(Tag::ctx(1)),
            .. Default::default()
        };
        assert_eq!(
            decode::<u8>(ann, b"\x81\x01\x7f", Mode::Der).unwrap(),
            (127, 3)
        );
    }

    #[test]
    fn optional_absent() {
        let ann = Annotations {
            tag: Some(Tag::ctx(3)),
            explicit: true,
            optional: true,
            .. Default::default()
        };
        assert_eq!(
            decode::<Option<u8>>(ann.clone(), b"\xa4\x03\x02\x01\x05", Mode::Der)
                .unwrap(),
            (None, 0)
        );
        assert_eq!(
            decode::<Option<u8>>(ann.clone(), b"", Mode::Der).unwrap(),
            (None, 0)
        );
        assert_eq!(
            decode::<Option<u8>>(ann, b"\xa3\x03\x02\x01\x05", Mode::Der)
                .unwrap(),
            (Some(5), 5)
        );
    }

    #[test]
    fn default_value() {
        let ann = Annotations {
            tag: Some(Tag::ctx(0)),
            default: Some(Bytes::from_static(b"\x02\x01\x2a")),
            .. Default::default()
        };
        assert_eq!(decode::<u8>(ann.clone(), b"", Mode::Der).unwrap(), (42, 0));
        assert_eq!(
            decode::<u8>(ann, b"\x80\x01\x07", Mode::Der).unwrap(),
            (7, 3)
        );

        let invalid = Annotations {
            default: Some(Bytes::from_static(b"\x02\x02\x00\x01")),
            .. Default::default()
        };
        assert!(matches!(
            compile::<u8>(invalid).unwrap_err().kind(),
            SchemaErrorKind::InvalidDefault(_)
        ));

        let out_of_range = Annotations {
            default: Some(Bytes::from_static(b"\x02\x01\x2a")),
            range: Some((0, 10)),
            .. Default::default()
        };
        assert!(matches!(
            compile::<u8>(out_of_range).unwrap_err().kind(),
            SchemaErrorKind::DefaultOutOfRange(_)
        ));
    }

    #[test]
    fn integer_constraints() {
        let ann = Annotations {
            range: Some((0, 999_999)),
            .. Default::default()
        };
        assert_eq!(
            decode::<u32>(ann.clone(), b"\x02\x03\x0d\xa5\x5f", Mode::Der)
                .unwrap(),
            (894_303, 5)
        );
        let err = decode::<u32>(ann, b"\x02\x03\x0f\x42\x40", Mode::Der)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "value 1000000 out of range 0..=999999 (at position 0)"
        );
        let err = decode::<u8>(
            Annotations::default(), b"\x02\x02\x01\x00", Mode::Der
        ).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value 256 does not fit into u8 (at position 2)"
        );
    }

    #[test]
    fn raw_forms() {
        let ann = Annotations {
            kind: Some(EncodingKind::Integer),
            .. Default::default()
        };
        assert_eq!(
            decode::<Bytes>(ann, b"\x02\x02\x00\x80", Mode::Der).unwrap().0,
            Bytes::from_static(b"\x00\x80")
        );
        let ann = Annotations {
            kind: Some(EncodingKind::ObjectIdentifier),
            .. Default::default()
        };
        assert_eq!(
            decode::<String>(ann, b"\x06\x03\x55\x04\x03", Mode::Der)
                .unwrap().0,
            "2.5.4.3"
        );
        let ann = Annotations {
            kind: Some(EncodingKind::Any),
            .. Default::default()
        };
        assert_eq!(
            decode::<Bytes>(ann, b"\x30\x03\x02\x01\x05", Mode::Der)
                .unwrap(),
            (Bytes::from_static(b"\x30\x03\x02\x01\x05"), 5)
        );
    }

    #[derive(Debug, PartialEq)]
    struct Options(u64);

    impl Asn1Type for Options {
        fn target() -> crate::schema::Target {
            crate::schema::Target::flags("Options")
        }

        fn from_value(value: Value) -> Result<Self, ContentError> {
            value.into_flags().map(Options)
        }
    }

    #[test]
    fn named_bit_list() {
        assert_eq!(
            decode::<Options>(
                Annotations::default(), b"\x03\x02\x05\xa0", Mode::Der
            ).unwrap().0,
            Options(0b101)
        );
        let ann = Annotations {
            tag: Some(Tag::ctx(3)),
            .. Default::default()
        };
        assert_eq!(
            decode::<Options>(ann, b"\x83\x01\x00", Mode::Der).unwrap().0,
            Options(0)
        );
        assert!(matches!(
            compile::<Options>(Annotations {
                kind: Some(EncodingKind::OctetString),
                .. Default::default()
            }),
            Err(_)
        ));
    }

    #[test]
    fn strings_and_times() {
        let ann = Annotations {
            kind: Some(EncodingKind::GeneralString(StringKind::Ia5)),
            .. Default::default()
        };
        assert_eq!(
            decode::<String>(ann.clone(), b"\x1b\x04TEST", Mode::Der)
                .unwrap().0,
            "TEST"
        );
        assert!(decode::<String>(ann, b"\x1b\x01\xc3", Mode::Der).is_err());

        let ann = Annotations {
            kind: Some(EncodingKind::utc_time()),
            .. Default::default()
        };
        let (time, _) = decode::<chrono::DateTime<chrono::Utc>>(
            ann, b"\x17\x0d180806203305Z", Mode::Der
        ).unwrap();
        assert_eq!(time.to_rfc3339(), "2018-08-06T20:33:05+00:00");
    }
}
