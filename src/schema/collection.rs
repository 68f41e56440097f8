//! Decoding SEQUENCE OF and SET OF.
//!
//! This is a private module.

use crate::decode::Source;
use crate::tag::Tag;
use super::compile::Decoder;
use super::error::Error;
use super::registry::Registry;
use super::value::Value;


/// Decodes a collection of elements.
///
/// The elements of a SET OF are accepted in any order, even in DER. The
/// number of elements is limited by the source’s limits.
pub(crate) fn decode(
    registry: &Registry, source: &mut Source, tag: Tag, element: &Decoder
) -> Result<Value, Error> {
    let mut content = source.enter(tag)?;
    let mut res = Vec::new();
    while !content.is_exhausted() {
        if let Some(max) = content.limits().max_elements {
            if res.len() >= max {
                return Err(content.content_err(
                    "too many elements in collection"
                ).into())
            }
        }
        let value = element.decode(registry, &mut content).map_err(|err| {
            err.context(format!("element {}", res.len()))
        })?;
        res.push(value);
    }
    Ok(Value::Collection(res))
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use crate::decode::Limits;
    use crate::mode::Mode;
    use crate::schema::{
        Annotate, EncodingKind, Error, Field, Registry, SequenceSchema,
        SequenceType,
    };

    #[derive(Debug, Default, PartialEq)]
    struct Members {
        values: Vec<u8>,
    }

    impl SequenceType for Members {
        const NAME: &'static str = "Members";

        fn schema() -> SequenceSchema<Self> {
            SequenceSchema::default().field(
                Field::new("values", |s: &mut Self, v| s.values = v)
                    .kind(EncodingKind::SetOf)
            )
        }
    }

    crate::impl_sequence!(Members);

    #[test]
    fn sequence_of() {
        let registry = Registry::new();
        assert_eq!(
            registry.decode::<Vec<u8>>(
                Bytes::from_static(b"\x30\x06\x02\x01\x01\x02\x01\x02"), Mode::Der
            ).unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            registry.decode::<Vec<u8>>(Bytes::from_static(b"\x30\x00"), Mode::Der)
                .unwrap(),
            Vec::<u8>::new()
        );
    }

    #[test]
    fn set_of() {
        let registry = Registry::new();
        assert_eq!(
            registry.decode::<Members>(
                Bytes::from_static(b"\x30\x08\x31\x06\x02\x01\x02\x02\x01\x01"),
                Mode::Der
            ).unwrap(),
            Members { values: vec![2, 1] }
        );
        assert!(
            registry.decode::<Members>(
                Bytes::from_static(b"\x30\x08\x30\x06\x02\x01\x02\x02\x01\x01"),
                Mode::Der
            ).is_err()
        );
    }

    #[test]
    fn element_errors() {
        let err = Registry::new().decode::<Vec<u8>>(
            Bytes::from_static(b"\x30\x06\x02\x01\x01\x01\x01\x00"), Mode::Der
        ).unwrap_err();
        assert_eq!(
            err.to_string(),
            "element 1: expected value with tag INTEGER, found BOOLEAN \
             (at position 5)"
        );
    }

    #[test]
    fn element_limit() {
        let registry = Registry::with_limits(
            Limits::default().with_max_elements(Some(2))
        );
        let data = Bytes::from_static(
            b"\x30\x09\x02\x01\x01\x02\x01\x02\x02\x01\x03"
        );
        assert!(matches!(
            registry.decode::<Vec<u8>>(data.clone(), Mode::Der),
            Err(Error::Decode(_))
        ));
        let registry = Registry::with_limits(Limits::unlimited());
        assert_eq!(
            registry.decode::<Vec<u8>>(data.clone(), Mode::Der).unwrap(),
            vec![1, 2, 3]
        );
    }
}
