//! The schema registry.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use bytes::Bytes;
use parking_lot::RwLock;
use crate::decode::{Limits, Source};
use crate::mode::Mode;
use super::choice::ChoiceLookup;
use super::compile::Decoder;
use super::declare::{Annotations, SequenceType};
use super::error::{Error, SchemaError, SchemaErrorKind};
use super::resolve::FieldSchema;
use super::structure::Structure;
use super::types::{Asn1Type, ChoiceRef};


//------------ Registry ------------------------------------------------------

/// Builds and caches the decoders for Rust types.
///
/// Decoders are built from the schema of a type the first time the type is
/// decoded and then kept for all later uses. The registry can be shared
/// between threads. If two threads build the decoder for the same type
/// concurrently, both succeed and the decoder that was stored first is
/// used from then on.
///
/// Building the decoder for a top-level type checks the whole schema
/// reachable from it, including all DEFAULT values. If the schema is
/// invalid, the error is stored in place of the decoder and returned for
/// every later attempt.
pub struct Registry {
    limits: Limits,

    /// The decoders of top-level types or why they couldn’t be built.
    roots: RwLock<HashMap<TypeId, Result<Arc<Decoder>, SchemaError>>>,

    /// The decoders of SEQUENCE types, each an `Arc<Structure<S>>`.
    structures: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,

    /// The decoders of CHOICE types.
    choices: RwLock<HashMap<TypeId, Arc<ChoiceLookup>>>,
}

impl Registry {
    /// Creates a new registry with default limits.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Creates a new registry with the given decoding limits.
    pub fn with_limits(limits: Limits) -> Self {
        Registry {
            limits,
            roots: Default::default(),
            structures: Default::default(),
            choices: Default::default(),
        }
    }

    /// Returns the decoding limits.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Decodes a value of type `T` from the data.
    ///
    /// The data must contain exactly one encoded value. Anything after it
    /// is an error. Use [`decode_with_len`][Self::decode_with_len] if the
    /// data may contain more.
    pub fn decode<T: Asn1Type>(
        &self, data: impl Into<Bytes>, mode: Mode
    ) -> Result<T, Error> {
        let mut source = Source::with_limits(data, mode, self.limits);
        let res = self.decode_source::<T>(&mut source)?;
        source.check_exhausted()?;
        Ok(res)
    }

    /// Decodes a value of type `T` from the start of the data.
    ///
    /// Returns the value and the number of octets it occupied.
    pub fn decode_with_len<T: Asn1Type>(
        &self, data: impl Into<Bytes>, mode: Mode
    ) -> Result<(T, usize), Error> {
        let data = data.into();
        let total = data.len();
        let mut source = Source::with_limits(data, mode, self.limits);
        let res = self.decode_source::<T>(&mut source)?;
        Ok((res, total - source.remaining().len()))
    }

    /// Decodes a value of type `T` from a source.
    pub fn decode_source<T: Asn1Type>(
        &self, source: &mut Source
    ) -> Result<T, Error> {
        let start = source.pos();
        let value = self.root::<T>()?.decode(self, source)?;
        T::from_value(value).map_err(|err| Error::Decode(err.at(start)))
    }

    /// Builds the decoders for `T` and all types reachable from it.
    ///
    /// This checks the complete schema up front, including all DEFAULT
    /// values, rather than when the types are first encountered in data.
    pub fn register<T: Asn1Type>(&self) -> Result<(), SchemaError> {
        self.root::<T>().map(|_| ())
    }

    /// Returns the decoder for a top-level value of type `T`.
    ///
    /// The outcome is stored, so a failed build fails again right away.
    fn root<T: Asn1Type>(&self) -> Result<Arc<Decoder>, SchemaError> {
        let id = TypeId::of::<T>();
        let cached = self.roots.read().get(&id).cloned();
        if let Some(res) = cached {
            return res
        }
        let built = self.build_root::<T>();
        self.roots.write().entry(id).or_insert(built).clone()
    }

    /// Builds the decoder for `T` and prepares everything it reaches.
    fn build_root<T: Asn1Type>(&self) -> Result<Arc<Decoder>, SchemaError> {
        let target = T::target();
        let schema = FieldSchema::resolve(
            &target, &Annotations::default(), target.name, None
        )?;
        let decoder = Decoder::compile(&schema, self)?;
        decoder.prepare(self, &mut HashSet::new())?;
        Ok(Arc::new(decoder))
    }

    /// Returns the decoder for the SEQUENCE type `S`.
    pub(crate) fn structure<S: SequenceType>(
        &self
    ) -> Result<Arc<Structure<S>>, SchemaError> {
        let id = TypeId::of::<S>();
        let cached = self.structures.read().get(&id).cloned();
        let res = match cached {
            Some(res) => res,
            None => {
                let built: Arc<dyn Any + Send + Sync> = Arc::new(
                    Structure::<S>::build(self)?
                );
                self.structures.write().entry(id).or_insert(built).clone()
            }
        };
        res.downcast::<Structure<S>>().map_err(|_| {
            SchemaError::new(
                S::NAME, None,
                SchemaErrorKind::UnsupportedType("conflicting type identity")
            )
        })
    }

    /// Returns the decoder for a CHOICE type.
    pub(crate) fn choice(
        &self, choice: &ChoiceRef
    ) -> Result<Arc<ChoiceLookup>, SchemaError> {
        let cached = self.choices.read().get(&choice.id).cloned();
        if let Some(res) = cached {
            return Ok(res)
        }
        let built = Arc::new(ChoiceLookup::build(self, choice)?);
        Ok(self.choices.write().entry(choice.id).or_insert(built).clone())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("limits", &self.limits)
            .field("roots", &self.roots.read().len())
            .field("structures", &self.structures.read().len())
            .field("choices", &self.choices.read().len())
            .finish()
    }
}

/// Decodes a value using a fresh registry.
///
/// This is a shortcut for one-off decoding. Since the decoders are thrown
/// away afterwards, keep a [`Registry`] around if you decode repeatedly.
pub fn decode<T: Asn1Type>(
    data: impl Into<Bytes>, mode: Mode
) -> Result<T, Error> {
    Registry::new().decode(data, mode)
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use super::*;
    use crate::schema::{Annotate, Field, SequenceSchema};

    #[derive(Debug, Default, PartialEq)]
    struct Counted {
        value: i64,
    }

    impl SequenceType for Counted {
        const NAME: &'static str = "Counted";

        fn schema() -> SequenceSchema<Self> {
            SequenceSchema::default().field(
                Field::new("value", |s: &mut Self, v| s.value = v)
            )
        }
    }

    crate::impl_sequence!(Counted);

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Default, PartialEq)]
    struct Cached {
        value: i64,
    }

    impl SequenceType for Cached {
        const NAME: &'static str = "Cached";

        fn schema() -> SequenceSchema<Self> {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            SequenceSchema::default().field(
                Field::new("value", |s: &mut Self, v| s.value = v)
            )
        }
    }

    crate::impl_sequence!(Cached);

    #[derive(Default)]
    struct BadDefault {
        _inner: Counted,
    }

    impl SequenceType for BadDefault {
        const NAME: &'static str = "BadDefault";

        fn schema() -> SequenceSchema<Self> {
            SequenceSchema::default().field(
                Field::new("inner", |s: &mut Self, v| s._inner = v)
                    .explicit(crate::tag::Tag::ctx(0))
                    .default_value(b"\x30\x03\x01\x01\xff")
            )
        }
    }

    crate::impl_sequence!(BadDefault);

    #[test]
    fn decoders_are_cached() {
        let registry = Registry::new();
        for _ in 0..3 {
            assert_eq!(
                registry.decode::<Cached>(
                    Bytes::from_static(b"\x30\x03\x02\x01\x07"), Mode::Der
                ).unwrap(),
                Cached { value: 7 }
            );
        }
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_use() {
        let registry = Registry::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(
                        registry.decode::<Counted>(
                            Bytes::from_static(b"\x30\x03\x02\x01\x01"),
                            Mode::Ber
                        ).unwrap(),
                        Counted { value: 1 }
                    );
                });
            }
        });
    }

    #[test]
    fn trailing_data() {
        let registry = Registry::new();
        let data = Bytes::from_static(b"\x30\x03\x02\x01\x07\x05\x00");
        assert!(registry.decode::<Counted>(data.clone(), Mode::Der).is_err());
        assert_eq!(
            registry.decode_with_len::<Counted>(data, Mode::Der).unwrap(),
            (Counted { value: 7 }, 5)
        );
    }

    #[test]
    fn register_checks_structured_defaults() {
        let registry = Registry::new();
        let err = registry.register::<BadDefault>().unwrap_err();
        assert_eq!(err.type_name(), "BadDefault");
        assert!(matches!(err.kind(), SchemaErrorKind::InvalidDefault(_)));
        assert!(registry.register::<Counted>().is_ok());
    }

    #[test]
    fn invalid_default_fails_when_present() {
        let registry = Registry::new();
        assert!(matches!(
            registry.decode::<BadDefault>(
                Bytes::from_static(b"\x30\x07\xa0\x05\x30\x03\x02\x01\x07"),
                Mode::Der
            ),
            Err(Error::Schema(_))
        ));
        let err = registry.register::<BadDefault>().unwrap_err();
        assert!(matches!(err.kind(), SchemaErrorKind::InvalidDefault(_)));
    }

    #[test]
    fn invalid_default_fails_every_decode() {
        let registry = Registry::new();
        let data = Bytes::from_static(b"\x30\x00");
        assert!(matches!(
            registry.decode::<BadDefault>(data.clone(), Mode::Der),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            registry.decode::<BadDefault>(data, Mode::Der),
            Err(Error::Schema(_))
        ));
    }
}
