//! Resolving annotations into field schemas.
//!
//! This is a private module. Its public items are re-exported by the parent.

use bytes::Bytes;
use crate::tag::Tag;
use super::declare::Annotations;
use super::error::{SchemaError, SchemaErrorKind};
use super::kind::EncodingKind;
use super::types::{Repr, Target};


//------------ FieldSchema ---------------------------------------------------

/// The fully resolved description of how a field is encoded.
///
/// This combines the Rust type of a field with its annotations. All
/// consistency checks that don’t need other types have been done.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    /// The name of the type the field belongs to.
    pub(crate) owner: &'static str,

    /// The name of the field.
    pub(crate) member: Option<&'static str>,

    pub(crate) kind: EncodingKind,

    /// The tag of the outermost value.
    ///
    /// This is `None` for untagged CHOICE and ANY fields.
    pub(crate) tag: Option<Tag>,

    /// Whether `tag` wraps the value of the kind.
    pub(crate) explicit: bool,

    /// Whether `tag` replaces the natural tag.
    pub(crate) implicit: bool,

    pub(crate) optional: bool,
    pub(crate) default: Option<Bytes>,
    pub(crate) range: Option<(i128, i128)>,

    /// The schema of the elements of a collection.
    pub(crate) element: Option<Box<FieldSchema>>,

    pub(crate) target: Target,
}

impl FieldSchema {
    /// Resolves the schema for a type with annotations.
    pub(crate) fn resolve(
        target: &Target,
        ann: &Annotations,
        owner: &'static str,
        member: Option<&'static str>,
    ) -> Result<Self, SchemaError> {
        let err = |kind| SchemaError::new(owner, member, kind);

        let kind = match ann.kind {
            Some(kind) => {
                if !target.admits(kind) {
                    return Err(err(SchemaErrorKind::KindMismatch {
                        kind, target: target.name
                    }))
                }
                kind
            }
            None => match target.default_kind() {
                Some(kind) => kind,
                None => {
                    return Err(err(
                        SchemaErrorKind::AmbiguousFieldType(target.name)
                    ))
                }
            }
        };

        let range = match ann.range.or(target.range) {
            Some((min, max)) => {
                if !matches!(
                    kind, EncodingKind::Integer | EncodingKind::Enumerated
                ) {
                    return Err(err(SchemaErrorKind::KindMismatch {
                        kind, target: "range constraint"
                    }))
                }
                if min > max {
                    return Err(err(SchemaErrorKind::InvalidRange { min, max }))
                }
                Some((min, max))
            }
            None => None
        };

        if let EncodingKind::UtcTime { two_digit_year_max } = kind {
            if two_digit_year_max < 99 {
                return Err(err(SchemaErrorKind::InvalidTwoDigitYearMax(
                    two_digit_year_max
                )))
            }
        }

        if ann.optional && !target.nullable {
            return Err(err(SchemaErrorKind::OptionalNotNullable))
        }
        if ann.optional && ann.default.is_some() {
            return Err(err(SchemaErrorKind::OptionalWithDefault))
        }

        let natural = natural_tag(kind, target);
        let (tag, explicit, implicit) = match ann.tag {
            Some(tag) => {
                if kind == EncodingKind::Choice && !ann.explicit {
                    return Err(err(SchemaErrorKind::ImplicitTagOnChoice))
                }
                (Some(tag), ann.explicit, !ann.explicit)
            }
            None => (natural, false, false),
        };

        let element = match target.repr {
            Repr::Collection(ref element) => {
                if matches!(element.repr, Repr::Collection(_)) {
                    return Err(err(SchemaErrorKind::NestedCollection))
                }
                let element_ann = Annotations {
                    kind: ann.elements,
                    .. Default::default()
                };
                Some(Box::new(
                    FieldSchema::resolve(element, &element_ann, owner, member)?
                ))
            }
            _ => {
                if let Some(kind) = ann.elements {
                    return Err(err(SchemaErrorKind::KindMismatch {
                        kind, target: "element of a non-collection"
                    }))
                }
                None
            }
        };

        Ok(FieldSchema {
            owner,
            member,
            kind,
            tag,
            explicit,
            implicit,
            optional: ann.optional,
            default: ann.default.clone(),
            range,
            element,
            target: target.clone(),
        })
    }

    /// Returns the tag of the value read by the decoder for the kind.
    ///
    /// For explicitly tagged fields this is the tag inside the wrapper.
    pub(crate) fn inner_tag(&self) -> Option<Tag> {
        if self.explicit {
            natural_tag(self.kind, &self.target)
        }
        else {
            self.tag
        }
    }

    /// Returns the schema of the untagged value.
    ///
    /// This is used for decoding DEFAULT values which are given without
    /// any tags.
    pub(crate) fn untagged(&self) -> FieldSchema {
        FieldSchema {
            tag: natural_tag(self.kind, &self.target),
            explicit: false,
            implicit: false,
            optional: false,
            default: None,
            .. self.clone()
        }
    }

    /// Returns a schema error for this field.
    pub(crate) fn error(&self, kind: SchemaErrorKind) -> SchemaError {
        SchemaError::new(self.owner, self.member, kind)
    }

    pub fn kind(&self) -> EncodingKind {
        self.kind
    }

    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default(&self) -> Option<&Bytes> {
        self.default.as_ref()
    }

    pub fn element(&self) -> Option<&FieldSchema> {
        self.element.as_deref()
    }
}

/// Returns the tag of an untagged value of the kind.
fn natural_tag(kind: EncodingKind, target: &Target) -> Option<Tag> {
    match (kind, &target.repr) {
        (EncodingKind::Sequence, Repr::Structure(structure)) => {
            Some(structure.natural_tag())
        }
        _ => kind.universal_tag()
    }
}


//============ Tests =========================================================
