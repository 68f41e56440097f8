//! The identifier octets of a BER encoded value.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use crate::decode::ContentError;


//------------ Tag -----------------------------------------------------------

/// The tag of a value.
///
/// In ASN.1, tags are used to identify the type of a value. Tags consist of
/// one of four classes, represented by the [`Class`] enum, and a number
/// within this class. The number is an unsigned integer.
///
/// In BER encoding, the tag becomes part of the identifier octets by
/// combining it with a bit indicating whether a value is primitive or
/// constructed. This combination is represented by [`Ident`]. Two
/// identifiers that only differ in this bit have the same tag, so comparing
/// tags is what the schema decoders use to decide whether a value is the one
/// they are looking for.
///
/// # Limitations
///
/// We only support tag numbers that fit into a `u32`. This should be more
/// than enough in practice.
//
//  Internally, we store the tag as the identifier octets of a primitive value
//  with the same tag.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Tag(Ident);

impl Tag {
    /// Creates a tag from a class and number.
    pub const fn new(class: Class, number: u32) -> Self {
        Self(Ident::new(class, false, number))
    }

    /// Creates a new tag in class “universal” with the given number.
    pub const fn universal(number: u32) -> Self {
        Self::new(Class::Universal, number)
    }

    /// Creates a new tag in class “application” with the given number.
    pub const fn application(number: u32) -> Self {
        Self::new(Class::Application, number)
    }

    /// Creates a new tag in class “context dependent” with the given number.
    pub const fn ctx(number: u32) -> Self {
        Self::new(Class::Context, number)
    }

    /// Creates a new tag in class “private” with the given number.
    pub const fn private(number: u32) -> Self {
        Self::new(Class::Private, number)
    }

    /// Returns the class of the tag.
    pub const fn class(self) -> Class {
        self.0.class()
    }

    /// Returns the number of the tag.
    pub const fn number(self) -> u32 {
        self.0.number()
    }

    /// Returns whether the tag is of the universal class.
    pub const fn is_universal(self) -> bool {
        matches!(self.class(), Class::Universal)
    }

    /// Returns whether the identifier octets carry this tag.
    ///
    /// The comparison only considers class and number. Whether the value
    /// is primitive or constructed is ignored.
    pub fn matches(self, ident: Ident) -> bool {
        self == ident.tag()
    }
}

/// # Constants for universal tags.
///
/// See clause 8.4 of ITU Recommendation X.690.
///
impl Tag {
    /// The tag marking the end-of-contents in an indefinite length value.
    pub const END_OF_CONTENTS: Self = Self::universal(0);

    /// The tag for the BOOLEAN type, UNIVERSAL 1.
    pub const BOOLEAN: Self = Self::universal(1);

    /// The tag for the INTEGER type, UNIVERSAL 2.
    pub const INTEGER: Self = Self::universal(2);

    /// The tag for the BIT STRING type, UNIVERSAL 3.
    pub const BIT_STRING: Self = Self::universal(3);

    /// The tag for the OCTET STRING type, UNIVERSAL 4.
    pub const OCTET_STRING: Self = Self::universal(4);

    /// The tag for the NULL type, UNIVERSAL 5.
    pub const NULL: Self = Self::universal(5);

    /// The tag for the OBJECT IDENTIFIER type, UNIVERSAL 6.
    pub const OID: Self = Self::universal(6);

    /// The tag for the ENUMERATED type, UNIVERSAL 10.
    pub const ENUMERATED: Self = Self::universal(10);

    /// The tag for the UTF8String type, UNIVERSAL 12
    pub const UTF8_STRING: Self = Self::universal(12);

    /// The tag for the SEQUENCE and SEQUENCE OF types, UNIVERSAL 16.
    pub const SEQUENCE: Self = Self::universal(16);

    /// The tag for the SET and SET OF types, UNIVERSAL 17.
    pub const SET: Self = Self::universal(17);

    /// The tag for the NumericString type, UNIVERSAL 18.
    pub const NUMERIC_STRING: Self = Self::universal(18);

    /// The tag for the PrintableString type, UNIVERSAL 19.
    pub const PRINTABLE_STRING: Self = Self::universal(19);

    /// The tag for the IA5String type, UNIVERSAL 22.
    pub const IA5_STRING: Self = Self::universal(22);

    /// The tag for the UTCTime type, UNIVERSAL 23.
    pub const UTC_TIME: Self = Self::universal(23);

    /// The tag for the GeneralizedType type, UNIVERSAL 24.
    pub const GENERALIZED_TIME: Self = Self::universal(24);

    /// The tag for the VisibleString type, UNIVERSAL 26.
    pub const VISIBLE_STRING: Self = Self::universal(26);

    /// The tag for the GeneralString type, UNIVERSAL 27.
    pub const GENERAL_STRING: Self = Self::universal(27);

    /// The tag for the BMPString type, UNIVERSAL 30.
    pub const BMP_STRING: Self = Self::universal(30);
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Tag::END_OF_CONTENTS => write!(f, "end-of-contents"),
            Tag::BOOLEAN => write!(f, "BOOLEAN"),
            Tag::INTEGER => write!(f, "INTEGER"),
            Tag::BIT_STRING => write!(f, "BIT STRING"),
            Tag::OCTET_STRING => write!(f, "OCTET STRING"),
            Tag::NULL => write!(f, "NULL"),
            Tag::OID => write!(f, "OBJECT IDENTIFIER"),
            Tag::ENUMERATED => write!(f, "ENUMERATED"),
            Tag::UTF8_STRING => write!(f, "UTF8String"),
            Tag::SEQUENCE => write!(f, "SEQUENCE"),
            Tag::SET => write!(f, "SET"),
            Tag::NUMERIC_STRING => write!(f, "NumericString"),
            Tag::PRINTABLE_STRING => write!(f, "PrintableString"),
            Tag::IA5_STRING => write!(f, "IA5String"),
            Tag::UTC_TIME => write!(f, "UTCTime"),
            Tag::GENERALIZED_TIME => write!(f, "GeneralizedTime"),
            Tag::VISIBLE_STRING => write!(f, "VisibleString"),
            Tag::GENERAL_STRING => write!(f, "GeneralString"),
            Tag::BMP_STRING => write!(f, "BMPString"),
            tag => {
                match tag.class() {
                    Class::Universal => write!(f, "[UNIVERSAL ")?,
                    Class::Application => write!(f, "[APPLICATION ")?,
                    Class::Context => write!(f, "[")?,
                    Class::Private => write!(f, "[PRIVATE ")?,
                }
                write!(f, "{}]", tag.number())
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({} - {:?})", self, self.0.as_slice())
    }
}


//------------ Ident ---------------------------------------------------------

/// The identifier octets of an encoded value.
///
/// This is the tag plus the information whether the value is primitive or
/// constructed.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ident(I);

#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
enum I {
    L1([u8; 1]),
    L2([u8; 2]),
    L3([u8; 3]),
    L4([u8; 4]),
    L5([u8; 5]),
    L6([u8; 6]),
}

impl Ident {
    /// The identifier marking the end-of-contents of an indefinite value.
    pub const END_OF_CONTENTS: Self = Self::new(Class::Universal, false, 0);

    /// Encodes a number into the identifier representation.
    const fn new(class: Class, constructed: bool, number: u32) -> Self {
        let first = if constructed {
            class.into_u8() | 0x20
        }
        else {
            class.into_u8()
        };

        if number <= 0x1e {
            // five bits but not all of them one (so not 0x1f)
            return Self(I::L1([first | number as u8]))
        }

        // Now the first octet is always the class plus bits 1 to 5 all 1.
        let first = first | 0x1f;

        // The lowest seven bits are the last octet. Shift the number by
        // seven to see what’s left. If that’s zero, we have a two octet
        // tag.
        let n0 = (number & 0x7F) as u8;
        let number = number >> 7;
        if number == 0 {
            return Self(I::L2([first, n0]))
        }

        let n1 = (number | 0x80) as u8;
        let number = number >> 7;
        if number == 0 {
            return Self(I::L3([first, n1, n0]))
        }

        let n2 = (number | 0x80) as u8;
        let number = number >> 7;
        if number == 0 {
            return Self(I::L4([first, n2, n1, n0]))
        }

        let n3 = (number | 0x80) as u8;
        let number = number >> 7;
        if number == 0 {
            return Self(I::L5([first, n3, n2, n1, n0]))
        }

        let n4 = (number | 0x80) as u8;
        Self(I::L6([first, n4, n3, n2, n1, n0]))
    }

    /// Creates identifier octets from a tag.
    pub const fn from_tag(tag: Tag, constructed: bool) -> Self {
        Self::new(tag.class(), constructed, tag.number())
    }

    /// Returns the tag for the identifier octets.
    pub const fn tag(self) -> Tag {
        match self.0 {
            I::L1([x]) => Tag(Self(I::L1([x & 0xDF]))),
            I::L2([x, y0]) => Tag(Self(I::L2([x & 0xDF, y0]))),
            I::L3([x, y0, y1]) => {
                Tag(Self(I::L3([x & 0xDF, y0, y1])))
            }
            I::L4([x, y0, y1, y2]) => {
                Tag(Self(I::L4([x & 0xDF, y0, y1, y2])))
            }
            I::L5([x, y0, y1, y2, y3]) => {
                Tag(Self(I::L5([x & 0xDF, y0, y1, y2, y3])))
            }
            I::L6([x, y0, y1, y2, y3, y4]) => {
                Tag(Self(I::L6([x & 0xDF, y0, y1, y2, y3, y4])))
            }
        }
    }

    /// Returns the class of the identifier octets.
    pub const fn class(self) -> Class {
        Class::from_u8(self.first())
    }

    /// Returns whether the value is a constructed value.
    pub const fn is_constructed(self) -> bool {
        self.first() & 0x20 != 0
    }

    /// Returns the number of the tag.
    pub const fn number(self) -> u32 {
        match self.0 {
            I::L1([x]) => (x & 0x1f) as u32,
            I::L2([_, x0]) => x0 as u32,
            I::L3([_, x1, x2]) => {
                  ((x1 & 0x7f) as u32) << 7
                | (x2 as u32)
            }
            I::L4([_, x1, x2, x3]) => {
                  ((x1 & 0x7f) as u32) << 14
                | ((x2 & 0x7f) as u32) << 7
                | (x3 as u32)
            }
            I::L5([_, x1, x2, x3, x4]) => {
                  ((x1 & 0x7f) as u32) << 21
                | ((x2 & 0x7f) as u32) << 14
                | ((x3 & 0x7f) as u32) << 7
                | (x4 as u32)
            }
            I::L6([_, x1, x2, x3, x4, x5]) => {
                  ((x1 & 0x7f) as u32) << 28
                | ((x2 & 0x7f) as u32) << 21
                | ((x3 & 0x7f) as u32) << 14
                | ((x4 & 0x7f) as u32) << 7
                | (x5 as u32)
            }
        }
    }

    /// Returns the number of octets of the encoded identifier.
    pub const fn encoded_len(self) -> usize {
        self.as_slice().len()
    }

    /// Returns a slice of the encoded octets.
    const fn as_slice(&self) -> &[u8] {
        match &self.0 {
            I::L1(arr) => arr.as_slice(),
            I::L2(arr) => arr.as_slice(),
            I::L3(arr) => arr.as_slice(),
            I::L4(arr) => arr.as_slice(),
            I::L5(arr) => arr.as_slice(),
            I::L6(arr) => arr.as_slice(),
        }
    }

    /// Returns the first octet.
    const fn first(self) -> u8 {
        match self.0 {
            I::L1([x]) => x,
            I::L2([x, ..]) => x,
            I::L3([x, ..]) => x,
            I::L4([x, ..]) => x,
            I::L5([x, ..]) => x,
            I::L6([x, ..]) => x,
        }
    }

    /// Parses the identifier octets at the start of `data`.
    ///
    /// Returns `Ok(None)` if `data` is empty. Otherwise returns the
    /// identifier and the number of octets it occupies.
    ///
    /// Multi-octet tags must use the shortest possible form. This is
    /// required by X.690 for all encoding rules.
    pub fn parse(data: &[u8]) -> Result<Option<(Self, usize)>, ContentError> {
        let Some(&first) = data.first() else {
            return Ok(None)
        };

        // If we have a single octet tag, we can already return.
        if (first & 0x1f) < 0x1f {
            return Ok(Some((Self(I::L1([first])), 1)))
        }

        let octet = |idx: usize| {
            data.get(idx).copied().ok_or_else(|| {
                ContentError::from_static("unexpected end of data")
            })
        };

        // Work your way through the multi-octet tags.
        let x0 = octet(1)?;
        if x0 == 0x80 {
            return Err(ContentError::from_static(
                "non-minimal tag number encoding"
            ))
        }
        if (x0 & 0x80) == 0 {
            if x0 < 0x1f {
                return Err(ContentError::from_static(
                    "non-minimal tag number encoding"
                ))
            }
            return Ok(Some((Self(I::L2([first, x0])), 2)))
        }

        let x1 = octet(2)?;
        if (x1 & 0x80) == 0 {
            return Ok(Some((Self(I::L3([first, x0, x1])), 3)))
        }

        let x2 = octet(3)?;
        if (x2 & 0x80) == 0 {
            return Ok(Some((Self(I::L4([first, x0, x1, x2])), 4)))
        }

        let x3 = octet(4)?;
        if (x3 & 0x80) == 0 {
            return Ok(Some((Self(I::L5([first, x0, x1, x2, x3])), 5)))
        }

        let x4 = octet(5)?;
        if (x4 & 0x80) == 0 {
            // In order to fit into a u32, the upper four bits of x0 must
            // be zero.
            if x0 & 0x70 != 0 {
                return Err(ContentError::from_static(
                    "tag numbers above 32 bits not supported"
                ))
            }

            return Ok(Some((Self(I::L6([first, x0, x1, x2, x3, x4])), 6)))
        }

        Err(ContentError::from_static(
            "tag numbers above 32 bits not supported"
        ))
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_constructed() {
            write!(f, "constructed {}", self.tag())
        }
        else {
            write!(f, "primitive {}", self.tag())
        }
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ident({} - {:?})", self, self.as_slice())
    }
}


//------------ Class ---------------------------------------------------------

/// The class of a tag.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Class {
    Universal,
    Application,
    Context,
    Private,
}

impl Class {
    const fn from_u8(octet: u8) -> Self {
        match octet {
            0x00..=0x3F => Self::Universal,
            0x40..=0x7F => Self::Application,
            0x80..=0xBF => Self::Context,
            0xC0..=0xFF => Self::Private
        }
    }

    const fn into_u8(self) -> u8 {
        match self {
            Self::Universal => 0x00,
            Self::Application => 0x40,
            Self::Context => 0x80,
            Self::Private => 0xC0,
        }
    }
}


//============ Tests =========================================================
