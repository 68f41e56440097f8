//! Restricted character strings.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::{error, fmt};
use crate::tag::Tag;


//------------ StringKind ----------------------------------------------------

/// The kind of a restricted character string.
///
/// Each kind has a natural tag and a character set that determines which
/// octet sequences are valid and how they translate into characters.
///
/// ASN.1 defines quite a few of those of which we only implement a subset
/// that is commonly in use. Specifically:
///
/// * `Utf8` contains a sequence of Unicode code points encoded as octets
///   through UTF-8,
/// * `Numeric` contains only decimals digits and spaces,
/// * `Printable` contains a subset of ASCII characters including letters,
///   digits, and a few symbols,
/// * `Ia5` contains ASCII characters only (IA5 is an alternative name for
///   ASCII),
/// * `Visible` contains the printing ASCII characters and space,
/// * `Bmp` contains the Unicode Basic Multilingual Plane encoded as two
///   octets per character.
///
/// The GeneralString type has no character set of its own. When decoding
/// it, one of these kinds is used to check its content.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StringKind {
    Utf8,
    Numeric,
    Printable,
    Ia5,
    Visible,
    Bmp,
}

impl StringKind {
    /// Returns the natural tag of the string kind.
    pub fn tag(self) -> Tag {
        match self {
            StringKind::Utf8 => Tag::UTF8_STRING,
            StringKind::Numeric => Tag::NUMERIC_STRING,
            StringKind::Printable => Tag::PRINTABLE_STRING,
            StringKind::Ia5 => Tag::IA5_STRING,
            StringKind::Visible => Tag::VISIBLE_STRING,
            StringKind::Bmp => Tag::BMP_STRING,
        }
    }

    /// Returns the ASN.1 name of the string kind.
    pub fn name(self) -> &'static str {
        match self {
            StringKind::Utf8 => "UTF8String",
            StringKind::Numeric => "NumericString",
            StringKind::Printable => "PrintableString",
            StringKind::Ia5 => "IA5String",
            StringKind::Visible => "VisibleString",
            StringKind::Bmp => "BMPString",
        }
    }

    /// Decodes the content octets into a string.
    pub fn decode(self, octets: &[u8]) -> Result<String, CharSetError> {
        match self {
            StringKind::Utf8 => {
                String::from_utf8(octets.into()).map_err(|_| CharSetError)
            }
            StringKind::Bmp => {
                if octets.len() % 2 != 0 {
                    return Err(CharSetError)
                }
                octets.chunks_exact(2).map(|pair| {
                    char::from_u32(
                        u32::from(pair[0]) << 8 | u32::from(pair[1])
                    ).ok_or(CharSetError)
                }).collect()
            }
            _ => {
                if octets.iter().all(|&ch| self.is_valid_ascii(ch)) {
                    Ok(octets.iter().map(|&ch| char::from(ch)).collect())
                }
                else {
                    Err(CharSetError)
                }
            }
        }
    }

    /// Returns whether an octet is valid for the single-octet kinds.
    fn is_valid_ascii(self, ch: u8) -> bool {
        match self {
            StringKind::Numeric => ch.is_ascii_digit() || ch == b' ',
            StringKind::Printable => {
                ch.is_ascii_alphanumeric() || // A-Z a-z 0-9
                    matches!(
                        ch,
                        b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-'
                        | b'.' | b'/' | b':' | b'=' | b'?'
                    )
            }
            StringKind::Ia5 => ch.is_ascii(),
            StringKind::Visible => ch.is_ascii_graphic() || ch == b' ',
            StringKind::Utf8 | StringKind::Bmp => false,
        }
    }
}

impl fmt::Display for StringKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}


//------------ CharSetError --------------------------------------------------

/// An illegal value was encountered during character set conversion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CharSetError;

impl fmt::Display for CharSetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid character")
    }
}

impl error::Error for CharSetError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn printable() {
        assert_eq!(
            StringKind::Printable.decode(b"This is okay").unwrap(),
            "This is okay"
        );
        assert!(StringKind::Printable.decode(b"This is not okay!").is_err());
    }

    #[test]
    fn ia5_and_visible() {
        assert_eq!(
            StringKind::Ia5.decode(b"INT.DEVDOMAINS.ORG").unwrap(),
            "INT.DEVDOMAINS.ORG"
        );
        assert!(StringKind::Ia5.decode(b"\x80").is_err());
        assert!(StringKind::Ia5.decode(b"tab\there").is_ok());
        assert!(StringKind::Visible.decode(b"tab\there").is_err());
    }

    #[test]
    fn numeric() {
        assert_eq!(StringKind::Numeric.decode(b"12 34").unwrap(), "12 34");
        assert!(StringKind::Numeric.decode(b"12a").is_err());
    }

    #[test]
    fn utf8_and_bmp() {
        assert_eq!(
            StringKind::Utf8.decode("grüße".as_bytes()).unwrap(), "grüße"
        );
        assert!(StringKind::Utf8.decode(b"\xc3").is_err());
        assert_eq!(StringKind::Bmp.decode(b"\x00A\x00\xfc").unwrap(), "Aü");
        assert!(StringKind::Bmp.decode(b"\x00A\x00").is_err());
        assert!(StringKind::Bmp.decode(b"\xd8\x00").is_err());
    }
}
