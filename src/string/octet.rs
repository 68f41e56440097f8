//! The content of string values.
//!
//! This is a private module. Its public items are re-exported by the parent.

use bytes::{Bytes, BytesMut};
use crate::decode::{DecodeError, Source};
use crate::mode::Mode;
use crate::tag::Tag;


//------------ take_octets ---------------------------------------------------

/// Takes the content octets of a string value with the given tag.
///
/// This is used for OCTET STRING and all restricted character strings which
/// share the same encoding.
///
/// # BER Encoding
///
/// Strings are either encoded as a primitive or a constructed value. In the
/// primitive form, the content octets are the string’s octets. In a
/// constructed form, the content is a sequence of encoded octets strings
/// which in turn may be primitive or constructed. In this case, the string’s
/// octets are the concatenation of all the content octets of the primitive
/// forms in the order as encountered.
///
/// In CER, the string must use the primitive form if it is less than 1000
/// octets long and the constructed form otherwise. The constructed form must
/// consists of a sequence of primitive values each exactly with a 1000
/// octets of content except for the last one.
///
/// In DER, only the primitive form is allowed.
///
/// The primitive form is returned without copying. The constructed form is
/// assembled into a new buffer.
pub fn take_octets(
    source: &mut Source, tag: Tag
) -> Result<Bytes, DecodeError> {
    let ident = source.peek_ident()?;
    if !ident.is_constructed() {
        let prim = source.take_primitive(tag)?;
        if source.mode() == Mode::Cer && prim.as_slice().len() > CER_SEGMENT {
            return Err(prim.content_err("long string in CER mode"))
        }
        return Ok(prim.into_bytes())
    }
    if source.mode() == Mode::Der {
        return Err(source.content_err("constructed string in DER mode"))
    }
    let mut cons = source.enter(tag)?;
    let mut target = BytesMut::new();
    if source.mode() == Mode::Cer {
        take_cer_segments(&mut cons, &mut target)?;
    }
    else {
        take_ber_segments(&mut cons, &mut target)?;
    }
    Ok(target.freeze())
}

/// The maximum size of a segment in CER.
const CER_SEGMENT: usize = 1000;

/// Appends the segments of a constructed BER string to `target`.
///
/// Segments are OCTET STRINGs regardless of the tag of the outer value.
fn take_ber_segments(
    cons: &mut Source, target: &mut BytesMut
) -> Result<(), DecodeError> {
    while !cons.is_exhausted() {
        if cons.peek_ident()?.is_constructed() {
            let mut inner = cons.enter(Tag::OCTET_STRING)?;
            take_ber_segments(&mut inner, target)?;
        }
        else {
            let prim = cons.take_primitive(Tag::OCTET_STRING)?;
            target.extend_from_slice(prim.as_slice());
        }
    }
    Ok(())
}

/// Appends the segments of a constructed CER string to `target`.
fn take_cer_segments(
    cons: &mut Source, target: &mut BytesMut
) -> Result<(), DecodeError> {
    let mut short = false;
    while !cons.is_exhausted() {
        let prim = cons.take_primitive(Tag::OCTET_STRING)?;
        let len = prim.as_slice().len();
        if short || len > CER_SEGMENT || len == 0 {
            return Err(prim.content_err("invalid segment in CER string"))
        }
        short = len < CER_SEGMENT;
        target.extend_from_slice(prim.as_slice());
    }
    Ok(())
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn take(data: &'static [u8], mode: Mode) -> Result<Bytes, DecodeError> {
        let mut source = Source::new(Bytes::from_static(data), mode);
        let res = take_octets(&mut source, Tag::OCTET_STRING)?;
        source.check_exhausted()?;
        Ok(res)
    }

    #[test]
    fn primitive() {
        assert_eq!(take(b"\x04\x03foo", Mode::Der).unwrap().as_ref(), b"foo");
        assert_eq!(take(b"\x04\x00", Mode::Der).unwrap().as_ref(), b"");
    }

    #[test]
    fn constructed_ber() {
        let data = b"\x24\x0c\x04\x03foo\x24\x05\x04\x03bar";
        assert_eq!(take(data, Mode::Ber).unwrap().as_ref(), b"foobar");
        assert!(take(data, Mode::Der).is_err());

        let data = b"\x24\x80\x04\x03foo\x04\x03bar\x00\x00";
        assert_eq!(take(data, Mode::Ber).unwrap().as_ref(), b"foobar");
        assert!(take(data, Mode::Der).is_err());
    }

    #[test]
    fn constructed_cer() {
        let data = b"\x24\x80\x04\x03foo\x00\x00";
        assert_eq!(take(data, Mode::Cer).unwrap().as_ref(), b"foo");

        // A short segment must be the last one.
        let data = b"\x24\x80\x04\x03foo\x04\x03bar\x00\x00";
        assert!(take(data, Mode::Cer).is_err());
    }

    #[test]
    fn restricted_tag() {
        let mut source = Source::new(
            Bytes::from_static(b"\x3b\x0a\x04\x03foo\x04\x03bar"), Mode::Ber
        );
        assert_eq!(
            take_octets(&mut source, Tag::GENERAL_STRING).unwrap().as_ref(),
            b"foobar"
        );
    }
}
