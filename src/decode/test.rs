#![cfg(test)]

use bytes::Bytes;
use crate::length::Length;
use crate::mode::Mode;
use crate::tag::Tag;
use super::*;

/// A SEQUENCE with two context-tagged primitives followed by a [0].
const DEFINITE: &[u8] = b"\x30\x0a\x80\x03foo\x81\x03bar\xa0\x05\x80\x03baz";

/// The same but with the SEQUENCE in indefinite form.
const INDEFINITE: &[u8] =
    b"\x30\x80\x80\x03foo\x81\x03bar\x00\x00\xa0\x05\x80\x03baz";

#[test]
fn enter_definite() {
    let mut source = Source::new(Bytes::from_static(DEFINITE), Mode::Der);
    let mut cons = source.enter(Tag::SEQUENCE).unwrap();
    assert_eq!(cons.depth(), 1);
    assert_eq!(
        cons.take_primitive(Tag::ctx(0)).unwrap().as_slice(), b"foo"
    );
    assert_eq!(
        cons.take_primitive(Tag::ctx(1)).unwrap().as_slice(), b"bar"
    );
    assert!(cons.is_exhausted());
    let mut cons = source.enter(Tag::ctx(0)).unwrap();
    let prim = cons.take_primitive(Tag::ctx(0)).unwrap();
    assert_eq!(prim.into_bytes(), Bytes::from_static(b"baz"));
    source.check_exhausted().unwrap();
}

#[test]
fn enter_indefinite() {
    let mut source = Source::new(Bytes::from_static(INDEFINITE), Mode::Ber);
    assert_eq!(source.peek_value_len().unwrap(), 14);
    let mut cons = source.enter(Tag::SEQUENCE).unwrap();
    assert_eq!(
        cons.take_primitive(Tag::ctx(0)).unwrap().as_slice(), b"foo"
    );
    cons.skip_value().unwrap();
    cons.check_exhausted().unwrap();
    assert_eq!(source.pos(), Pos::from(14));
    source.skip_value().unwrap();
    assert!(source.is_exhausted());
}

#[test]
fn indefinite_rejected_in_der() {
    let source = Source::new(Bytes::from_static(INDEFINITE), Mode::Der);
    assert!(source.peek_header().is_err());
}

#[test]
fn definite_constructed_rejected_in_cer() {
    let mut source = Source::new(Bytes::from_static(DEFINITE), Mode::Cer);
    assert!(source.enter(Tag::SEQUENCE).is_err());

    let mut source = Source::new(Bytes::from_static(INDEFINITE), Mode::Cer);
    assert!(source.enter(Tag::SEQUENCE).is_ok());
}

#[test]
fn short_reads() {
    // Definite length beyond the end of the data.
    for len in 0..DEFINITE.len() {
        let mut source = Source::new(
            Bytes::copy_from_slice(&DEFINITE[..len]), Mode::Ber
        );
        if len < 12 {
            assert!(source.enter(Tag::SEQUENCE).is_err(), "len {}", len);
        }
        else {
            source.enter(Tag::SEQUENCE).unwrap();
            assert!(source.skip_value().is_err(), "len {}", len);
        }
    }

    // Missing end-of-contents.
    let source = Source::new(
        Bytes::from_static(&INDEFINITE[..12]), Mode::Ber
    );
    assert!(source.peek_value_len().is_err());
}

#[test]
fn tag_mismatch() {
    let mut source = Source::new(Bytes::from_static(DEFINITE), Mode::Ber);
    let err = source.enter(Tag::SET).unwrap_err();
    assert_eq!(
        err.error().message(),
        "expected value with tag SET, found SEQUENCE"
    );
    assert!(source.take_primitive(Tag::SEQUENCE).is_err());
    assert_eq!(source.pos(), Pos::from(0));
}

#[test]
fn headers() {
    let source = Source::new(Bytes::from_static(DEFINITE), Mode::Der);
    let header = source.peek_header().unwrap();
    assert_eq!(header.ident.tag(), Tag::SEQUENCE);
    assert!(header.ident.is_constructed());
    assert_eq!(header.length, Length::Definite(10));
    assert_eq!(header.header_len, 2);

    let mut source = Source::new(Bytes::from_static(b"\x04\x80"), Mode::Ber);
    assert!(source.take_header().is_err());
}

#[test]
fn take_value() {
    let mut source = Source::new(Bytes::from_static(DEFINITE), Mode::Der);
    assert_eq!(source.take_value().unwrap().as_ref(), &DEFINITE[..12]);
    assert_eq!(source.take_value().unwrap().as_ref(), &DEFINITE[12..]);
    assert!(source.peek_opt_ident().unwrap().is_none());
}

#[test]
fn depth_limit() {
    // Five nested indefinite SEQUENCEs.
    let mut data = Vec::new();
    data.extend_from_slice(&[0x30, 0x80].repeat(5));
    data.extend_from_slice(&[0x00, 0x00].repeat(5));
    let data = Bytes::from(data);

    let limits = Limits::default().with_max_depth(Some(4));
    let source = Source::with_limits(data.clone(), Mode::Ber, limits);
    assert!(source.peek_value_len().is_err());

    let limits = Limits::default().with_max_depth(Some(5));
    let source = Source::with_limits(data, Mode::Ber, limits);
    assert_eq!(source.peek_value_len().unwrap(), 20);

    // Four nested definite SEQUENCEs.
    let mut source = Source::with_limits(
        Bytes::from_static(b"\x30\x06\x30\x04\x30\x02\x30\x00"),
        Mode::Der, Limits::default().with_max_depth(Some(3))
    );
    let mut one = source.enter(Tag::SEQUENCE).unwrap();
    let mut two = one.enter(Tag::SEQUENCE).unwrap();
    let mut three = two.enter(Tag::SEQUENCE).unwrap();
    assert_eq!(three.depth(), 3);
    assert!(three.enter(Tag::SEQUENCE).is_err());
}

#[test]
fn error_position() {
    let mut source = Source::new(Bytes::from_static(DEFINITE), Mode::Der);
    let mut cons = source.enter(Tag::SEQUENCE).unwrap();
    cons.skip_value().unwrap();
    let err = cons.take_primitive(Tag::ctx(0)).unwrap_err();
    assert_eq!(err.pos(), Pos::from(7));
}
