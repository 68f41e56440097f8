//! BER-encoded bit strings.
//!
//! This is a private module. Its public items are re-exported by the parent.

use bytes::{Bytes, BytesMut};
use crate::decode::{DecodeError, Primitive, Source};
use crate::mode::Mode;
use crate::tag::Tag;


//------------ BitString -----------------------------------------------------

/// A bit string value.
///
/// Bit strings are a sequence of bits. Unlike octet strings, they do not
/// need to contain a multiple of eight bits.
///
/// There are two types of methods for accessing the data in a bit string.
/// Methods starting with `bit` operate on the individual bits while those
/// prefixed with `octet` access entire octets and ignore the fact that there
/// may be unused bits in the final octet.
///
/// # BER Encoding
///
/// When encoded in BER, bit strings can either be a primitive or
/// constructed value.
///
/// If encoded as a primitive value, the first octet of the
/// content contains the number of unused bits in the last octet and the
/// following octets contain the bits with the first bit in the most
/// significant bit of the octet.
///
/// In the constructed encoding, the bit string is represented as a sequence
/// of bit strings which in turn may either be constructed or primitive
/// encodings. The only limitation in this nesting is that only the last
/// primitively encoded bit string may have a non-zero number of unused bits.
///
/// With BER, the sender can choose either form of encoding. With DER, only
/// the primitive form is allowed and the unused bits must be zero.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BitString {
    /// The number of unused bits in the last byte.
    unused: u8,

    /// The bytes of the bit string.
    bits: Bytes,
}

impl BitString {
    /// Creates a new bit string.
    pub fn new(unused: u8, bits: Bytes) -> Self {
        Self { unused, bits }
    }

    /// Returns the value of the given bit.
    pub fn bit(&self, bit: usize) -> bool {
        if bit >= self.bit_len() {
            return false
        }
        let idx = bit >> 3;
        let octet = self.bits.get(idx).copied().unwrap_or(0);
        let mask = 0x80u8 >> (bit & 7);
        octet & mask != 0
    }

    /// Returns the number of bits in the bit string.
    pub fn bit_len(&self) -> usize {
        (self.bits.len() << 3).saturating_sub(usize::from(self.unused))
    }

    /// Returns the number of unused bits in the last octet.
    pub fn unused(&self) -> u8 {
        self.unused
    }

    /// Returns the number of octets in the bit string.
    pub fn octet_len(&self) -> usize {
        self.bits.len()
    }

    /// Returns a slice of the octets in the bit string.
    pub fn octet_slice(&self) -> &[u8] {
        self.bits.as_ref()
    }

    /// Returns a bytes value of the octets of the bit string.
    pub fn octet_bytes(&self) -> Bytes {
        self.bits.clone()
    }

    /// Returns the bit string as a named bit list.
    ///
    /// Bit _n_ of the bit string becomes bit _n_ of the returned value,
    /// i.e., the first bit is the least significant one. Returns `None` if
    /// a bit beyond the 64th is set. Cleared bits beyond it are fine since
    /// size constraints may require them.
    pub fn to_named_bits(&self) -> Option<u64> {
        let mut res = 0u64;
        for bit in 0..self.bit_len() {
            if self.bit(bit) {
                if bit >= 64 {
                    return None
                }
                res |= 1 << bit;
            }
        }
        Some(res)
    }
}

/// # Decoding
///
impl BitString {
    /// Takes a bit string value with the given tag from the source.
    pub fn take_from(
        source: &mut Source, tag: Tag
    ) -> Result<Self, DecodeError> {
        if !source.peek_ident()?.is_constructed() {
            return Self::from_primitive(source.take_primitive(tag)?)
        }
        if source.mode() == Mode::Der {
            return Err(source.content_err(
                "constructed bit string in DER mode"
            ))
        }
        let mut cons = source.enter(tag)?;
        let mut bits = BytesMut::new();
        let mut unused = 0;
        Self::take_segments(&mut cons, &mut bits, &mut unused)?;
        Ok(BitString { unused, bits: bits.freeze() })
    }

    /// Appends the segments of a constructed bit string.
    fn take_segments(
        cons: &mut Source, bits: &mut BytesMut, unused: &mut u8
    ) -> Result<(), DecodeError> {
        while !cons.is_exhausted() {
            if *unused != 0 {
                return Err(cons.content_err(
                    "unused bits in inner bit string segment"
                ))
            }
            if cons.peek_ident()?.is_constructed() {
                let mut inner = cons.enter(Tag::BIT_STRING)?;
                Self::take_segments(&mut inner, bits, unused)?;
            }
            else {
                let segment = Self::from_primitive(
                    cons.take_primitive(Tag::BIT_STRING)?
                )?;
                bits.extend_from_slice(segment.octet_slice());
                *unused = segment.unused;
            }
        }
        Ok(())
    }

    /// Creates a bit string from the content of a primitive value.
    pub fn from_primitive(prim: Primitive) -> Result<Self, DecodeError> {
        let Some((&unused, rest)) = prim.as_slice().split_first() else {
            return Err(prim.content_err("invalid bit string"))
        };
        if unused > 7 || (rest.is_empty() && unused != 0) {
            return Err(prim.content_err("invalid bit string"))
        }
        if prim.mode().is_restricted() && unused > 0 {
            let last = rest.last().copied().unwrap_or(0);
            if last & ((1u8 << unused) - 1) != 0 {
                return Err(prim.content_err(
                    "non-zero unused bits in CER/DER bit string"
                ))
            }
        }
        let mut bits = prim.into_bytes();
        let _ = bits.split_to(1);
        Ok(BitString { unused, bits })
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn take(data: &'static [u8], mode: Mode) -> Result<BitString, DecodeError> {
        let mut source = Source::new(Bytes::from_static(data), mode);
        BitString::take_from(&mut source, Tag::BIT_STRING)
    }

    #[test]
    fn primitive() {
        let bits = take(b"\x03\x03\x06\x6e\x40", Mode::Der).unwrap();
        assert_eq!(bits.unused(), 6);
        assert_eq!(bits.bit_len(), 10);
        assert_eq!(bits.octet_slice(), b"\x6e\x40");
        assert!(!bits.bit(0));
        assert!(bits.bit(1));
        assert!(bits.bit(9));
        assert!(!bits.bit(10));

        assert!(take(b"\x03\x00", Mode::Ber).is_err());
        assert!(take(b"\x03\x01\x01", Mode::Ber).is_err());
        assert!(take(b"\x03\x02\x08\x00", Mode::Ber).is_err());
        assert!(take(b"\x03\x01\x00", Mode::Der).is_ok());
    }

    #[test]
    fn named_bits() {
        let bits = take(b"\x03\x05\x00\x40\x81\x00\x10", Mode::Der).unwrap();
        assert_eq!(
            bits.to_named_bits(),
            Some((1 << 1) | (1 << 8) | (1 << 15) | (1 << 27))
        );
        assert_eq!(
            take(b"\x03\x01\x00", Mode::Der).unwrap().to_named_bits(),
            Some(0)
        );

        let mut data = b"\x03\x0a\x00".to_vec();
        data.extend_from_slice(&[0; 8]);
        data.push(0x80);
        let bits = BitString::take_from(
            &mut Source::new(data, Mode::Der), Tag::BIT_STRING
        ).unwrap();
        assert_eq!(bits.to_named_bits(), None);
    }

    #[test]
    fn unused_bits_in_der() {
        assert!(take(b"\x03\x02\x01\x01", Mode::Ber).is_ok());
        assert!(take(b"\x03\x02\x01\x01", Mode::Der).is_err());
    }

    #[test]
    fn constructed() {
        let data = b"\x23\x09\x03\x02\x00\x0a\x03\x03\x04\x0b\xc0";
        let bits = take(data, Mode::Ber).unwrap();
        assert_eq!(bits.octet_slice(), b"\x0a\x0b\xc0");
        assert_eq!(bits.unused(), 4);
        assert!(take(data, Mode::Der).is_err());

        let data = b"\x23\x09\x03\x02\x04\x0a\x03\x03\x00\x0b\xc0";
        assert!(take(data, Mode::Ber).is_err());
    }
}
