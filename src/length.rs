//! The length octets.
//!
//! This is a private module. Its public items are re-exported by the parent.

use crate::decode::ContentError;
use crate::mode::Mode;


//------------ Length -------------------------------------------------------

/// The length octets of an encoded value.
///
/// A length value can either be definite, meaning it provides the actual
/// number of content octets in the value, or indefinite, in which case the
/// content is delimited by a special end-of-value marker.
///
/// # BER Encoding
///
/// The length can be encoded in one of two basic ways. Which one is used is
/// determined by the most significant bit of the first octet. If it is not
/// set, the length octets is one octet long and the remaining bits of this
/// first octet provide the definite length. Thus, if the first octet is
/// less than 128, it provides the definite length already.
///
/// If the most significant bit is set, the remaining bits of the first
/// octet specify the number of octets that follow to encode the actual
/// length. If they specify that there are zero more octets, i.e., the
/// value of the first octet is 128, the length is indefinite. Otherwise,
/// those following octets give the big-endian encoding of the definite
/// length of the content octets.
///
/// Under both CER and DER rules, a definite length must be encoded in the
/// minimum number of octets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Length {
    /// A length value in its definite form.
    Definite(usize),

    /// A length value in its indefinite form.
    Indefinite,
}

impl Length {
    /// Returns the length if it is definite.
    pub fn definite(self) -> Option<usize> {
        match self {
            Length::Definite(len) => Some(len),
            Length::Indefinite => None,
        }
    }

    /// Returns whether the length is definite and zero.
    pub fn is_zero(self) -> bool {
        self == Length::Definite(0)
    }

    /// Parses the length octets at the start of `data`.
    ///
    /// Returns the length and the number of octets it occupies.
    pub fn parse(
        data: &[u8], mode: Mode
    ) -> Result<(Self, usize), ContentError> {
        let len = match FirstOctet::parse(data)? {
            FirstOctet::Single(res) => return Ok((res, 1)),
            FirstOctet::Multi(len) => len,
        };
        let Some(octets) = data.get(1..len + 1) else {
            return Err(ContentError::from_static("unexpected end of data"))
        };

        // The difference between BER and CER/DER is that in the latter the
        // second octet can’t be zero and it can’t be less than 0x80 if it is
        // the last octet as well. In both cases, there is a shorter
        // encoding.
        if mode.is_restricted() {
            if octets[0] == 0 || (octets[0] < 0x80 && len == 1) {
                return Err(ContentError::from_static(
                    "illegal length in CER/DER"
                ))
            }
        }

        // Leading zeros don’t count towards the size limit.
        let start = octets.iter().position(|&x| x != 0).unwrap_or(len);
        let significant = &octets[start..];
        if significant.len() > Self::USIZE_LEN {
            return Err(ContentError::from_static("excessive length"))
        }

        let res = significant.iter().fold(0usize, |res, &octet| {
            (res << 8) | usize::from(octet)
        });
        Ok((Length::Definite(res), len + 1))
    }

    const USIZE_LEN: usize = 0usize.to_ne_bytes().len();
}


//------------ FirstOctet ---------------------------------------------------

/// The first octet of the encoded length.
enum FirstOctet {
    /// The first octet is a length in and of itself.
    Single(Length),

    /// The first octet indicates the number of octets to follow.
    Multi(usize),
}

impl FirstOctet {
    /// Look at the first octet and check what it means.
    fn parse(data: &[u8]) -> Result<Self, ContentError> {
        match data.first() {
            None => Err(ContentError::from_static("unexpected end of data")),

            // Bit 7 clear: single.
            Some(&n) if (n & 0x80) == 0 => {
                Ok(Self::Single(Length::Definite(n.into())))
            }

            // 0x80: indefinite.
            Some(0x80) => Ok(Self::Single(Length::Indefinite)),

            // 0xFF: illegal.
            Some(0xFF) => {
                Err(ContentError::from_static("illegal length octets"))
            }

            // anything else: clear left bit, number of octets.
            Some(&n) => Ok(Self::Multi((n & 0x7F).into()))
        }
    }
}


//============ Tests =========================================================
