//! The source of encoded data.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::{fmt, ops};
use bytes::Bytes;
use crate::length::Length;
use crate::mode::Mode;
use crate::tag::{Ident, Tag};
use super::error::{ContentError, DecodeError};
use super::primitive::Primitive;


//------------ Source --------------------------------------------------------

/// A reader over a buffer of encoded data.
///
/// The source owns a reference-counted view into the data so that the
/// content of primitive values can be handed out without copying. It keeps
/// track of the position relative to the start of the outermost buffer for
/// error reporting, the encoding rules to enforce, the decoding limits,
/// and how deep into nested constructed values it currently is.
///
/// Entering a constructed value via [`enter`][Self::enter] produces a new
/// source limited to the content of that value and advances this source
/// past the whole value.
#[derive(Clone, Debug)]
pub struct Source {
    /// The data remaining to be read.
    data: Bytes,

    /// The position of the first octet of `data`.
    pos: Pos,

    /// The encoding rules to enforce.
    mode: Mode,

    /// The limits for decoding.
    limits: Limits,

    /// The number of constructed values we are nested in.
    depth: usize,
}

/// # Creation and Information
///
impl Source {
    /// Creates a new source atop the given data using default limits.
    pub fn new(data: impl Into<Bytes>, mode: Mode) -> Self {
        Self::with_limits(data, mode, Limits::default())
    }

    /// Creates a new source with explicit limits.
    pub fn with_limits(
        data: impl Into<Bytes>, mode: Mode, limits: Limits
    ) -> Self {
        Source {
            data: data.into(),
            pos: Pos(0),
            mode,
            limits,
            depth: 0,
        }
    }

    /// Returns an empty source with the same settings as `self`.
    pub fn empty(&self) -> Self {
        Source {
            data: Bytes::new(),
            pos: self.pos,
            mode: self.mode,
            limits: self.limits,
            depth: self.depth,
        }
    }

    /// Returns the encoding rules of the source.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the limits of the source.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Returns the current position of the source.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Returns the nesting depth of the source.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the remaining data.
    pub fn remaining(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Returns whether all data has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an error if there is still data left.
    pub fn check_exhausted(&self) -> Result<(), DecodeError> {
        if self.is_exhausted() {
            Ok(())
        }
        else {
            Err(self.content_err("trailing data"))
        }
    }

    /// Returns a content error at the current position of the source.
    pub fn content_err(&self, err: impl Into<ContentError>) -> DecodeError {
        DecodeError::content(err, self.pos)
    }
}

/// # Reading Headers
///
impl Source {
    /// Returns the identifier octets of the next value without consuming.
    ///
    /// Returns `Ok(None)` if the source is exhausted.
    pub fn peek_opt_ident(&self) -> Result<Option<Ident>, DecodeError> {
        match Ident::parse(self.remaining()) {
            Ok(res) => Ok(res.map(|(ident, _)| ident)),
            Err(err) => Err(err.at(self.pos)),
        }
    }

    /// Returns the identifier octets of the next value without consuming.
    pub fn peek_ident(&self) -> Result<Ident, DecodeError> {
        match self.peek_opt_ident()? {
            Some(ident) => Ok(ident),
            None => Err(self.content_err("unexpected end of data")),
        }
    }

    /// Returns the header of the next value without consuming it.
    ///
    /// The header is checked against the encoding rules. A definite length
    /// that exceeds the remaining data is an error.
    pub fn peek_header(&self) -> Result<Header, DecodeError> {
        let (ident, ident_len) = match Ident::parse(self.remaining()) {
            Ok(Some(res)) => res,
            Ok(None) => {
                return Err(self.content_err("unexpected end of data"))
            }
            Err(err) => return Err(err.at(self.pos)),
        };
        let length_pos = self.pos + Pos(ident_len);
        let (length, length_len) = Length::parse(
            &self.remaining()[ident_len..], self.mode
        ).map_err(|err| err.at(length_pos))?;
        let header_len = ident_len + length_len;

        match length {
            Length::Definite(len) => {
                if ident.is_constructed()
                    && !self.mode.allows_definite_constructed()
                {
                    return Err(DecodeError::content(
                        "definite length constructed value in CER mode",
                        length_pos
                    ))
                }
                if len > self.data.len() - header_len {
                    return Err(DecodeError::content(
                        "unexpected end of data", length_pos
                    ))
                }
            }
            Length::Indefinite => {
                if !ident.is_constructed() {
                    return Err(DecodeError::content(
                        "indefinite length primitive value", length_pos
                    ))
                }
                if !self.mode.allows_indefinite_constructed() {
                    return Err(DecodeError::content(
                        "indefinite length constructed value in DER mode",
                        length_pos
                    ))
                }
            }
        }

        Ok(Header { ident, length, header_len })
    }

    /// Takes the header of the next value from the source.
    pub fn take_header(&mut self) -> Result<Header, DecodeError> {
        let header = self.peek_header()?;
        self.advance(header.header_len);
        Ok(header)
    }
}

/// # Reading Values
///
impl Source {
    /// Takes a primitive value with the given tag.
    ///
    /// Fails if the next value has a different tag or is constructed.
    pub fn take_primitive(
        &mut self, expected: Tag
    ) -> Result<Primitive, DecodeError> {
        let header = self.peek_header()?;
        self.check_tag(header.ident, expected)?;
        if header.ident.is_constructed() {
            return Err(self.content_err(
                format!("expected primitive {}", expected)
            ))
        }
        self.advance(header.header_len);
        let start = self.pos;
        // Primitive values always have a definite length.
        let len = header.length.definite().unwrap_or(0);
        let content = self.take_bytes(len)?;
        Ok(Primitive::new(expected, content, start, self.mode))
    }

    /// Enters a constructed value with the given tag.
    ///
    /// Returns a source limited to the content of the value. This source is
    /// advanced past the whole value, including the end-of-contents marker
    /// of an indefinite length value.
    pub fn enter(&mut self, expected: Tag) -> Result<Source, DecodeError> {
        let header = self.peek_header()?;
        self.check_tag(header.ident, expected)?;
        if !header.ident.is_constructed() {
            return Err(self.content_err(
                format!("expected constructed {}", expected)
            ))
        }
        self.check_depth()?;
        self.advance(header.header_len);
        let start = self.pos;
        let data = match header.length {
            Length::Definite(len) => self.take_bytes(len)?,
            Length::Indefinite => {
                let len = self.indefinite_content_len(self.depth + 1)?;
                let mut data = self.take_bytes(len)?;
                // Drop the end-of-contents octets.
                data.truncate(len - 2);
                data
            }
        };
        Ok(Source {
            data,
            pos: start,
            mode: self.mode,
            limits: self.limits,
            depth: self.depth + 1,
        })
    }

    /// Skips over the next value, whatever it is.
    pub fn skip_value(&mut self) -> Result<(), DecodeError> {
        let len = self.peek_value_len()?;
        self.advance(len);
        Ok(())
    }

    /// Takes the complete encoding of the next value, header included.
    pub fn take_value(&mut self) -> Result<Bytes, DecodeError> {
        let len = self.peek_value_len()?;
        self.take_bytes(len)
    }

    /// Returns the length of the complete encoding of the next value.
    ///
    /// For indefinite length values this walks the content to find the
    /// end-of-contents marker.
    pub fn peek_value_len(&self) -> Result<usize, DecodeError> {
        let header = self.peek_header()?;
        match header.length {
            Length::Definite(len) => Ok(header.header_len + len),
            Length::Indefinite => {
                let mut scan = self.clone();
                scan.advance(header.header_len);
                scan.check_depth()?;
                let len = scan.indefinite_content_len(self.depth + 1)?;
                Ok(header.header_len + len)
            }
        }
    }

    /// Skips the given number of octets.
    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        if len > self.data.len() {
            return Err(self.content_err("unexpected end of data"))
        }
        self.advance(len);
        Ok(())
    }

    /// Takes the given number of octets.
    fn take_bytes(&mut self, len: usize) -> Result<Bytes, DecodeError> {
        if len > self.data.len() {
            return Err(self.content_err("unexpected end of data"))
        }
        self.pos = self.pos + Pos(len);
        Ok(self.data.split_to(len))
    }

    /// Advances the source by `len` octets which must be available.
    fn advance(&mut self, len: usize) {
        let len = len.min(self.data.len());
        self.pos = self.pos + Pos(len);
        let _ = self.data.split_to(len);
    }

    /// Returns the length of indefinite content at the start of the source.
    ///
    /// The returned length includes the end-of-contents marker. The `depth`
    /// is the nesting depth of the content.
    fn indefinite_content_len(
        &self, depth: usize
    ) -> Result<usize, DecodeError> {
        let mut scan = self.clone();
        scan.depth = depth;
        loop {
            let header = scan.take_header()?;
            if header.ident == Ident::END_OF_CONTENTS {
                if !header.length.is_zero() || header.header_len != 2 {
                    return Err(scan.content_err(
                        "invalid end-of-contents marker"
                    ))
                }
                return Ok(scan.pos.0 - self.pos.0)
            }
            match header.length {
                Length::Definite(len) => scan.skip(len)?,
                Length::Indefinite => {
                    scan.check_depth()?;
                    let len = scan.indefinite_content_len(depth + 1)?;
                    scan.skip(len)?;
                }
            }
        }
    }

    fn check_tag(&self, ident: Ident, expected: Tag) -> Result<(), DecodeError> {
        if expected.matches(ident) {
            Ok(())
        }
        else {
            Err(self.content_err(format!(
                "expected value with tag {}, found {}", expected, ident.tag()
            )))
        }
    }

    fn check_depth(&self) -> Result<(), DecodeError> {
        match self.limits.max_depth {
            Some(max) if self.depth >= max => {
                Err(self.content_err("maximum nesting depth exceeded"))
            }
            _ => Ok(())
        }
    }
}


//------------ Header --------------------------------------------------------

/// The identifier and length octets of an encoded value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    /// The identifier octets.
    pub ident: Ident,

    /// The length of the content.
    pub length: Length,

    /// The number of octets taken up by identifier and length octets.
    pub header_len: usize,
}


//------------ Limits --------------------------------------------------------

/// Limits applied while decoding.
///
/// These guard against input crafted to exhaust the stack or memory. A
/// value of `None` disables the respective limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
    /// The maximum nesting depth of constructed values.
    pub max_depth: Option<usize>,

    /// The maximum number of elements in a single collection.
    pub max_elements: Option<usize>,
}

impl Limits {
    /// The default maximum nesting depth.
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// The default maximum number of elements in a collection.
    pub const DEFAULT_MAX_ELEMENTS: usize = 65_536;

    /// Returns limits that don’t limit anything.
    pub const fn unlimited() -> Self {
        Limits { max_depth: None, max_elements: None }
    }

    /// Returns the limits with the maximum nesting depth changed.
    pub const fn with_max_depth(self, max_depth: Option<usize>) -> Self {
        Limits { max_depth, ..self }
    }

    /// Returns the limits with the maximum number of elements changed.
    pub const fn with_max_elements(self, max_elements: Option<usize>) -> Self {
        Limits { max_elements, ..self }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: Some(Self::DEFAULT_MAX_DEPTH),
            max_elements: Some(Self::DEFAULT_MAX_ELEMENTS),
        }
    }
}


//------------ Pos -----------------------------------------------------------

/// The logical position within a source.
///
/// Values of this type can only be used for diagnostics. They can not be used
/// to determine how far a source has been advanced since it was created. This
/// is why we used a newtype.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Pos(usize);

impl From<usize> for Pos {
    fn from(pos: usize) -> Pos {
        Pos(pos)
    }
}

impl ops::Add for Pos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Pos(self.0 + rhs.0)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}
