//! Error Handling.
//!
//! This is a private module. Its public content is being re-exported by the
//! parent module.

use std::{error, fmt};
use std::borrow::Cow;
use super::source::Pos;


//------------ ContentError --------------------------------------------------

/// An error happened while interpreting the content of encoded data.
///
/// The error only carries a message. It is turned into a [`DecodeError`]
/// by attaching the position in the data where it happened.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContentError {
    message: Cow<'static, str>,
}

impl ContentError {
    /// Creates a content error from a static str.
    pub const fn from_static(msg: &'static str) -> Self {
        ContentError { message: Cow::Borrowed(msg) }
    }

    /// Creates a content error from an owned string.
    pub fn from_string(msg: String) -> Self {
        ContentError { message: Cow::Owned(msg) }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts the error into a decode error at the given position.
    pub fn at(self, pos: Pos) -> DecodeError {
        DecodeError::new(self, pos)
    }
}

impl From<&'static str> for ContentError {
    fn from(s: &'static str) -> Self {
        Self::from_static(s)
    }
}

impl From<String> for ContentError {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for ContentError { }


//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding data.
///
/// The error consists of the content error that describes what went wrong,
/// the position in the data where it was detected, and a chain of context
/// strings naming the fields and types that were being decoded. The chain
/// is stored innermost first and displayed outermost first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeError {
    error: ContentError,
    pos: Pos,
    context: Vec<Cow<'static, str>>,
}

impl DecodeError {
    /// Creates a decode error from a content error and a position.
    pub fn new(error: ContentError, pos: Pos) -> Self {
        DecodeError { error, pos, context: Vec::new() }
    }

    /// Creates a content error at the given position.
    pub fn content(error: impl Into<ContentError>, pos: Pos) -> Self {
        Self::new(error.into(), pos)
    }

    /// Adds an outer context to the error.
    pub fn context(mut self, ctx: impl Into<Cow<'static, str>>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Returns the content error.
    pub fn error(&self) -> &ContentError {
        &self.error
    }

    /// Returns the position at which the error was detected.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Returns an iterator over the context, outermost first.
    pub fn context_chain(&self) -> impl Iterator<Item = &str> + '_ {
        self.context.iter().rev().map(AsRef::as_ref)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for ctx in self.context_chain() {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{} (at position {})", self.error, self.pos)
    }
}

impl error::Error for DecodeError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_with_context() {
        let err = ContentError::from_static("unexpected end of data")
            .at(Pos::from(12))
            .context("field 'realm'")
            .context("KRB-ERROR");
        assert_eq!(
            err.to_string(),
            "KRB-ERROR: field 'realm': unexpected end of data \
             (at position 12)"
        );
        assert_eq!(err.pos(), Pos::from(12));
        assert_eq!(err.error().message(), "unexpected end of data");
    }
}
