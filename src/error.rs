//! Decoder error types.

use std::fmt;
use std::io;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

/// A positioned JSON syntax error.
///
/// Carries the byte that tripped the error, a context phrase describing what
/// the parser was looking for, and the position where it happened: a 1-based
/// line number and the byte column since the last newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub(crate) msg: &'static str,
    pub context: &'static str,
    pub at: u8,
    pub line: usize,
    pub column: usize,
}

/// Template for errors raised on a byte the grammar forbids. The decoder
/// stamps position, offending byte, and context phrase when raising.
pub(crate) const ERR_SYNTAX: SyntaxError = SyntaxError {
    msg: "invalid character",
    context: "",
    at: 0,
    line: 0,
    column: 0,
};

/// Template for errors raised when input ends before a value is complete.
pub(crate) const ERR_UNEXPECTED_EOF: SyntaxError = SyntaxError {
    msg: "unexpected end of JSON input",
    context: "",
    at: 0,
    line: 0,
    column: 0,
};

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(
                f,
                "{}: {} [{},{}]",
                self.msg,
                quote_byte(self.at),
                self.line,
                self.column
            )
        } else {
            write!(
                f,
                "{} {}: {} [{},{}]",
                self.msg,
                self.context,
                quote_byte(self.at),
                self.line,
                self.column
            )
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Formats a byte as a quoted character literal.
fn quote_byte(c: u8) -> String {
    // special cases - different from quoted strings
    match c {
        b'\'' => r"'\''".to_string(),
        b'"' => "'\"'".to_string(),
        _ => format!("'{}'", (c as char).escape_default()),
    }
}

/// Terminal error stored by a decoder run.
///
/// Retrievable from the value stream once it is exhausted; emissions already
/// on the channel stay visible before the error surfaces.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// A byte appeared where the grammar forbids it, or input ended early.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// An integer literal did not fit in an `i64`.
    #[error("numeric literal out of range: {0}")]
    NumberOutOfRange(#[from] ParseIntError),
    /// A numeric literal that classified as a float failed to parse.
    #[error("malformed numeric literal: {0}")]
    MalformedNumber(#[from] ParseFloatError),
    /// The byte source failed with a non-EOF error.
    #[error("read error: {0}")]
    Read(#[from] io::Error),
}

impl DecoderError {
    /// Returns the underlying syntax error, if this is one.
    #[must_use]
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            DecoderError::Syntax(e) => Some(e),
            _ => None,
        }
    }
}
