//! Reusable byte accumulator for in-flight string and number literals.

use std::borrow::Cow;

const INITIAL_CAPACITY: usize = 1024;

/// Grow-on-demand scratch space.
///
/// A decoder owns exactly one `Scratch` and resets it between scalar parses;
/// the contents are consumed in a single burst once the literal is complete.
/// Capacity doubles whenever a write would overflow, so repeated parses
/// settle on the size of the largest literal seen.
#[derive(Debug)]
pub(crate) struct Scratch {
    buf: Vec<u8>,
}

impl Scratch {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.buf.clear();
    }

    /// Appends a single raw byte.
    pub(crate) fn push(&mut self, b: u8) {
        self.buf.push(b);
    }

    /// Appends a code point as UTF-8 (up to four bytes).
    pub(crate) fn push_char(&mut self, ch: char) {
        let mut tmp = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
    }

    /// Current contents as text.
    ///
    /// Raw input bytes that do not form valid UTF-8 are replaced with U+FFFD,
    /// so the result is always well-formed.
    pub(crate) fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    /// Copies the current contents out as an owned string.
    pub(crate) fn take_string(&self) -> String {
        self.as_str().into_owned()
    }
}
