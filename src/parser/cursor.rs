//! Byte-level cursor over a Newick string.
//!
//! [Cursor] provides the peek/consume primitives the Newick parser is built
//! on. It operates on byte slices and assumes ASCII structure characters,
//! with label bytes passed through verbatim.

/// A byte-by-byte cursor with support for peeking, consuming, and
/// position/context extraction for error reporting.
///
/// # Example
/// ```
/// use phylopack::parser::cursor::Cursor;
///
/// let mut cur = Cursor::for_str("(A:1.0,B:2.0);");
/// assert_eq!(cur.peek(), Some(b'('));
/// assert!(cur.consume_if(b'('));
/// assert_eq!(cur.position(), 1);
/// ```
pub struct Cursor<'a> {
    /// Byte slice being parsed
    input: &'a [u8],
    /// Current position of cursor
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new `Cursor` from a string slice.
    pub fn for_str(slice: &'a str) -> Self {
        Cursor {
            input: slice.as_bytes(),
            pos: 0,
        }
    }

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of input (EOF)
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peeks at the byte `ahead` positions past the current one.
    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos + ahead).copied()
    }

    /// Gets the current byte and advances the position (consumes it).
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes the current byte if it matches the target byte.
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skips (consumes) all consecutive whitespace characters.
    ///
    /// Whitespace includes space, tab, newline, and carriage return.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Returns whether the end of input (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset in the input.
    ///
    /// Useful for error messages and tracking parser state.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns a string from up to `k` bytes from the current position
    /// for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement
    /// character.
    pub fn context(&self, k: usize) -> String {
        let end = (self.pos + k).min(self.input.len());
        String::from_utf8_lossy(&self.input[self.pos..end]).into_owned()
    }
}
