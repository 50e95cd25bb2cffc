//! Buffered line extraction over one readable source.
//!
//! [`LineBuffer`] separates blocking IO ([`LineBuffer::fill`]) from pure
//! parsing ([`LineBuffer::next_line`]) so callers can implement both "read
//! until the end-of-response line" (daemon client) and "read to end of
//! stream, then take the first line" (script output capture) against a
//! single primitive. The buffer assigns no meaning to an empty line; that
//! is a caller-defined end-of-message marker.

use std::collections::TryReserveError;
use std::io::{self, Read};

use thiserror::Error;

/// Bytes requested from the source per [`LineBuffer::fill`] call.
const READ_CHUNK: usize = 1024;

/// Errors raised while filling or allocating the line buffer.
#[derive(Debug, Error)]
pub enum BufError {
    /// Backing storage could not be obtained. Fatal to the operation, not
    /// the process.
    #[error("failed to allocate line buffer storage: {0}")]
    Alloc(#[from] TryReserveError),
    /// Reading from the bound source failed.
    #[error("failed to read into line buffer: {0}")]
    Io(#[from] io::Error),
}

/// Growable byte buffer bound to one readable source for its lifetime.
///
/// Invariant: the read cursor never passes the fill level, and bytes before
/// the cursor have already been returned as complete lines. Only
/// [`LineBuffer::fill`] appends bytes; only line extraction advances the
/// cursor. Dropping the buffer releases its storage but never closes the
/// underlying descriptor; callers keep ownership by binding a `&mut`
/// reader.
pub struct LineBuffer<R> {
    reader: R,
    data: Vec<u8>,
    cursor: usize,
}

impl<R: Read> LineBuffer<R> {
    /// Binds a buffer to `reader`.
    pub fn new(reader: R) -> Result<Self, BufError> {
        let mut data = Vec::new();
        data.try_reserve(READ_CHUNK)?;
        Ok(Self {
            reader,
            data,
            cursor: 0,
        })
    }

    /// Performs one read of available bytes, growing storage as needed.
    ///
    /// Returns the number of bytes read; `0` means the peer closed the
    /// stream. Callers loop until `0` or until enough data is buffered.
    pub fn fill(&mut self) -> Result<usize, BufError> {
        let mut chunk = [0_u8; READ_CHUNK];
        let read = self.reader.read(&mut chunk).map_err(BufError::Io)?;
        if let Some(received) = chunk.get(..read) {
            self.data.try_reserve(received.len())?;
            self.data.extend_from_slice(received);
        }
        Ok(read)
    }

    /// Extracts the next complete line, resolving backslash escapes.
    ///
    /// Scans from the cursor for an unescaped newline. When one is found the
    /// line is decoded, the terminator stripped, and the cursor advanced past
    /// it. `None` means no complete line is buffered yet, which is not an
    /// error; callers [`fill`](Self::fill) and retry.
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.find_unescaped_newline()?;
        // The scan bounds the newline position by the fill level.
        let decoded = decode_escapes(self.data.get(self.cursor..newline)?);
        self.cursor = newline + 1;
        Some(String::from_utf8_lossy(&decoded).into_owned())
    }

    /// Returns unterminated trailing bytes as a final decoded line.
    ///
    /// Used at end-of-stream when the source closed without a terminator.
    /// `None` when the cursor already sits at the fill level.
    pub fn take_remaining(&mut self) -> Option<String> {
        if self.cursor >= self.data.len() {
            return None;
        }
        let decoded = decode_escapes(self.pending());
        self.cursor = self.data.len();
        Some(String::from_utf8_lossy(&decoded).into_owned())
    }

    /// Duplicates the bytes from the cursor to the first newline, undecoded.
    ///
    /// The cursor is not moved and no escape scan is performed; this is the
    /// cheap path for callers that only ever want one line, such as script
    /// output capture. `None` when nothing is buffered past the cursor.
    #[must_use]
    pub fn first_raw_line(&self) -> Option<Vec<u8>> {
        let pending = self.pending();
        if pending.is_empty() {
            return None;
        }
        let line = pending.split(|&byte| byte == b'\n').next().unwrap_or(pending);
        Some(line.to_vec())
    }

    /// Repositions the read cursor, clamped to the fill level.
    ///
    /// Lets a caller re-parse a freshly received response from the start.
    pub fn seek(&mut self, offset: usize) {
        self.cursor = offset.min(self.data.len());
    }

    /// Current fill level in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes between the cursor and the fill level.
    fn pending(&self) -> &[u8] {
        self.data.get(self.cursor..).unwrap_or_default()
    }

    fn find_unescaped_newline(&self) -> Option<usize> {
        let mut escaped = false;
        for (index, &byte) in self.pending().iter().enumerate() {
            if escaped {
                escaped = false;
                continue;
            }
            match byte {
                b'\\' => escaped = true,
                b'\n' => return Some(self.cursor + index),
                _ => {}
            }
        }
        None
    }
}

/// Resolves backslash escapes: `\X` becomes `X` for any byte `X`.
///
/// A dangling backslash at the end of the slice is kept verbatim.
fn decode_escapes(raw: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter();
    while let Some(&byte) = bytes.next() {
        if byte == b'\\' {
            decoded.push(bytes.next().copied().unwrap_or(b'\\'));
        } else {
            decoded.push(byte);
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests fail loudly on setup errors")]

    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn buffer_over(bytes: &[u8]) -> LineBuffer<Cursor<Vec<u8>>> {
        LineBuffer::new(Cursor::new(bytes.to_vec())).expect("allocate buffer")
    }

    fn fill_to_end(buffer: &mut LineBuffer<Cursor<Vec<u8>>>) {
        while buffer.fill().expect("fill buffer") > 0 {}
    }

    #[test]
    fn extracts_lines_in_order() {
        let mut buffer = buffer_over(b"first\nsecond\n");
        fill_to_end(&mut buffer);
        assert_eq!(buffer.next_line().as_deref(), Some("first"));
        assert_eq!(buffer.next_line().as_deref(), Some("second"));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn incomplete_line_is_not_an_error() {
        let mut buffer = buffer_over(b"no terminator yet");
        fill_to_end(&mut buffer);
        assert_eq!(buffer.next_line(), None);
        assert_eq!(
            buffer.take_remaining().as_deref(),
            Some("no terminator yet")
        );
        assert_eq!(buffer.take_remaining(), None);
    }

    #[test]
    fn escaped_newline_does_not_terminate() {
        let mut buffer = buffer_over(b"one\\\ntwo\n");
        fill_to_end(&mut buffer);
        assert_eq!(buffer.next_line().as_deref(), Some("one\ntwo"));
        assert_eq!(buffer.next_line(), None);
    }

    #[rstest]
    #[case(b"say \\\"hi\\\"\n".as_slice(), "say \"hi\"")]
    #[case(b"back\\\\slash\n".as_slice(), "back\\slash")]
    #[case(b"tick\\'mark\n".as_slice(), "tick'mark")]
    fn resolves_backslash_escapes(#[case] raw: &[u8], #[case] expected: &str) {
        let mut buffer = buffer_over(raw);
        fill_to_end(&mut buffer);
        assert_eq!(buffer.next_line().as_deref(), Some(expected));
    }

    #[test]
    fn empty_line_is_returned_verbatim() {
        let mut buffer = buffer_over(b"data\n\n");
        fill_to_end(&mut buffer);
        assert_eq!(buffer.next_line().as_deref(), Some("data"));
        assert_eq!(buffer.next_line().as_deref(), Some(""));
    }

    #[test]
    fn seek_allows_reparsing_from_the_start() {
        let mut buffer = buffer_over(b"alpha\nbeta\n");
        fill_to_end(&mut buffer);
        assert_eq!(buffer.next_line().as_deref(), Some("alpha"));
        buffer.seek(0);
        assert_eq!(buffer.next_line().as_deref(), Some("alpha"));
        assert_eq!(buffer.next_line().as_deref(), Some("beta"));
    }

    #[test]
    fn seek_clamps_to_the_fill_level() {
        let mut buffer = buffer_over(b"ab\n");
        fill_to_end(&mut buffer);
        buffer.seek(1024);
        assert_eq!(buffer.next_line(), None);
        assert_eq!(buffer.take_remaining(), None);
    }

    #[test]
    fn first_raw_line_leaves_cursor_and_escapes_alone() {
        let mut buffer = buffer_over(b"raw \\\"line\nrest\n");
        fill_to_end(&mut buffer);
        assert_eq!(
            buffer.first_raw_line().as_deref(),
            Some(b"raw \\\"line".as_slice())
        );
        // The cursor did not move; decoding still sees the whole line.
        assert_eq!(buffer.next_line().as_deref(), Some("raw \"line"));
    }

    #[test]
    fn first_raw_line_without_terminator_returns_everything() {
        let mut buffer = buffer_over(b"lonely tail");
        fill_to_end(&mut buffer);
        assert_eq!(
            buffer.first_raw_line().as_deref(),
            Some(b"lonely tail".as_slice())
        );
    }

    #[test]
    fn first_raw_line_on_empty_buffer_is_none() {
        let buffer = buffer_over(b"");
        assert_eq!(buffer.first_raw_line(), None);
    }

    #[test]
    fn fill_level_reports_emptiness_and_byte_count() {
        let mut buffer = buffer_over(b"ping\n");
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        fill_to_end(&mut buffer);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.len(), 5);
        // Extracting a line moves the cursor, not the fill level.
        assert_eq!(buffer.next_line().as_deref(), Some("ping"));
        assert!(!buffer.is_empty());
    }

    #[test]
    fn fill_grows_past_the_initial_chunk() {
        let payload = vec![b'x'; READ_CHUNK * 3];
        let mut buffer = buffer_over(&payload);
        fill_to_end(&mut buffer);
        assert_eq!(buffer.len(), READ_CHUNK * 3);
    }

    #[test]
    fn fill_reports_end_of_stream_as_zero() {
        let mut buffer = buffer_over(b"tail");
        fill_to_end(&mut buffer);
        assert_eq!(buffer.fill().expect("fill after eof"), 0);
    }
}
