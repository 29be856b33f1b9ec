//! Growable sliding-window buffer over an input byte stream.

use std::error::Error;
use std::fmt;
use std::io::{self, Read};

const MIN_CAPACITY: usize = 64;

/// Byte range into the source buffer.
///
/// Offsets are re-based whenever the buffer recycles its consumed prefix, so
/// a cursor handed to [`ByteSource::read_byte`] keeps pointing at the same
/// logical bytes across refills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Offset of the first byte in the range.
    pub start: usize,
    /// Offset one past the last byte in the range.
    pub end: usize,
}

impl Cursor {
    /// A collapsed range starting and ending at `pos`.
    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Failure modes of the underlying stream. Both are sticky: once set, every
/// subsequent read reports no more bytes.
#[derive(Debug)]
pub enum SourceError {
    /// The upstream read returned zero bytes with no error.
    EndOfStream,
    /// The upstream read failed.
    Io(io::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => write!(f, "end of stream"),
            Self::Io(err) => write!(f, "source read error: {err}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EndOfStream => None,
            Self::Io(err) => Some(err),
        }
    }
}

/// Sliding window over a byte stream with two cursors: `reader.start` marks
/// the oldest byte still referenced, `reader.end` the next byte to produce.
///
/// When the read head runs past the buffered bytes, the consumed prefix
/// `[0, reader.start)` is dropped by copying the live region to offset zero
/// and fresh bytes are pulled from the source into the tail. Capacity doubles
/// whenever the live region would exceed half of it.
pub struct ByteSource<R> {
    source: R,
    buf: Vec<u8>,
    reader: Cursor,
    err: Option<SourceError>,
}

impl<R: Read> ByteSource<R> {
    /// Wraps `source` with an empty window.
    pub fn new(source: R) -> Self {
        Self {
            source,
            buf: Vec::with_capacity(MIN_CAPACITY),
            reader: Cursor::default(),
            err: None,
        }
    }

    /// Produces the next byte, refilling from the source when the window is
    /// exhausted. `anchor` is re-based by the compaction shift so that callers
    /// holding offsets into the window stay valid.
    ///
    /// Returns `None` once the stream has ended or failed; the condition is
    /// sticky and can be inspected through [`ByteSource::error`].
    pub fn read_byte(&mut self, anchor: &mut Cursor) -> Option<u8> {
        if self.reader.end >= self.buf.len() {
            if self.err.is_some() {
                return None;
            }
            self.refill(anchor);
            if self.reader.end >= self.buf.len() {
                return None;
            }
        }

        let byte = self.buf[self.reader.end];
        self.reader.end += 1;
        Some(byte)
    }

    fn refill(&mut self, anchor: &mut Cursor) {
        let live = self.reader.end - self.reader.start;
        let shift = self.reader.start;

        if 2 * live > self.buf.capacity() {
            let mut grown = Vec::with_capacity((2 * self.buf.capacity()).max(MIN_CAPACITY));
            grown.extend_from_slice(&self.buf[self.reader.start..self.reader.end]);
            self.buf = grown;
        } else {
            self.buf.copy_within(self.reader.start..self.reader.end, 0);
            self.buf.truncate(live);
        }

        if shift > 0 {
            anchor.start = anchor.start.saturating_sub(shift);
            anchor.end = anchor.end.saturating_sub(shift);
        }
        self.reader = Cursor {
            start: 0,
            end: live,
        };

        let filled = self.buf.len();
        self.buf.resize(self.buf.capacity(), 0);
        match self.source.read(&mut self.buf[filled..]) {
            Ok(0) => {
                self.buf.truncate(filled);
                self.err = Some(SourceError::EndOfStream);
            }
            Ok(n) => self.buf.truncate(filled + n),
            Err(err) => {
                self.buf.truncate(filled);
                self.err = Some(SourceError::Io(err));
            }
        }
    }

    /// Borrows the bytes covered by `range`. The slice is only valid until
    /// the next refill rewrites the window.
    pub fn slice(&self, range: Cursor) -> &[u8] {
        &self.buf[range.start..range.end.min(self.buf.len())]
    }

    /// Current position of the read head.
    pub fn pos(&self) -> usize {
        self.reader.end
    }

    /// Oldest offset still referenced.
    pub fn start(&self) -> usize {
        self.reader.start
    }

    /// Moves the read head back by `n` bytes.
    pub fn rewind(&mut self, n: usize) {
        self.reader.end = self.reader.end.saturating_sub(n);
    }

    /// Moves the read head to an absolute offset.
    pub fn set_pos(&mut self, pos: usize) {
        self.reader.end = pos;
    }

    /// Drops the claim on everything before the read head, allowing the next
    /// refill to recycle those bytes.
    pub fn collapse_start(&mut self) {
        self.reader.start = self.reader.end;
    }

    /// Whether the stream has ended or failed.
    pub fn failed(&self) -> bool {
        self.err.is_some()
    }

    /// The sticky failure, if any.
    pub fn error(&self) -> Option<&SourceError> {
        self.err.as_ref()
    }

    /// Consumes the source, yielding the sticky failure, if any.
    pub fn into_error(self) -> Option<SourceError> {
        self.err
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteSource, Cursor};

    /// Reader that hands out at most `chunk` bytes per call, forcing frequent
    /// refills.
    struct Trickle {
        data: Vec<u8>,
        offset: usize,
        chunk: usize,
    }

    impl Trickle {
        fn new(data: &[u8], chunk: usize) -> Self {
            Self {
                data: data.to_vec(),
                offset: 0,
                chunk,
            }
        }
    }

    impl std::io::Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self
                .chunk
                .min(buf.len())
                .min(self.data.len() - self.offset);
            buf[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
            self.offset += n;
            Ok(n)
        }
    }

    #[test]
    fn reads_entire_stream_byte_by_byte() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let mut src = ByteSource::new(Trickle::new(input, 3));
        let mut anchor = Cursor::default();

        let mut collected = Vec::new();
        while let Some(byte) = src.read_byte(&mut anchor) {
            collected.push(byte);
            src.collapse_start();
        }

        assert_eq!(collected, input);
    }

    #[test]
    fn compaction_preserves_anchored_slices() {
        let mut input = Vec::new();
        for i in 0..240u8 {
            input.push(b'a' + (i % 26));
        }
        let mut src = ByteSource::new(Trickle::new(&input, 7));
        let mut anchor = Cursor::default();

        // Consume a prefix and release it so later refills shift the window.
        for _ in 0..100 {
            src.read_byte(&mut anchor).expect("prefix byte");
            src.collapse_start();
        }

        // Anchor a range and keep reading through several refills.
        anchor = Cursor::at(src.pos());
        for _ in 0..80 {
            src.read_byte(&mut anchor).expect("anchored byte");
        }
        anchor.end = src.pos();

        assert_eq!(src.slice(anchor), &input[100..180]);
    }

    #[test]
    fn end_of_stream_is_sticky() {
        let mut src = ByteSource::new(Trickle::new(b"ab", 2));
        let mut anchor = Cursor::default();

        assert_eq!(src.read_byte(&mut anchor), Some(b'a'));
        assert_eq!(src.read_byte(&mut anchor), Some(b'b'));
        assert_eq!(src.read_byte(&mut anchor), None);
        assert!(src.failed());
        assert_eq!(src.read_byte(&mut anchor), None);
    }
}
