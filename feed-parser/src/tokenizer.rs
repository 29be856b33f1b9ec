//! Byte-level scanner turning a stream into markup tokens.
//!
//! The scanner walks the source looking for `<` and classifies the byte that
//! follows it. Text accumulated before a tag is emitted first and the tag is
//! re-scanned on the next call. Inside `<script>` elements the scanner stops
//! reporting opening tags until any close tag flips it back to normal, so
//! script bodies are never mistaken for markup.
//!
//! A text segment still buffered when the stream ends is discarded together
//! with any partially scanned tag.

use crate::source::{ByteSource, Cursor, SourceError};
use crate::token::{CloseTag, OpenTag};
use std::io::Read;

const SCRIPT_TAG: &str = "script";

/// One scanned token. Text and comment payloads borrow the tokenizer's
/// buffer and must be consumed before the next call rewrites the window.
#[derive(Debug)]
pub enum Token<'a> {
    /// An opening tag with decoded attributes.
    Open(OpenTag),
    /// A closing tag.
    Close(CloseTag),
    /// Raw text bytes between tags.
    Text(&'a [u8]),
    /// Comment, doctype, or processing-instruction bytes, `<` through `>`.
    Comment(&'a [u8]),
    /// An opening tag suppressed inside script content.
    Skip,
    /// The stream ended or failed; every later call repeats this.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    ScriptContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Open,
    Close,
    Comment,
}

/// Streaming tokenizer over any byte source.
pub struct Tokenizer<R> {
    src: ByteSource<R>,
    data: Cursor,
    state: ScanState,
}

impl<R: Read> Tokenizer<R> {
    /// Wraps `source` in a fresh tokenizer.
    pub fn new(source: R) -> Self {
        Self {
            src: ByteSource::new(source),
            data: Cursor::default(),
            state: ScanState::Normal,
        }
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token<'_> {
        self.src.collapse_start();
        self.data = Cursor::at(self.src.pos());
        if self.src.failed() {
            return Token::Error;
        }

        loop {
            let Some(byte) = self.src.read_byte(&mut self.data) else {
                break;
            };
            if byte != b'<' {
                continue;
            }

            // Peek the byte after `<` to classify the upcoming token.
            let Some(next) = self.src.read_byte(&mut self.data) else {
                break;
            };

            let kind = match next {
                b'a'..=b'z' | b'A'..=b'Z' => TokenKind::Open,
                b'/' => TokenKind::Close,
                b'!' | b'?' => {
                    // Keep `<` and the prefix inside the comment data.
                    self.src.rewind(2);
                    TokenKind::Comment
                }
                _ => {
                    self.src.rewind(1);
                    continue;
                }
            };

            // Text gathered before the tag goes out first; the tag itself is
            // re-scanned on the next call.
            if kind != TokenKind::Comment {
                let text_end = self.src.pos().saturating_sub(2);
                if self.src.start() < text_end {
                    self.src.set_pos(text_end);
                    self.data.end = text_end;
                    return Token::Text(self.src.slice(self.data));
                }
            }

            match kind {
                TokenKind::Comment => {
                    self.read_until_close_bracket();
                    return Token::Comment(self.src.slice(self.data));
                }
                TokenKind::Open => {
                    if self.state != ScanState::Normal {
                        return Token::Skip;
                    }
                    self.scan_tag();

                    let tag = OpenTag::parse(self.src.slice(self.data)).unwrap_or_default();
                    if tag.name == SCRIPT_TAG {
                        self.state = ScanState::ScriptContent;
                    }
                    return Token::Open(tag);
                }
                TokenKind::Close => {
                    self.scan_tag();
                    if self.src.failed() {
                        return Token::Error;
                    }

                    let tag = CloseTag::parse(self.src.slice(self.data)).unwrap_or_default();
                    self.state = ScanState::Normal;
                    return Token::Close(tag);
                }
            }
        }

        Token::Error
    }

    /// The sticky source failure, if any.
    pub fn error(&self) -> Option<&SourceError> {
        self.src.error()
    }

    /// Consumes the tokenizer, yielding the sticky source failure, if any.
    pub fn into_error(self) -> Option<SourceError> {
        self.src.into_error()
    }

    /// Advances to the closing `>` of a tag, starting two bytes back so the
    /// `<` and classifying byte are part of the data range.
    fn scan_tag(&mut self) {
        self.data.start = self.src.pos() - 2;
        self.data.end = self.src.pos();

        loop {
            let Some(byte) = self.src.read_byte(&mut self.data) else {
                break;
            };
            if byte == b'>' {
                self.data.end = self.src.pos();
                break;
            }
        }
    }

    fn read_until_close_bracket(&mut self) {
        self.data.start = self.src.pos();
        loop {
            match self.src.read_byte(&mut self.data) {
                None | Some(b'>') => {
                    self.data.end = self.src.pos();
                    return;
                }
                Some(_) => {}
            }
        }
    }
}
