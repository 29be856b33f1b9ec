//! Token payloads and their byte-range decoders.
//!
//! Decoders operate purely on the byte slice the tokenizer hands them; they
//! never touch the source buffer itself. Malformed input yields a partial or
//! empty tag rather than aborting the scan.

use crate::source::Cursor;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Decoder failures. The tokenizer swallows these and keeps scanning at the
/// next `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The tag data did not start with `<`.
    MissingLeftBracket,
    /// A closing tag did not start with `</`.
    MissingSlash,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLeftBracket => write!(f, "missing left bracket"),
            Self::MissingSlash => write!(f, "missing slash"),
        }
    }
}

impl Error for DecodeError {}

/// An opening tag with its decoded attribute map.
///
/// `attrs` is `None` when the tag carried no byte range beyond its name.
/// Empty keys and empty values are never inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenTag {
    /// Tag name as written in the source.
    pub name: String,
    /// Decoded attributes, if an attribute section was present.
    pub attrs: Option<HashMap<String, String>>,
}

/// A closing tag. Attributes and whitespace inside close tags are not
/// supported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseTag {
    /// Tag name as written in the source.
    pub name: String,
}

/// Bounds-checked cursor over a token's byte range.
struct CursorReader<'a> {
    data: &'a [u8],
    cursor: Cursor,
}

impl<'a> CursorReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: Cursor::default(),
        }
    }

    fn byte(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.cursor.end)?;
        self.cursor.end += 1;
        Some(byte)
    }

    fn backward(&mut self) {
        self.cursor.end = self.cursor.end.saturating_sub(1);
    }

    fn mark_start(&mut self) {
        self.cursor.start = self.cursor.end;
    }

    fn taken(&self) -> &'a [u8] {
        &self.data[self.cursor.start..self.cursor.end]
    }

    fn exhausted(&self) -> bool {
        self.cursor.end >= self.data.len()
    }
}

impl OpenTag {
    /// Decodes an open tag from `<name attr="value" ...>` bytes.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = CursorReader::new(data);
        if reader.byte() != Some(b'<') {
            return Err(DecodeError::MissingLeftBracket);
        }

        let mut tag = OpenTag {
            name: read_name(&mut reader),
            attrs: None,
        };
        if reader.exhausted() {
            return Ok(tag);
        }

        let mut attrs = HashMap::new();
        read_attrs(&mut reader, &mut attrs);
        tag.attrs = Some(attrs);
        Ok(tag)
    }
}

impl CloseTag {
    /// Decodes a close tag from `</name>` bytes.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = CursorReader::new(data);
        if reader.byte() != Some(b'<') {
            return Err(DecodeError::MissingLeftBracket);
        }
        if reader.byte() != Some(b'/') {
            return Err(DecodeError::MissingSlash);
        }

        reader.mark_start();
        while let Some(byte) = reader.byte() {
            if byte == b'>' {
                reader.backward();
                break;
            }
        }
        Ok(CloseTag {
            name: String::from_utf8_lossy(reader.taken()).into_owned(),
        })
    }
}

fn read_name(reader: &mut CursorReader<'_>) -> String {
    reader.mark_start();
    while let Some(byte) = reader.byte() {
        match byte {
            b'/' | b'>' | b' ' | b'\n' | b'\r' | b'\t' | b'\x0c' => {
                reader.backward();
                break;
            }
            _ => {}
        }
    }
    String::from_utf8_lossy(reader.taken()).into_owned()
}

fn read_attrs(reader: &mut CursorReader<'_>, attrs: &mut HashMap<String, String>) {
    loop {
        reader.mark_start();
        let Some(byte) = reader.byte() else { return };
        if byte == b'>' {
            return;
        }
        if byte == b' ' {
            reader.mark_start();
        }

        read_attr_key(reader);
        let key = scrub_whitespace(reader.taken());
        reader.mark_start();

        read_attr_value(reader);
        let value = scrub_whitespace(reader.taken());

        match reader.byte() {
            Some(b'\'') | Some(b'"') => {}
            Some(_) => reader.backward(),
            None => {}
        }

        if key.is_empty() || value.is_empty() {
            continue;
        }
        attrs.insert(key, value);
    }
}

fn read_attr_key(reader: &mut CursorReader<'_>) {
    while let Some(byte) = reader.byte() {
        match byte {
            b' ' | b'\n' | b'\r' | b'\t' | b'\x0c' | b'/' | b'=' | b'>' => {
                reader.backward();
                return;
            }
            _ => {}
        }
    }
}

fn read_attr_value(reader: &mut CursorReader<'_>) {
    let Some(byte) = reader.byte() else { return };
    if byte != b'=' {
        // Key-only attribute; the empty value is dropped by the caller.
        reader.backward();
        return;
    }

    loop {
        let Some(quote) = reader.byte() else { return };
        match quote {
            b'>' => {
                reader.backward();
                return;
            }
            b'\'' | b'"' => {
                reader.mark_start();
                while let Some(byte) = reader.byte() {
                    if byte == quote {
                        reader.backward();
                        return;
                    }
                }
                return;
            }
            _ => {}
        }
    }
}

/// Strips layout bytes from text: tabs, carriage returns, linefeeds, and
/// doubled-space runs. Applying it twice yields the same result as once.
pub fn scrub_whitespace(source: &[u8]) -> String {
    let mut out = String::from_utf8_lossy(source).into_owned();
    out.retain(|ch| !matches!(ch, '\t' | '\n' | '\r'));
    while out.contains("  ") {
        out = out.replace("  ", "");
    }
    out
}
