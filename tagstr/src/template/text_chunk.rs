use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// A literal run of template text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextChunk {
    raw: String,
    decoded: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid escape at byte {position}: {message}")]
pub struct EscapeError {
    pub position: usize,
    pub message: String,
}

impl TextChunk {
    /// Wrap text that is already decoded. `raw()` returns the same text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        TextChunk {
            raw: text.clone(),
            decoded: text,
        }
    }

    /// Decode backslash escapes in `raw`, keeping the raw form alongside.
    pub fn decode(raw: impl Into<String>) -> Result<Self, EscapeError> {
        let raw = raw.into();
        let decoded = decode_escapes(&raw)?;
        Ok(TextChunk { raw, decoded })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn as_str(&self) -> &str {
        &self.decoded
    }

    pub fn is_empty(&self) -> bool {
        self.decoded.is_empty()
    }

    pub(crate) fn append(&mut self, other: &TextChunk) {
        self.raw.push_str(&other.raw);
        self.decoded.push_str(&other.decoded);
    }
}

/// Resolve string-literal escapes. Non-ASCII text passes through untouched
/// and unknown escapes are kept verbatim, backslash included.
pub fn decode_escapes(raw: &str) -> Result<String, EscapeError> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, escape)) = chars.next() else {
            return Err(EscapeError {
                position: pos,
                message: "\\ at end of string".into(),
            });
        };
        match escape {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&(_, d)) if d.is_digit(8) => {
                            code = code * 8 + d.to_digit(8).unwrap_or(0);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(code_point(code, pos)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2, pos)?),
            'u' => out.push(hex_escape(&mut chars, 4, pos)?),
            'U' => out.push(hex_escape(&mut chars, 8, pos)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn hex_escape(
    chars: &mut Peekable<CharIndices<'_>>,
    digits: usize,
    pos: usize,
) -> Result<char, EscapeError> {
    let mut code = 0u32;
    for _ in 0..digits {
        match chars.next() {
            Some((_, d)) if d.is_ascii_hexdigit() => {
                code = code * 16 + d.to_digit(16).unwrap_or(0);
            }
            _ => {
                return Err(EscapeError {
                    position: pos,
                    message: format!("truncated escape, expected {} hex digits", digits),
                });
            }
        }
    }
    code_point(code, pos)
}

fn code_point(code: u32, pos: usize) -> Result<char, EscapeError> {
    char::from_u32(code).ok_or_else(|| EscapeError {
        position: pos,
        message: format!("U+{:X} is not a valid character", code),
    })
}
