//! Incremental HTML tokenizer.
//!
//! Input may arrive in arbitrary pieces: a construct that is cut off at the
//! end of the buffer waits for the next [`Tokenizer::feed`] call, and
//! [`Tokenizer::close`] flushes whatever is left as text.

/// An attribute as written: name plus value, `None` when no `=` followed.
pub type RawAttr = (String, Option<String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attrs: Vec<RawAttr>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// `<//>`: closes whatever element is open.
    GenericClose,
    Text(String),
}

/// Outcome of trying to read markup at a `<`.
enum Markup {
    Token(Token, usize),
    Skip(usize),
    /// Not markup after all; the `<` is literal text.
    Literal,
    Incomplete,
}

#[derive(Debug, Default)]
pub struct Tokenizer {
    buffer: String,
    /// Set inside `<script>`/`<style>` until the matching end tag.
    raw_text: Option<String>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, input: &str) -> Vec<Token> {
        self.buffer.push_str(input);
        self.drain(false)
    }

    pub fn close(&mut self) -> Vec<Token> {
        self.drain(true)
    }

    fn drain(&mut self, eof: bool) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < self.buffer.len() {
            let rest = &self.buffer[pos..];

            if let Some(raw) = &self.raw_text {
                let needle = format!("</{}", raw);
                match rest.to_ascii_lowercase().find(&needle) {
                    Some(end) => {
                        if end > 0 {
                            tokens.push(Token::Text(rest[..end].to_string()));
                        }
                        pos += end;
                        self.raw_text = None;
                        continue;
                    }
                    None if eof => {
                        tokens.push(Token::Text(rest.to_string()));
                        pos = self.buffer.len();
                    }
                    None => {}
                }
                break;
            }

            match rest.find('<') {
                Some(0) => match read_markup(rest) {
                    Markup::Token(token, consumed) => {
                        if let Token::StartTag {
                            name,
                            self_closing: false,
                            ..
                        } = &token
                            && matches!(name.as_str(), "script" | "style")
                        {
                            self.raw_text = Some(name.clone());
                        }
                        tokens.push(token);
                        pos += consumed;
                    }
                    Markup::Skip(consumed) => pos += consumed,
                    Markup::Literal => {
                        let end = rest[1..].find('<').map_or(rest.len(), |i| i + 1);
                        push_text(&mut tokens, &rest[..end]);
                        pos += end;
                    }
                    Markup::Incomplete if eof => {
                        push_text(&mut tokens, rest);
                        pos = self.buffer.len();
                    }
                    Markup::Incomplete => break,
                },
                Some(next) => {
                    push_text(&mut tokens, &rest[..next]);
                    pos += next;
                }
                None => {
                    let keep = if eof { rest.len() } else { entity_safe_len(rest) };
                    push_text(&mut tokens, &rest[..keep]);
                    pos += keep;
                    break;
                }
            }
        }

        self.buffer.drain(..pos);
        tokens
    }
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if !text.is_empty() {
        tokens.push(Token::Text(decode_entities(text)));
    }
}

/// Length of the prefix of `text` that cannot end inside a character
/// reference still being typed.
fn entity_safe_len(text: &str) -> usize {
    match text.rfind('&') {
        Some(amp) => {
            let tail = &text[amp + 1..];
            let partial = tail.len() <= 10
                && !tail.contains(';')
                && tail.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
            if partial { amp } else { text.len() }
        }
        None => text.len(),
    }
}

fn read_markup(input: &str) -> Markup {
    let bytes = input.as_bytes();
    let Some(&next) = bytes.get(1) else {
        return Markup::Incomplete;
    };
    match next {
        b'!' if input.starts_with("<!--") => match input[4..].find("-->") {
            Some(end) => Markup::Skip(4 + end + 3),
            None => Markup::Incomplete,
        },
        b'!' if "<!--".starts_with(input) => Markup::Incomplete,
        b'!' | b'?' => match input.find('>') {
            Some(end) => Markup::Skip(end + 1),
            None => Markup::Incomplete,
        },
        b'/' => read_end_tag(input),
        c if c.is_ascii_alphabetic() => read_start_tag(input),
        _ => Markup::Literal,
    }
}

fn read_end_tag(input: &str) -> Markup {
    if input.starts_with("<//>") {
        return Markup::Token(Token::GenericClose, 4);
    }
    let Some(end) = input.find('>') else {
        return Markup::Incomplete;
    };
    let inner = input[2..end].trim();
    match inner.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {
            let name = inner
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or_default()
                .to_lowercase();
            Markup::Token(Token::EndTag { name }, end + 1)
        }
        // `</>` and bogus `</ ...>` constructs are dropped.
        _ => Markup::Skip(end + 1),
    }
}

fn read_start_tag(input: &str) -> Markup {
    let mut cursor = Cursor { input, pos: 1 };
    let name = cursor
        .take_while(|c| !c.is_whitespace() && c != '/' && c != '>')
        .to_lowercase();
    let mut attrs = Vec::new();

    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => return Markup::Incomplete,
            Some('>') => {
                let token = Token::StartTag {
                    name,
                    attrs,
                    self_closing: false,
                };
                return Markup::Token(token, cursor.pos + 1);
            }
            Some('/') => match cursor.peek_at(1) {
                None => return Markup::Incomplete,
                Some('>') => {
                    let token = Token::StartTag {
                        name,
                        attrs,
                        self_closing: true,
                    };
                    return Markup::Token(token, cursor.pos + 2);
                }
                Some(_) => cursor.bump(),
            },
            Some(_) => match read_attr(&mut cursor) {
                Some(attr) => attrs.push(attr),
                None => return Markup::Incomplete,
            },
        }
    }
}

/// Read one attribute at the cursor; `None` if the input ends first.
fn read_attr(cursor: &mut Cursor<'_>) -> Option<RawAttr> {
    let mut name = cursor.take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'));
    if name.is_empty() {
        // A stray `=` where a name should be becomes part of the name.
        let c = cursor.peek()?;
        cursor.bump();
        name.push(c);
        name.push_str(&cursor.take_while(|c| !c.is_whitespace() && !matches!(c, '>' | '/')));
    }
    let name = name.to_lowercase();

    let before_eq = cursor.pos;
    cursor.skip_whitespace();
    if cursor.peek()? != '=' {
        cursor.pos = before_eq;
        return Some((name, None));
    }
    cursor.bump();
    cursor.skip_whitespace();

    let input = cursor.input;
    let value = match cursor.peek()? {
        quote @ ('"' | '\'') => {
            cursor.bump();
            let start = cursor.pos;
            let len = input[start..].find(quote)?;
            cursor.pos = start + len + 1;
            &input[start..start + len]
        }
        _ => {
            let start = cursor.pos;
            cursor.take_while(|c| !c.is_whitespace() && c != '>');
            &input[start..cursor.pos]
        }
    };
    Some((name, Some(decode_entities(value))))
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.input[start..self.pos].to_string()
    }
}

/// Decode named and numeric character references. Unknown or unterminated
/// references are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi + 1]).map(|c| (c, semi + 2)));
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'));
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{A0}'),
        _ => None,
    }
}
