pub mod error;

use std::ops::Range;

pub use error::{ParseError, ParseErrorKind};

use crate::interpolation::{Conversion, EagerInterpolation};
use crate::template::{Item, Template, TextChunk};
use crate::value::{Value, ValueMap};

/// Parses brace-syntax text (`Hello {name}!`) into a [`Template`].
///
/// `{{` and `}}` are literal braces. An interpolation is a dotted path into
/// the context, optionally followed by `!conv` and `:spec`. Values are taken
/// from the context at parse time.
pub struct Parser {
    source: String,
    file_id: usize,
}

/// Items collected so far, with one source span per item.
#[derive(Default)]
struct Builder {
    items: Vec<Item>,
    spans: Vec<Range<usize>>,
}

impl Builder {
    fn push_text(&mut self, text: String, span: Range<usize>) {
        if text.is_empty() {
            return;
        }
        self.items.push(Item::Text(TextChunk::new(text)));
        self.spans.push(span);
    }

    fn push_interpolation(&mut self, interpolation: EagerInterpolation, span: Range<usize>) {
        if !matches!(self.items.last(), Some(Item::Text(_))) {
            self.items.push(Item::Text(TextChunk::default()));
            self.spans.push(span.start..span.start);
        }
        self.items.push(Item::interpolation(interpolation));
        self.spans.push(span);
    }

    fn finish(mut self, end: usize) -> Template {
        if !matches!(self.items.last(), Some(Item::Text(_))) {
            self.items.push(Item::Text(TextChunk::default()));
            self.spans.push(end..end);
        }
        Template::new(self.items).with_spans(self.spans)
    }
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse the source against `context`, reporting every error found.
    pub fn parse(&self, context: &ValueMap) -> Result<Template, Vec<ParseError>> {
        let source = self.source.as_str();
        let mut builder = Builder::default();
        let mut errors = Vec::new();
        let mut buffer = String::new();
        let mut text_start = 0;
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, n)| n) == Some('{') => {
                    chars.next();
                    buffer.push('{');
                }
                '{' => {
                    builder.push_text(std::mem::take(&mut buffer), text_start..pos);
                    let Some(end) = find_closing_brace(source, pos) else {
                        errors.push(ParseError::new(
                            ParseErrorKind::UnclosedBrace,
                            pos..source.len(),
                            self.file_id,
                        ));
                        text_start = source.len();
                        break;
                    };
                    let span = pos..end + 1;
                    match self.interpolation(&source[pos + 1..end], span.clone(), context) {
                        Ok(interpolation) => builder.push_interpolation(interpolation, span),
                        Err(err) => errors.push(err),
                    }
                    while chars.peek().is_some_and(|&(i, _)| i <= end) {
                        chars.next();
                    }
                    text_start = end + 1;
                }
                '}' if chars.peek().map(|&(_, n)| n) == Some('}') => {
                    chars.next();
                    buffer.push('}');
                }
                '}' => {
                    errors.push(ParseError::new(
                        ParseErrorKind::StrayBrace,
                        pos..pos + 1,
                        self.file_id,
                    ));
                }
                _ => buffer.push(c),
            }
        }
        builder.push_text(buffer, text_start..source.len());

        if errors.is_empty() {
            Ok(builder.finish(source.len()))
        } else {
            Err(errors)
        }
    }

    fn interpolation(
        &self,
        expr: &str,
        span: Range<usize>,
        context: &ValueMap,
    ) -> Result<EagerInterpolation, ParseError> {
        let (head, spec) = match expr.split_once(':') {
            Some((head, spec)) => (head, Some(spec)),
            None => (expr, None),
        };
        let (path, conversion) = match head.split_once('!') {
            Some((path, conv)) => {
                let mut conv_chars = conv.trim().chars();
                let conversion = match (conv_chars.next(), conv_chars.next()) {
                    (Some(c), None) => Conversion::from_char(c),
                    _ => None,
                };
                let Some(conversion) = conversion else {
                    return Err(ParseError::new(
                        ParseErrorKind::BadConversion(conv.to_string()),
                        span,
                        self.file_id,
                    ));
                };
                (path.trim(), Some(conversion))
            }
            None => (head.trim(), None),
        };

        if !is_path(path) {
            return Err(ParseError::new(
                ParseErrorKind::UnsupportedExpression(path.to_string()),
                span,
                self.file_id,
            ));
        }

        let Some(value) = lookup(context, path) else {
            return Err(ParseError::new(
                ParseErrorKind::UndefinedVariable(path.to_string()),
                span,
                self.file_id,
            ));
        };

        let mut interpolation = EagerInterpolation::new(path, value.clone());
        if let Some(conversion) = conversion {
            interpolation = interpolation.with_conversion(conversion);
        }
        if let Some(spec) = spec {
            interpolation = interpolation.with_format_spec(spec);
        }
        Ok(interpolation)
    }
}

/// Byte offset of the `}` closing the `{` at `open`, counting nested braces.
fn find_closing_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in source[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_path(path: &str) -> bool {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return false;
    };
    let is_name = |s: &str| {
        let mut chars = s.chars();
        matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
    };
    let is_index = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    is_name(first) && segments.all(|s| is_name(s) || is_index(s))
}

fn lookup<'a>(context: &'a ValueMap, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        Some((first, rest)) => context.get(first)?.lookup(rest),
        None => context.get(path),
    }
}
