pub mod text_chunk;

use std::ops::Range;
use std::rc::Rc;

use crate::format::{FormatError, format_value};
use crate::interpolation::{Conversion, Interpolation};
use crate::value::Value;

pub use text_chunk::{EscapeError, TextChunk};

/// One element of a template: literal text or a substitution site.
#[derive(Debug, Clone)]
pub enum Item {
    Text(TextChunk),
    Interpolation(Rc<dyn Interpolation>),
}

impl Item {
    pub fn text(text: impl Into<String>) -> Self {
        Item::Text(TextChunk::new(text))
    }

    pub fn interpolation(interpolation: impl Interpolation + 'static) -> Self {
        Item::Interpolation(Rc::new(interpolation))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Item::Text(chunk) => Some(chunk.as_str()),
            Item::Interpolation(_) => None,
        }
    }

    pub fn as_interpolation(&self) -> Option<&dyn Interpolation> {
        match self {
            Item::Text(_) => None,
            Item::Interpolation(interpolation) => Some(interpolation.as_ref()),
        }
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Item::text(text)
    }
}

impl From<TextChunk> for Item {
    fn from(chunk: TextChunk) -> Self {
        Item::Text(chunk)
    }
}

/// An alternating sequence of text and interpolations.
///
/// Always odd-length, starting and ending with text: `Template::new` inserts
/// empty text between adjacent interpolations and at either end, and merges
/// adjacent text chunks.
#[derive(Debug, Clone)]
pub struct Template {
    items: Vec<Item>,
    /// Source byte ranges per item, when the template was parsed from text.
    spans: Vec<Range<usize>>,
}

impl Template {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut normalized: Vec<Item> = Vec::new();
        for item in items {
            match item {
                Item::Text(chunk) => match normalized.last_mut() {
                    Some(Item::Text(last)) => last.append(&chunk),
                    _ => normalized.push(Item::Text(chunk)),
                },
                Item::Interpolation(interpolation) => {
                    if !matches!(normalized.last(), Some(Item::Text(_))) {
                        normalized.push(Item::Text(TextChunk::default()));
                    }
                    normalized.push(Item::Interpolation(interpolation));
                }
            }
        }
        if !matches!(normalized.last(), Some(Item::Text(_))) {
            normalized.push(Item::Text(TextChunk::default()));
        }
        Template {
            items: normalized,
            spans: Vec::new(),
        }
    }

    /// Attach per-item source spans. Ignored unless there is one per item.
    pub fn with_spans(mut self, spans: Vec<Range<usize>>) -> Self {
        if spans.len() == self.items.len() {
            self.spans = spans;
        }
        self
    }

    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    /// Number of items; always odd.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the template is a single empty text chunk.
    pub fn is_empty(&self) -> bool {
        self.items.len() == 1 && self.items[0].as_text() == Some("")
    }

    /// Decoded text chunks; always one more than the interpolations.
    pub fn source(&self) -> Vec<&str> {
        self.text_chunks().map(TextChunk::as_str).collect()
    }

    pub fn strings(&self) -> Vec<&str> {
        self.source()
    }

    pub fn raw(&self) -> Vec<&str> {
        self.text_chunks().map(TextChunk::raw).collect()
    }

    pub fn interpolations(&self) -> Vec<&dyn Interpolation> {
        self.items.iter().filter_map(Item::as_interpolation).collect()
    }

    /// Evaluate every interpolation once, in order.
    pub fn values(&self) -> Vec<Value> {
        self.interpolations().iter().map(|i| i.value()).collect()
    }

    pub fn exprs(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(Item::as_interpolation)
            .map(|i| i.expr())
            .collect()
    }

    pub fn conversions(&self) -> Vec<Option<Conversion>> {
        self.interpolations().iter().map(|i| i.conversion()).collect()
    }

    pub fn format_specs(&self) -> Vec<Option<&str>> {
        self.items
            .iter()
            .filter_map(Item::as_interpolation)
            .map(|i| i.format_spec())
            .collect()
    }

    /// Reconstruct `text{expr!c:spec}text` source form.
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                Item::Text(chunk) => out.push_str(chunk.raw()),
                Item::Interpolation(interpolation) => {
                    out.push_str(&format!("{:?}", interpolation))
                }
            }
        }
        out
    }

    /// Render as a plain string, formatting each interpolation in place.
    pub fn format(&self) -> Result<String, FormatError> {
        let mut out = String::new();
        for item in &self.items {
            match item {
                Item::Text(chunk) => out.push_str(chunk.as_str()),
                Item::Interpolation(interpolation) => out.push_str(&format_value(
                    &interpolation.value(),
                    interpolation.conversion(),
                    interpolation.format_spec(),
                )?),
            }
        }
        Ok(out)
    }

    fn text_chunks(&self) -> impl Iterator<Item = &TextChunk> {
        self.items.iter().filter_map(|item| match item {
            Item::Text(chunk) => Some(chunk),
            Item::Interpolation(_) => None,
        })
    }
}
