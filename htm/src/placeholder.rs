//! In-band markers standing in for interpolations while HTML is tokenized.
//!
//! An interpolation at item index `n` is fed to the tokenizer as `x$nx`.
//! Literal text has every `$` doubled first, so no literal text can ever
//! look like a marker; the `$` inside a marker is never escaped.

use std::sync::LazyLock;

use regex::Regex;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"x\$([0-9]+)x").expect("marker pattern is valid"));

static WHOLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^x\$([0-9]+)x$").expect("marker pattern is valid"));

/// A piece of tokenized text: literal (already unescaped) or a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Marker(usize),
}

pub fn escape(text: &str) -> String {
    text.replace('$', "$$")
}

pub fn unescape(text: &str) -> String {
    text.replace("$$", "$")
}

pub fn marker(index: usize) -> String {
    format!("x${}x", index)
}

/// The index encoded by `segment`, if the whole segment is one marker.
pub fn marker_index(segment: &str) -> Option<usize> {
    WHOLE_MARKER
        .captures(segment)
        .and_then(|caps| caps[1].parse().ok())
}

/// Split on markers, unescaping literal pieces. Empty pieces are dropped.
pub fn split(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in MARKER.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Literal(unescape(&text[last..whole.start()])));
        }
        segments.push(Segment::Marker(index));
        last = whole.end();
    }
    if last < text.len() {
        segments.push(Segment::Literal(unescape(&text[last..])));
    }
    segments
}

/// Rebuild `text` with each marker replaced by `replace(index)`.
pub fn substitute(text: &str, replace: impl Fn(usize) -> String) -> String {
    split(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Literal(literal) => literal,
            Segment::Marker(index) => replace(index),
        })
        .collect()
}
