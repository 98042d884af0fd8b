//! Type-directed conversion of interpolated values, one policy per position
//! a marker can occupy: child, attribute key, attribute value, tag name.

use std::sync::LazyLock;

use regex::Regex;
use tagstr::dom::{Declarations, escape};
use tagstr::{AttrValue, Child, HtmlNode, Value, ValueMap};

use crate::error::HtmlError;

/// Deepest nesting of lists, iterators and components flattened into one
/// position.
pub const MAX_DEPTH: usize = 256;

/// Most values drained from a single iterator.
pub const MAX_ITEMS: usize = 100_000;

static ATTRIBUTE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_\-\.]*$").expect("attribute name pattern is valid")
});

static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("tag name pattern is valid"));

pub fn is_valid_attribute_name(name: &str) -> bool {
    ATTRIBUTE_NAME.is_match(name)
}

/// Word characters and hyphens, no `--`, and no leading digit or `-digit`.
pub fn is_valid_tag_name(name: &str) -> bool {
    let unsigned = name.strip_prefix('-').unwrap_or(name);
    TAG_NAME.is_match(name)
        && !name.contains("--")
        && !unsigned.starts_with(|c: char| c.is_ascii_digit())
}

/// Result of converting one value: a single fragment, or several that get
/// spliced into the surrounding sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted<T> {
    One(T),
    Many(Vec<T>),
}

/// Fragment types that literal template text can turn into directly.
pub trait FromLiteral {
    fn from_literal(text: String) -> Self;
}

impl FromLiteral for Child {
    fn from_literal(text: String) -> Self {
        Child::Text(text)
    }
}

impl FromLiteral for String {
    fn from_literal(text: String) -> Self {
        text
    }
}

/// An attribute-position fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrPart {
    Text(String),
    Map(ValueMap),
}

impl FromLiteral for AttrPart {
    fn from_literal(text: String) -> Self {
        AttrPart::Text(text)
    }
}

/// A tag-position fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum NamePart {
    Text(String),
    Node(HtmlNode),
}

impl FromLiteral for NamePart {
    fn from_literal(text: String) -> Self {
        NamePart::Text(text)
    }
}

/// Nodes pass through, strings are escaped, sequences and iterators are
/// flattened (a map yields its keys), components are invoked, other scalars
/// are stringified.
pub fn convert_child(value: Value) -> Result<Converted<Child>, HtmlError> {
    let mut out = Vec::new();
    flatten_child(value, 0, &mut out)?;
    if out.len() == 1
        && let Some(child) = out.pop()
    {
        return Ok(Converted::One(child));
    }
    Ok(Converted::Many(out))
}

fn flatten_child(value: Value, depth: usize, out: &mut Vec<Child>) -> Result<(), HtmlError> {
    if depth > MAX_DEPTH {
        return Err(HtmlError::NestingTooDeep(MAX_DEPTH));
    }
    match value {
        Value::Html(node) if node.is_fragment() => out.extend(node.children),
        Value::Html(node) => out.push(Child::Node(node)),
        Value::Str(text) => out.push(Child::Text(escape(&text))),
        Value::List(items) => {
            for item in items {
                flatten_child(item, depth + 1, out)?;
            }
        }
        Value::Iter(iter) => {
            let mut drained = 0;
            while let Some(item) = iter.next_value() {
                drained += 1;
                if drained > MAX_ITEMS {
                    return Err(HtmlError::TooManyValues(MAX_ITEMS));
                }
                flatten_child(item, depth + 1, out)?;
            }
        }
        Value::Component(component) => flatten_child(component.call(), depth + 1, out)?,
        Value::Map(map) => {
            for key in map.into_keys() {
                flatten_child(Value::Str(key), depth + 1, out)?;
            }
        }
        scalar => out.push(Child::Text(escape(&scalar.to_string()))),
    }
    Ok(())
}

pub fn convert_attr_key(value: Value) -> Result<Converted<String>, HtmlError> {
    match value {
        Value::Str(text) => {
            let key = escape(&text);
            if !is_valid_attribute_name(&key) {
                return Err(HtmlError::InvalidAttributeName(key));
            }
            Ok(Converted::One(key))
        }
        other => Err(HtmlError::type_error("str", &other)),
    }
}

/// Maps pass through (declarations or spread attributes), strings are
/// escaped, integers are stringified. Anything else, booleans included, is a
/// type error.
pub fn convert_attr_value(value: Value) -> Result<Converted<AttrPart>, HtmlError> {
    match value {
        Value::Map(map) => Ok(Converted::One(AttrPart::Map(map))),
        Value::Str(text) => Ok(Converted::One(AttrPart::Text(escape(&text)))),
        Value::Int(n) => Ok(Converted::One(AttrPart::Text(n.to_string()))),
        other => Err(HtmlError::type_error("map, str or int", &other)),
    }
}

/// Nodes pass through for subcomponent substitution; strings and integers
/// become name text; components are invoked and their result converted.
pub fn convert_name(value: Value) -> Result<Converted<NamePart>, HtmlError> {
    name_part(value, 0).map(Converted::One)
}

fn name_part(value: Value, depth: usize) -> Result<NamePart, HtmlError> {
    match value {
        Value::Html(node) => Ok(NamePart::Node(node)),
        Value::Str(text) => Ok(NamePart::Text(text)),
        Value::Int(n) => Ok(NamePart::Text(n.to_string())),
        Value::Component(_) if depth >= MAX_DEPTH => Err(HtmlError::NestingTooDeep(MAX_DEPTH)),
        Value::Component(component) => name_part(component.call(), depth + 1),
        other => Err(HtmlError::type_error("html, str or int", &other)),
    }
}

/// Attribute value for one entry of a spread map.
pub fn spread_value(value: Value) -> Result<AttrValue, HtmlError> {
    match value {
        Value::Bool(b) => Ok(AttrValue::Bool(b)),
        Value::Int(n) => Ok(AttrValue::Int(n)),
        Value::Str(text) => Ok(AttrValue::Text(text)),
        Value::Float(_) => Ok(AttrValue::Text(value.to_string())),
        Value::Map(map) => Ok(AttrValue::Declarations(declarations(map))),
        other => Err(HtmlError::type_error("bool, int, str or map", &other)),
    }
}

pub fn declarations(map: ValueMap) -> Declarations {
    map.into_iter()
        .map(|(property, value)| (property, value.to_string()))
        .collect()
}
