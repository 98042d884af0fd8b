use tagstr::dom::Attrs;
use tagstr::{AttrValue, Child, HtmlNode, Interpolation, Item, Value, format_value};
use tracing::trace;

use crate::ast::{AstChild, AstNode};
use crate::convert::{
    self, AttrPart, Converted, FromLiteral, NamePart, convert_attr_key, convert_attr_value,
    convert_child, convert_name,
};
use crate::error::HtmlError;
use crate::placeholder::{self, Segment};

/// Which side wins when a substituted component and the call site set the
/// same attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    #[default]
    NodeWins,
    CallSiteWins,
}

/// A piece of marker-laden text after splitting.
#[derive(Debug)]
pub enum Piece<'a> {
    Literal(String),
    Interpolation(&'a dyn Interpolation),
}

/// Resolves an [`AstNode`] into an [`HtmlNode`] against the items that were
/// fed to build it.
#[derive(Debug, Clone, Copy)]
pub struct Fill<'a> {
    items: &'a [Item],
    merge_policy: MergePolicy,
}

impl<'a> Fill<'a> {
    pub fn new(items: &'a [Item]) -> Self {
        Fill {
            items,
            merge_policy: MergePolicy::default(),
        }
    }

    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    pub fn split_by_placeholder(&self, text: &str) -> Result<Vec<Piece<'a>>, HtmlError> {
        placeholder::split(text)
            .into_iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => Ok(Piece::Literal(literal)),
                Segment::Marker(index) => self
                    .items
                    .get(index)
                    .and_then(Item::as_interpolation)
                    .map(Piece::Interpolation)
                    .ok_or(HtmlError::DanglingPlaceholder(index)),
            })
            .collect()
    }

    /// Literal pieces become fragments directly; interpolations are
    /// evaluated and run through `convert`, whose output is spliced in.
    pub fn fill<T, F>(&self, text: &str, convert: F) -> Result<Vec<T>, HtmlError>
    where
        T: FromLiteral,
        F: Fn(Value) -> Result<Converted<T>, HtmlError>,
    {
        let mut out = Vec::new();
        for piece in self.split_by_placeholder(text)? {
            match piece {
                Piece::Literal(literal) => out.push(T::from_literal(literal)),
                Piece::Interpolation(interpolation) => match convert(evaluate(interpolation)?)? {
                    Converted::One(fragment) => out.push(fragment),
                    Converted::Many(fragments) => out.extend(fragments),
                },
            }
        }
        Ok(out)
    }

    /// Resolve one attribute as written. With no value the name itself may
    /// be a spread map or a boolean attribute.
    pub fn fill_attr(&self, key: &str, value: Option<&str>) -> Result<Attrs, HtmlError> {
        let Some(value) = value else {
            return match single("attribute", self.fill(key, convert_attr_value)?)? {
                AttrPart::Map(map) => map
                    .into_iter()
                    .map(|(name, value)| -> Result<_, HtmlError> {
                        Ok((attribute_name(name)?, convert::spread_value(value)?))
                    })
                    .collect(),
                AttrPart::Text(name) => {
                    Ok(Attrs::from([(attribute_name(name)?, AttrValue::Bool(true))]))
                }
            };
        };

        let key = attribute_name(single("attribute key", self.fill(key, convert_attr_key)?)?)?;
        let mut parts = self.fill(value, convert_attr_value)?;
        let value = match parts.len() {
            0 => AttrValue::Text(String::new()),
            1 => match parts.pop() {
                Some(AttrPart::Map(map)) => AttrValue::Declarations(convert::declarations(map)),
                Some(AttrPart::Text(text)) => AttrValue::Text(text),
                None => AttrValue::Text(String::new()),
            },
            count => {
                return Err(HtmlError::NotSingle {
                    position: "attribute",
                    count,
                });
            }
        };
        Ok(Attrs::from([(key, value)]))
    }

    /// Resolve a tag name. A node substituted as the whole name is merged
    /// with the call site's attributes and children.
    pub fn fill_tag(
        &self,
        tag: Option<&str>,
        attrs: Attrs,
        children: Vec<Child>,
    ) -> Result<HtmlNode, HtmlError> {
        let Some(tag) = tag else {
            return Ok(HtmlNode::fragment(children));
        };
        let parts = self.fill(tag, convert_name)?;
        let count = parts.len();
        let mut name = String::new();
        for part in parts {
            match part {
                NamePart::Node(_) if count > 1 => {
                    return Err(HtmlError::AmbiguousComponent { count });
                }
                NamePart::Node(node) => return Ok(self.merge(node, attrs, children)),
                NamePart::Text(text) => name.push_str(&text),
            }
        }
        if !convert::is_valid_tag_name(&name) {
            return Err(HtmlError::InvalidTagName(name));
        }
        trace!(tag = %name, attrs = attrs.len(), children = children.len(), "resolved element");
        Ok(HtmlNode {
            tag: name,
            attrs,
            children,
        })
    }

    pub fn interpolate(&self, node: &AstNode) -> Result<HtmlNode, HtmlError> {
        let mut children = Vec::new();
        for child in &node.children {
            match child {
                AstChild::Node(inner) => children.push(Child::Node(self.interpolate(inner)?)),
                AstChild::Text(text) => children.extend(self.fill(text, convert_child)?),
            }
        }

        let mut attrs = Attrs::new();
        for (key, value) in &node.attrs {
            attrs.extend(self.fill_attr(key, value.as_deref())?);
        }

        self.fill_tag(node.tag.as_deref(), attrs, children)
    }

    fn merge(&self, mut node: HtmlNode, attrs: Attrs, children: Vec<Child>) -> HtmlNode {
        trace!(component = %node.tag, policy = ?self.merge_policy, "merging subcomponent");
        match self.merge_policy {
            MergePolicy::NodeWins => {
                for (key, value) in attrs {
                    node.attrs.entry(key).or_insert(value);
                }
            }
            MergePolicy::CallSiteWins => node.attrs.extend(attrs),
        }
        node.children.extend(children);
        node
    }
}

/// An interpolation carrying a conversion or format spec is formatted to a
/// string first; otherwise its value is used as is.
fn evaluate(interpolation: &dyn Interpolation) -> Result<Value, HtmlError> {
    let value = interpolation.value();
    let conversion = interpolation.conversion();
    let spec = interpolation.format_spec().filter(|spec| !spec.is_empty());
    if conversion.is_none() && spec.is_none() {
        return Ok(value);
    }
    Ok(Value::Str(format_value(&value, conversion, spec)?))
}

fn single<T>(position: &'static str, mut fragments: Vec<T>) -> Result<T, HtmlError> {
    match fragments.len() {
        1 => fragments.pop().ok_or(HtmlError::NotSingle { position, count: 0 }),
        count => Err(HtmlError::NotSingle { position, count }),
    }
}

fn attribute_name(name: String) -> Result<String, HtmlError> {
    if convert::is_valid_attribute_name(&name) {
        Ok(name)
    } else {
        Err(HtmlError::InvalidAttributeName(name))
    }
}
