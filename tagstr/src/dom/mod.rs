use std::fmt;

use indexmap::IndexMap;

/// Ordered attribute mapping of a resolved node.
pub type Attrs = IndexMap<String, AttrValue>;

/// CSS-style `property: value` pairs carried by a `style` attribute.
pub type Declarations = IndexMap<String, String>;

/// A fully resolved, renderable HTML element.
///
/// Produced by resolving a parsed template against its interpolation
/// values; nothing inside carries placeholders any more. `Display` renders
/// the node back to an HTML string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HtmlNode {
    /// Element name. Empty only for a fragment (see [`HtmlNode::fragment`]).
    pub tag: String,
    pub attrs: Attrs,
    pub children: Vec<Child>,
}

/// A child of an [`HtmlNode`]: text or a nested element.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Text(String),
    Node(HtmlNode),
}

/// A type-normalized attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean-style attribute: renders as the bare key.
    Bool(bool),
    Int(i64),
    Text(String),
    /// Nested declarations, e.g. `style={"color": "red"}`.
    Declarations(Declarations),
}

impl HtmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        HtmlNode {
            tag: tag.into(),
            attrs: Attrs::new(),
            children: Vec::new(),
        }
    }

    /// A tagless node grouping several top-level siblings.
    /// Renders as its children concatenated.
    pub fn fragment(children: Vec<Child>) -> Self {
        HtmlNode {
            tag: String::new(),
            attrs: Attrs::new(),
            children,
        }
    }

    pub fn is_fragment(&self) -> bool {
        self.tag.is_empty()
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Concatenated text of all descendant text children, unescaped.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &HtmlNode, out: &mut String) {
    for child in &node.children {
        match child {
            Child::Text(text) => out.push_str(text),
            Child::Node(inner) => collect_text(inner, out),
        }
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<HtmlNode> for Child {
    fn from(node: HtmlNode) -> Self {
        Child::Node(node)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Int(n)
    }
}

impl From<&str> for AttrValue {
    fn from(text: &str) -> Self {
        AttrValue::Text(text.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(text: String) -> Self {
        AttrValue::Text(text)
    }
}

impl From<Declarations> for AttrValue {
    fn from(decls: Declarations) -> Self {
        AttrValue::Declarations(decls)
    }
}

/// Escape `& < > " '` for use in HTML text or a quoted attribute value.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_attr(key: &str, value: &AttrValue) -> String {
    match value {
        AttrValue::Bool(_) => key.to_string(),
        AttrValue::Int(n) => format!("{}=\"{}\"", key, n),
        AttrValue::Text(text) => format!("{}=\"{}\"", key, escape(text)),
        AttrValue::Declarations(decls) => {
            let joined = decls
                .iter()
                .map(|(property, value)| format!("{}: {}", property, value))
                .collect::<Vec<_>>()
                .join("; ");
            format!("{}=\"{}\"", key, escape(&joined))
        }
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Text(text) => write!(f, "{}", escape(text)),
            Child::Node(node) => write!(f, "{}", node),
        }
    }
}

impl fmt::Display for HtmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fragment() {
            for child in &self.children {
                write!(f, "{}", child)?;
            }
            return Ok(());
        }

        write!(f, "<{}", self.tag)?;
        let attrs: Vec<String> = self
            .attrs
            .iter()
            .map(|(key, value)| render_attr(key, value))
            .collect();
        if !attrs.is_empty() {
            write!(f, " {}", attrs.join(" "))?;
        }

        if self.children.is_empty() {
            return write!(f, "/>");
        }

        write!(f, ">")?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}
