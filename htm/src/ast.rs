use std::fmt;

use crate::tokenizer::RawAttr;

/// Parse tree with placeholder markers still embedded in names, attribute
/// values and text. The synthetic root has no tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AstNode {
    pub tag: Option<String>,
    pub attrs: Vec<RawAttr>,
    pub children: Vec<AstChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstChild {
    Text(String),
    Node(AstNode),
}

impl AstNode {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn element(tag: impl Into<String>, attrs: Vec<RawAttr>) -> Self {
        AstNode {
            tag: Some(tag.into()),
            attrs,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.tag.is_none()
    }

    /// Text children only, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.children
            .iter()
            .filter_map(|child| match child {
                AstChild::Text(text) => Some(text.as_str()),
                AstChild::Node(_) => None,
            })
            .collect()
    }
}

/// Indented outline, one node or text per line.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, node: &AstNode, depth: usize) -> fmt::Result {
            let indent = "  ".repeat(depth);
            write!(f, "{}{}", indent, node.tag.as_deref().unwrap_or("#root"))?;
            for (name, value) in &node.attrs {
                match value {
                    Some(value) => write!(f, " {}={:?}", name, value)?,
                    None => write!(f, " {}", name)?,
                }
            }
            writeln!(f)?;
            for child in &node.children {
                match child {
                    AstChild::Text(text) => writeln!(f, "{}  {:?}", indent, text)?,
                    AstChild::Node(child) => write_node(f, child, depth + 1)?,
                }
            }
            Ok(())
        }
        write_node(f, self, 0)
    }
}
