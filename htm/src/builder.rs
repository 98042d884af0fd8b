use std::collections::HashMap;

use tagstr::Item;
use tracing::{debug, trace};

use crate::ast::{AstChild, AstNode};
use crate::error::HtmlError;
use crate::placeholder;
use crate::tokenizer::{Token, Tokenizer};

/// Builds an [`AstNode`] tree from template items fed one at a time.
///
/// Text items are tokenized as HTML; each interpolation is fed as the marker
/// for its item index. The index advances once per fed item of either kind,
/// so markers index straight into the original item sequence.
#[derive(Debug)]
pub struct AstBuilder {
    tokenizer: Tokenizer,
    /// Open elements with the item index each was opened in. The root is
    /// always at the bottom.
    stack: Vec<(AstNode, usize)>,
    index: usize,
    exprs: HashMap<usize, String>,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        AstBuilder {
            tokenizer: Tokenizer::new(),
            stack: vec![(AstNode::root(), 0)],
            index: 0,
            exprs: HashMap::new(),
        }
    }

    pub fn feed(&mut self, item: &Item) -> Result<(), HtmlError> {
        let tokens = match item {
            Item::Text(chunk) => self.tokenizer.feed(&placeholder::escape(chunk.as_str())),
            Item::Interpolation(interpolation) => {
                trace!(index = self.index, expr = interpolation.expr(), "marker");
                self.exprs.insert(self.index, interpolation.expr().to_string());
                self.tokenizer.feed(&placeholder::marker(self.index))
            }
        };
        let item = self.index;
        self.index += 1;
        tokens
            .into_iter()
            .try_for_each(|token| self.handle(token, item))
    }

    /// Flush the tokenizer and return the tree.
    ///
    /// A single top-level element is returned as is; several top-level
    /// children, or a lone text, come back under the synthetic root.
    pub fn result(mut self) -> Result<AstNode, HtmlError> {
        let last = self.index.saturating_sub(1);
        for token in self.tokenizer.close() {
            self.handle(token, last)?;
        }
        if self.stack.len() > 1
            && let Some((node, item)) = self.stack.pop()
        {
            return Err(HtmlError::UnclosedTag {
                name: self.recover(node.tag.as_deref().unwrap_or_default()),
                item,
            });
        }
        let Some((mut root, _)) = self.stack.pop() else {
            return Err(HtmlError::Empty);
        };
        if root.children.is_empty() {
            return Err(HtmlError::Empty);
        }
        if matches!(root.children.as_slice(), [AstChild::Node(_)])
            && let Some(AstChild::Node(node)) = root.children.pop()
        {
            return Ok(node);
        }
        Ok(root)
    }

    fn handle(&mut self, token: Token, item: usize) -> Result<(), HtmlError> {
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                debug!(tag = %name, item, self_closing, "start tag");
                let node = AstNode::element(name, attrs);
                if self_closing {
                    self.append(AstChild::Node(node));
                } else {
                    self.stack.push((node, item));
                }
            }
            Token::EndTag { name } => {
                debug!(tag = %name, item, "end tag");
                if self.stack.len() == 1 {
                    return Err(HtmlError::StrayClosingTag {
                        found: self.recover(&name),
                        item,
                    });
                }
                let open = self.stack[self.stack.len() - 1]
                    .0
                    .tag
                    .as_deref()
                    .unwrap_or_default();
                let (expected, found) = (self.recover(open), self.recover(&name));
                if expected != found {
                    return Err(HtmlError::MismatchedTag {
                        expected,
                        found,
                        item,
                    });
                }
                self.close_top();
            }
            Token::GenericClose => {
                debug!(item, "generic close");
                if self.stack.len() == 1 {
                    return Err(HtmlError::StrayClosingTag {
                        found: "/".to_string(),
                        item,
                    });
                }
                self.close_top();
            }
            Token::Text(text) => self.append(AstChild::Text(text)),
        }
        Ok(())
    }

    fn append(&mut self, child: AstChild) {
        if let Some((top, _)) = self.stack.last_mut() {
            top.children.push(child);
        }
    }

    fn close_top(&mut self) {
        if let Some((node, _)) = self.stack.pop() {
            self.append(AstChild::Node(node));
        }
    }

    /// Replace markers in a tag name with `{expr}` so dynamic names compare
    /// by the expression they were written with.
    fn recover(&self, name: &str) -> String {
        placeholder::substitute(name, |index| match self.exprs.get(&index) {
            Some(expr) => format!("{{{}}}", expr),
            None => placeholder::marker(index),
        })
    }
}
