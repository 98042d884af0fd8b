use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expecting '}}'")]
    UnclosedBrace,
    #[error("single '}}' is not allowed")]
    StrayBrace,
    #[error("bad conversion: {0:?}")]
    BadConversion(String),
    #[error("unsupported expression `{0}`")]
    UnsupportedExpression(String),
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
}

impl ParseErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ParseErrorKind::UnclosedBrace => "interpolation starts here",
            ParseErrorKind::StrayBrace => "unmatched brace",
            ParseErrorKind::BadConversion(_) => "in this interpolation",
            ParseErrorKind::UnsupportedExpression(_) => "not a name or dotted path",
            ParseErrorKind::UndefinedVariable(_) => "not found in the context",
        }
    }

    fn note(&self) -> Option<&'static str> {
        match self {
            ParseErrorKind::UnclosedBrace => Some("write `{{` for a literal brace"),
            ParseErrorKind::StrayBrace => Some("write `}}` for a literal brace"),
            ParseErrorKind::BadConversion(_) => Some("expected one of !s, !r, !a"),
            ParseErrorKind::UnsupportedExpression(_) => {
                Some("only names and dotted paths such as `user.name` or `items.0` are allowed")
            }
            ParseErrorKind::UndefinedVariable(_) => None,
        }
    }
}

/// A located template parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (at {}..{})", .span.start, .span.end)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            kind,
            span,
            file_id,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.message())
            .with_labels(vec![
                Label::primary(self.file_id, self.span.clone()).with_message(self.kind.label()),
            ])
            .with_notes(self.kind.note().map(str::to_string).into_iter().collect())
    }
}
