use tagstr::FormatError;
use thiserror::Error;

/// Everything that can abort building or resolving an HTML template.
///
/// Structural variants carry `item`, the index of the fed item during which
/// the problem was detected, so callers holding source spans can point at it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HtmlError {
    #[error("unexpected closing tag </{found}>, expected </{expected}>")]
    MismatchedTag {
        expected: String,
        found: String,
        item: usize,
    },
    #[error("unexpected closing tag </{found}>: no element is open")]
    StrayClosingTag { found: String, item: usize },
    #[error("unclosed tag <{name}>")]
    UnclosedTag { name: String, item: usize },
    #[error("nothing to return: the template produced no nodes")]
    Empty,
    #[error("{position} value must be single, got {count} fragments")]
    NotSingle {
        position: &'static str,
        count: usize,
    },
    #[error("not a valid attribute name: {0:?}")]
    InvalidAttributeName(String),
    #[error("not a valid tag: {0:?}")]
    InvalidTagName(String),
    #[error("type error: expected {expected}, got {got}")]
    TypeError { expected: &'static str, got: String },
    #[error("can only have a standalone HTML component in a tag name, got {count} fragments")]
    AmbiguousComponent { count: usize },
    #[error("placeholder x${0}x does not refer to an interpolation")]
    DanglingPlaceholder(usize),
    #[error("nesting too deep while flattening interpolated values (limit {0})")]
    NestingTooDeep(usize),
    #[error("interpolated sequence yields more than {0} values")]
    TooManyValues(usize),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl HtmlError {
    pub(crate) fn type_error(expected: &'static str, got: &tagstr::Value) -> Self {
        HtmlError::TypeError {
            expected,
            got: format!("{} {}", got.type_name(), got.repr()),
        }
    }

    /// Index of the fed item a structural error was detected in.
    pub fn item(&self) -> Option<usize> {
        match self {
            HtmlError::MismatchedTag { item, .. }
            | HtmlError::StrayClosingTag { item, .. }
            | HtmlError::UnclosedTag { item, .. } => Some(*item),
            _ => None,
        }
    }
}
