use std::fmt;
use std::rc::Rc;

use crate::value::Value;

/// The `!s` / `!r` / `!a` conversion applied before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Str,
    Repr,
    Ascii,
}

impl Conversion {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Conversion::Str),
            'r' => Some(Conversion::Repr),
            'a' => Some(Conversion::Ascii),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Conversion::Str => 's',
            Conversion::Repr => 'r',
            Conversion::Ascii => 'a',
        }
    }
}

/// One `{expr}` substitution site of a template.
///
/// `value()` may run arbitrary code. It is called once per use and never
/// memoized by consumers, so a lazy implementation observes whatever state
/// its closure captures at the moment of resolution.
pub trait Interpolation {
    fn value(&self) -> Value;

    /// Source text of the expression, for diagnostics and round-tripping.
    fn expr(&self) -> &str;

    fn conversion(&self) -> Option<Conversion> {
        None
    }

    fn format_spec(&self) -> Option<&str> {
        None
    }
}

impl fmt::Debug for dyn Interpolation + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}", self.expr())?;
        if let Some(conv) = self.conversion() {
            write!(f, "!{}", conv.as_char())?;
        }
        if let Some(spec) = self.format_spec() {
            write!(f, ":{}", spec)?;
        }
        write!(f, "}}")
    }
}

/// Evaluates its closure every time the value is requested.
pub struct LazyInterpolation {
    getter: Rc<dyn Fn() -> Value>,
    expr: String,
    conversion: Option<Conversion>,
    format_spec: Option<String>,
}

impl LazyInterpolation {
    pub fn new(expr: impl Into<String>, getter: impl Fn() -> Value + 'static) -> Self {
        LazyInterpolation {
            getter: Rc::new(getter),
            expr: expr.into(),
            conversion: None,
            format_spec: None,
        }
    }

    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn with_format_spec(mut self, spec: impl Into<String>) -> Self {
        self.format_spec = Some(spec.into());
        self
    }
}

impl Interpolation for LazyInterpolation {
    fn value(&self) -> Value {
        (self.getter)()
    }

    fn expr(&self) -> &str {
        &self.expr
    }

    fn conversion(&self) -> Option<Conversion> {
        self.conversion
    }

    fn format_spec(&self) -> Option<&str> {
        self.format_spec.as_deref()
    }
}

/// Holds a value captured when the template was built.
#[derive(Debug, Clone)]
pub struct EagerInterpolation {
    value: Value,
    expr: String,
    conversion: Option<Conversion>,
    format_spec: Option<String>,
}

impl EagerInterpolation {
    pub fn new(expr: impl Into<String>, value: impl Into<Value>) -> Self {
        EagerInterpolation {
            value: value.into(),
            expr: expr.into(),
            conversion: None,
            format_spec: None,
        }
    }

    /// Snapshot any interpolation by evaluating it once, now.
    pub fn snapshot(source: &dyn Interpolation) -> Self {
        EagerInterpolation {
            value: source.value(),
            expr: source.expr().to_string(),
            conversion: source.conversion(),
            format_spec: source.format_spec().map(str::to_string),
        }
    }

    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn with_format_spec(mut self, spec: impl Into<String>) -> Self {
        self.format_spec = Some(spec.into());
        self
    }
}

impl Interpolation for EagerInterpolation {
    fn value(&self) -> Value {
        self.value.clone()
    }

    fn expr(&self) -> &str {
        &self.expr
    }

    fn conversion(&self) -> Option<Conversion> {
        self.conversion
    }

    fn format_spec(&self) -> Option<&str> {
        self.format_spec.as_deref()
    }
}
