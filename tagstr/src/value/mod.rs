use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::dom::HtmlNode;

/// Ordered string-keyed map of values.
pub type ValueMap = IndexMap<String, Value>;

/// A value produced by an interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An already-rendered node, substituted as a child or subcomponent.
    Html(HtmlNode),
    /// Spread attributes or style declarations.
    Map(ValueMap),
    List(Vec<Value>),
    /// A lazily produced sequence, consumed at most once.
    Iter(ValueIter),
    /// A zero-argument callable producing a value on demand.
    Component(Component),
}

/// A shared, single-pass iterator of values.
///
/// Clones share the same underlying iterator, so items drained through one
/// handle are gone for every other handle.
#[derive(Clone)]
pub struct ValueIter(Rc<RefCell<Box<dyn Iterator<Item = Value>>>>);

impl ValueIter {
    pub fn new<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        ValueIter(Rc::new(RefCell::new(Box::new(iter.into_iter()))))
    }

    /// Pull the next value, if any remain.
    pub fn next_value(&self) -> Option<Value> {
        self.0.borrow_mut().next()
    }
}

impl fmt::Debug for ValueIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueIter(..)")
    }
}

impl PartialEq for ValueIter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A zero-argument value factory.
#[derive(Clone)]
pub struct Component {
    name: String,
    factory: Rc<dyn Fn() -> Value>,
}

impl Component {
    pub fn new(name: impl Into<String>, factory: impl Fn() -> Value + 'static) -> Self {
        Component {
            name: name.into(),
            factory: Rc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self) -> Value {
        (self.factory)()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.factory, &other.factory)
    }
}

impl Value {
    /// Wrap any iterator of convertible items as a single-pass [`Value::Iter`].
    pub fn iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
        T: Into<Value> + 'static,
    {
        Value::Iter(ValueIter::new(iter.into_iter().map(Into::<Value>::into)))
    }

    pub fn component(name: impl Into<String>, factory: impl Fn() -> Value + 'static) -> Self {
        Value::Component(Component::new(name, factory))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Html(_) => "html",
            Value::Map(_) => "map",
            Value::List(_) => "list",
            Value::Iter(_) => "iterator",
            Value::Component(_) => "component",
        }
    }

    /// Debug-style rendering: strings quoted, containers show quoted members.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", s),
            Value::Map(map) => {
                let entries: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v.repr()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", items.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Look up a dotted path such as `user.name` or `items.0`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = match current {
                Value::Map(map) => map.get(segment)?,
                Value::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 => {
                write!(f, "{:.1}", n)
            }
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Html(node) => write!(f, "{}", node),
            Value::Map(_) | Value::List(_) => write!(f, "{}", self.repr()),
            Value::Iter(_) => write!(f, "<iterator>"),
            Value::Component(c) => write!(f, "<component {}>", c.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<HtmlNode> for Value {
    fn from(node: HtmlNode) -> Self {
        Value::Html(node)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<Component> for Value {
    fn from(component: Component) -> Self {
        Value::Component(component)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Value {
    fn from(entries: [(K, V); N]) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
