use std::path::Path;

use tagstr::{Value, ValueMap};

/// Load a TOML file as the variables a template may reference.
pub fn load(path: &Path) -> Result<ValueMap, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let table: toml::Table =
        toml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(from_table(&table))
}

pub fn from_table(table: &toml::Table) -> ValueMap {
    table
        .iter()
        .map(|(key, value)| (key.clone(), from_toml(value)))
        .collect()
}

fn from_toml(value: &toml::Value) -> Value {
    match value {
        toml::Value::Integer(n) => Value::Int(*n),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::String(s) => Value::Str(s.clone()),
        toml::Value::Array(items) => Value::List(items.iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Map(from_table(table)),
        toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
    }
}

/// Parse a `--set key=value` assignment.
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    Ok((key.to_string(), parse_arg(value)))
}

/// Integers, then floats, then `true`/`false`; anything else is a string.
pub fn parse_arg(s: &str) -> Value {
    if let Ok(n) = s.parse::<i64>() {
        return Value::Int(n);
    }
    if s.chars().any(|c| c.is_ascii_digit())
        && let Ok(f) = s.parse::<f64>()
    {
        return Value::Float(f);
    }
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Str(s.to_string()),
    }
}
