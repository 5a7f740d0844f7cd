//! Printing, truthiness and field lookup for template data

use serde_json::{Map, Value};

/// Token printed for a `null` value, including keys absent from the data
pub const NO_VALUE: &str = "<no value>";

/// How a field missing from an object evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Evaluates to `null`, printed as [`NO_VALUE`]
    #[default]
    Default,
    /// Evaluates to the zero value of the object's element type
    Zero,
}

/// Human-readable kind of a value, for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a value selects the main branch of `if` and `with`
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render a value into template output
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => NO_VALUE.to_string(),
        other => display_nested(other),
    }
}

fn display_nested(value: &Value) -> String {
    match value {
        Value::Null => "<nil>".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(display_nested).collect();
            format!("[{}]", inner.join(" "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", k, display_nested(v)))
                .collect();
            format!("map[{}]", inner.join(" "))
        }
    }
}

/// Resolve a `.a.b.c` field chain against dot.
///
/// Fields of `null` are `null`. Fields of any other non-object value are an
/// error, returned as a message for the caller to attach to its fragment.
pub fn lookup(dot: &Value, path: &[String], missing: MissingKey) -> Result<Value, String> {
    let mut current = dot;
    for (i, key) in path.iter().enumerate() {
        match current {
            Value::Object(map) => match map.get(key) {
                Some(next) => current = next,
                None if i + 1 == path.len() => return Ok(missing_value(map, missing)),
                None => return Ok(Value::Null),
            },
            Value::Null => return Ok(Value::Null),
            other => {
                return Err(format!(
                    "can't evaluate field {} in type {}",
                    key,
                    type_name(other)
                ))
            }
        }
    }
    Ok(current.clone())
}

fn missing_value(map: &Map<String, Value>, missing: MissingKey) -> Value {
    match missing {
        MissingKey::Default => Value::Null,
        MissingKey::Zero => zero_of(map),
    }
}

#[derive(PartialEq, Clone, Copy)]
enum ElementKind {
    Number,
    String,
    Bool,
}

/// Zero value of a homogeneous object's element type; `null` when the
/// values are mixed, nested, or absent.
fn zero_of(map: &Map<String, Value>) -> Value {
    let mut kind = None;
    for value in map.values() {
        let this = match value {
            Value::Number(_) => ElementKind::Number,
            Value::String(_) => ElementKind::String,
            Value::Bool(_) => ElementKind::Bool,
            _ => return Value::Null,
        };
        if kind.is_some_and(|k| k != this) {
            return Value::Null;
        }
        kind = Some(this);
    }
    match kind {
        Some(ElementKind::Number) => Value::from(0),
        Some(ElementKind::String) => Value::String(String::new()),
        Some(ElementKind::Bool) => Value::Bool(false),
        None => Value::Null,
    }
}

/// Equality used by `eq` and `ne`; numbers compare by value
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
