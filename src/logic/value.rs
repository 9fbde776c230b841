//! Values as seen by rule expressions.
//!
//! Rules follow JSON-logic semantics, which borrow JavaScript's coercion rules.
//! [`LogicValue`] is JSON plus the ability to hold NaN: form data is converted
//! with every `null` leaf replaced by NaN before rules run, so comparisons
//! against an unfilled field are always false rather than treating the field
//! as `0`.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// A value produced or consumed by rule evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<LogicValue>),
    Object(IndexMap<String, LogicValue>),
}

impl LogicValue {
    /// The NaN number.
    pub const NAN: LogicValue = LogicValue::Number(f64::NAN);

    /// Converts JSON verbatim (`null` stays `Null`).
    pub fn from_json(value: &Value) -> Self {
        Self::convert(value, false)
    }

    /// Converts JSON form data, replacing every `null` leaf with NaN.
    pub fn from_form_data(value: &Value) -> Self {
        Self::convert(value, true)
    }

    fn convert(value: &Value, null_as_nan: bool) -> Self {
        match value {
            Value::Null if null_as_nan => Self::NAN,
            Value::Null => LogicValue::Null,
            Value::Bool(b) => LogicValue::Bool(*b),
            Value::Number(n) => LogicValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => LogicValue::String(s.clone()),
            Value::Array(items) => {
                LogicValue::Array(items.iter().map(|v| Self::convert(v, null_as_nan)).collect())
            }
            Value::Object(map) => LogicValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::convert(v, null_as_nan)))
                    .collect(),
            ),
        }
    }

    /// Converts back to JSON. NaN and infinities become `null`; integral
    /// numbers become JSON integers.
    pub fn to_json(&self) -> Value {
        match self {
            LogicValue::Null => Value::Null,
            LogicValue::Bool(b) => Value::Bool(*b),
            LogicValue::Number(n) => number_to_json(*n),
            LogicValue::String(s) => Value::String(s.clone()),
            LogicValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            LogicValue::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json());
                }
                Value::Object(out)
            }
        }
    }

    /// Returns true for NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self, LogicValue::Number(n) if n.is_nan())
    }

    /// JSON-logic truthiness: empty arrays are falsy, otherwise JavaScript rules.
    pub fn truthy(&self) -> bool {
        match self {
            LogicValue::Null => false,
            LogicValue::Bool(b) => *b,
            LogicValue::Number(n) => *n != 0.0 && !n.is_nan(),
            LogicValue::String(s) => !s.is_empty(),
            LogicValue::Array(items) => !items.is_empty(),
            LogicValue::Object(_) => true,
        }
    }

    /// JavaScript `Number(x)` coercion.
    pub fn to_number(&self) -> f64 {
        match self {
            LogicValue::Null => 0.0,
            LogicValue::Bool(b) => f64::from(u8::from(*b)),
            LogicValue::Number(n) => *n,
            LogicValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            LogicValue::Array(_) => LogicValue::String(self.to_js_string()).to_number(),
            LogicValue::Object(_) => f64::NAN,
        }
    }

    /// JavaScript `String(x)` coercion.
    pub fn to_js_string(&self) -> String {
        match self {
            LogicValue::Null => "null".to_string(),
            LogicValue::Bool(b) => b.to_string(),
            LogicValue::Number(n) => format_js_number(*n),
            LogicValue::String(s) => s.clone(),
            LogicValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    LogicValue::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            LogicValue::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Looks up a dotted path (`"address.zip"`, `"pets.0.name"`).
    ///
    /// An empty path returns the value itself.
    pub fn lookup(&self, path: &str) -> Option<&LogicValue> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.').try_fold(self, |current, key| match current {
            LogicValue::Object(map) => map.get(key),
            LogicValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl From<bool> for LogicValue {
    fn from(b: bool) -> Self {
        LogicValue::Bool(b)
    }
}

impl From<f64> for LogicValue {
    fn from(n: f64) -> Self {
        LogicValue::Number(n)
    }
}

impl From<&str> for LogicValue {
    fn from(s: &str) -> Self {
        LogicValue::String(s.to_string())
    }
}

fn number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn format_js_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
