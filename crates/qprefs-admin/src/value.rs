//! Property values

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A preference value as exchanged with the administration backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// No value (e.g. an unset VM reference)
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Absent => "absent",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Str(_) => "str",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PropertyValue::Absent)
    }

    /// Equality up to the coercions a backend applies on write:
    /// an integer matches the same float, an empty string matches absent
    pub fn equivalent(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (PropertyValue::Int(i), PropertyValue::Float(f))
            | (PropertyValue::Float(f), PropertyValue::Int(i)) => *i as f64 == *f,
            (PropertyValue::Str(s), PropertyValue::Absent)
            | (PropertyValue::Absent, PropertyValue::Str(s)) => s.is_empty(),
            _ => self == other,
        }
    }

    /// Convert from a JSON value, `None` for arrays, objects, and
    /// numbers that fit neither i64 nor f64
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(PropertyValue::Absent),
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(PropertyValue::Int)
                .or_else(|| n.as_f64().map(PropertyValue::Float)),
            Value::String(s) => Some(PropertyValue::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Absent => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::from(*i),
            PropertyValue::Float(f) => Value::from(*f),
            PropertyValue::Str(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Absent => write!(f, ""),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Absent)
    }
}
