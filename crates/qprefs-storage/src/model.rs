//! Property definition model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use qprefs_admin::PropertyValue;

/// Which kind of object a definition applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolderClass {
    /// The global system object
    System,
    /// Every managed domain
    Domain,
}

impl HolderClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolderClass::System => "system",
            HolderClass::Domain => "domain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Bool,
    Int,
    Float,
    Str,
    /// Reference to a domain by name, or absent
    Vm,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Float => "float",
            PropertyKind::Str => "str",
            PropertyKind::Vm => "vm",
        }
    }

    /// Check a value against this kind, coercing where the kind allows it.
    ///
    /// Domain references are only checked for shape here; existence is
    /// checked against the domain table by the holder.
    pub fn coerce(&self, value: &PropertyValue) -> Option<PropertyValue> {
        match (self, value) {
            (PropertyKind::Bool, PropertyValue::Bool(_)) => Some(value.clone()),
            (PropertyKind::Int, PropertyValue::Int(_)) => Some(value.clone()),
            // JSON has no representation for NaN or infinities
            (PropertyKind::Float, PropertyValue::Float(f)) if f.is_finite() => Some(value.clone()),
            (PropertyKind::Float, PropertyValue::Int(i)) => Some(PropertyValue::Float(*i as f64)),
            (PropertyKind::Str, PropertyValue::Str(_)) => Some(value.clone()),
            (PropertyKind::Vm, PropertyValue::Absent) => Some(PropertyValue::Absent),
            (PropertyKind::Vm, PropertyValue::Str(s)) if s.is_empty() => {
                Some(PropertyValue::Absent)
            }
            (PropertyKind::Vm, PropertyValue::Str(_)) => Some(value.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PropertyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(PropertyKind::Bool),
            "int" => Ok(PropertyKind::Int),
            "float" => Ok(PropertyKind::Float),
            "str" => Ok(PropertyKind::Str),
            "vm" => Ok(PropertyKind::Vm),
            _ => Err(format!("Unknown property kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub class: HolderClass,
    pub name: String,
    pub kind: PropertyKind,
    /// Platform default, stored as JSON. Compound values have no
    /// property representation and surface as an unparseable default.
    pub default: Value,
    /// Whether callers may set or reset the property
    pub writable: bool,
}

impl PropertyDefinition {
    pub fn new(class: HolderClass, name: &str, kind: PropertyKind, default: Value) -> Self {
        Self {
            class,
            name: name.to_string(),
            kind,
            default,
            writable: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}
