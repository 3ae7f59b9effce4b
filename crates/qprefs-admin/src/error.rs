//! Administration error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdminError {
    #[error("Access to property '{property}' denied: {reason}")]
    PropertyAccess { property: String, reason: String },

    #[error("No such property: {0}")]
    NoSuchProperty(String),

    #[error("Invalid value for property '{property}': {reason}")]
    PropertyValue { property: String, reason: String },

    #[error("No such domain: {0}")]
    NoSuchDomain(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// The per-property failure conditions a caller may want to fold together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    AccessDenied,
    NoSuchProperty,
    InvalidValue,
}

impl AdminError {
    /// Classify this error, or `None` if it is not a property condition
    pub fn condition(&self) -> Option<Condition> {
        match self {
            AdminError::PropertyAccess { .. } => Some(Condition::AccessDenied),
            AdminError::NoSuchProperty(_) => Some(Condition::NoSuchProperty),
            AdminError::PropertyValue { .. } => Some(Condition::InvalidValue),
            AdminError::NoSuchDomain(_) | AdminError::Backend(_) => None,
        }
    }

    pub fn access(property: &str, reason: impl Into<String>) -> Self {
        AdminError::PropertyAccess {
            property: property.to_string(),
            reason: reason.into(),
        }
    }

    pub fn value(property: &str, reason: impl Into<String>) -> Self {
        AdminError::PropertyValue {
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}
