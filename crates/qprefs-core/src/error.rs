//! Core error types

use qprefs_admin::{AdminError, Condition};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefError {
    /// A recognized backend condition, normalized at the accessor boundary
    #[error("Preference '{property}' cannot be accessed: {source}")]
    Rejected {
        property: String,
        #[source]
        source: AdminError,
    },

    #[error("Unparseable default value for preference type for preference {0}")]
    NoDefaultAvailable(String),

    #[error("Target not found: {domain}")]
    TargetNotFound {
        domain: String,
        #[source]
        source: AdminError,
    },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] qprefs_storage::StorageError),

    /// Backend failure outside the recognized conditions, passed through unchanged
    #[error(transparent)]
    Backend(AdminError),
}

/// What went wrong, independent of which backend call produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AccessDenied,
    NoSuchProperty,
    InvalidValue,
    NoDefaultAvailable,
    TargetNotFound,
    Unclassified,
}

impl PrefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PrefError::Rejected { source, .. } => match source.condition() {
                Some(Condition::AccessDenied) => ErrorKind::AccessDenied,
                Some(Condition::NoSuchProperty) => ErrorKind::NoSuchProperty,
                Some(Condition::InvalidValue) => ErrorKind::InvalidValue,
                None => ErrorKind::Unclassified,
            },
            PrefError::NoDefaultAvailable(_) => ErrorKind::NoDefaultAvailable,
            PrefError::TargetNotFound { .. } | PrefError::InvalidTarget(_) => {
                ErrorKind::TargetNotFound
            }
            PrefError::Config(_) | PrefError::Storage(_) | PrefError::Backend(_) => {
                ErrorKind::Unclassified
            }
        }
    }

    /// Whether this error came out of the normalization path
    pub fn is_normalized(&self) -> bool {
        matches!(
            self,
            PrefError::Rejected { .. } | PrefError::NoDefaultAvailable(_)
        )
    }

    /// The backend error this one wraps, if any
    pub fn backend_error(&self) -> Option<&AdminError> {
        match self {
            PrefError::Rejected { source, .. }
            | PrefError::TargetNotFound { source, .. }
            | PrefError::Backend(source) => Some(source),
            _ => None,
        }
    }
}

/// Fold the recognized backend conditions for `property` into
/// [`PrefError::Rejected`]; everything else passes through.
pub(crate) fn translate(property: &str, err: AdminError) -> PrefError {
    match err.condition() {
        Some(condition) => {
            tracing::warn!(property = %property, ?condition, error = %err, "Preference operation rejected");
            PrefError::Rejected {
                property: property.to_string(),
                source: err,
            }
        }
        None => PrefError::Backend(err),
    }
}
