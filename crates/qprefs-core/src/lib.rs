//! QPREFS Core
//!
//! Preference access for the system object and for individual domains.
//! Backend failures of the access-denied, no-such-property and
//! invalid-value kinds come out as one normalized error; anything else
//! passes through untouched.

mod accessor;
mod config;
mod error;
mod state;
mod target;

pub use accessor::{PreferenceAccessor, ScopedPreferenceAccessor};
pub use config::Config;
pub use error::{ErrorKind, PrefError};
pub use state::{Change, PreferenceEntry};
pub use target::{Target, TargetResolver};

// Re-export the administration interface
pub use qprefs_admin::{
    AdminError, AdminSession, DefaultValue, PropertyHolder, PropertyValue, SessionConfig,
    SessionFactory,
};
pub use qprefs_storage::{Database, LocalSession, LocalSessionFactory, StorageError};

pub type Result<T> = std::result::Result<T, PrefError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
