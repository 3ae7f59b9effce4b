//! QPREFS Storage Layer
//!
//! SQLite-backed stand-in for the administration backend.
//! Property definitions are shared per holder class (system, domain);
//! overrides are stored per holder. Validation of values happens here,
//! never in the accessor layer.

mod database;
mod error;
mod migrations;
mod model;
mod session;

pub use database::Database;
pub use error::StorageError;
pub use model::{HolderClass, PropertyDefinition, PropertyKind};
pub use session::{LocalHolder, LocalSession, LocalSessionFactory};

pub type Result<T> = std::result::Result<T, StorageError>;
