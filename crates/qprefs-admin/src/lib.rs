//! QPREFS Administration Interface
//!
//! The boundary between preference accessors and the virtualization
//! platform's administration object model:
//! - A session exposes the system-wide property holder
//! - Domains (managed VMs) are looked up by name and expose their own holder
//! - Property values are one of: absent, bool, string, integer, float
//! - Defaults that have no well-formed representation are returned as a
//!   sentinel, not raised

mod error;
mod session;
mod value;

pub use error::{AdminError, Condition};
pub use session::{AdminSession, DefaultValue, PropertyHolder, SessionConfig, SessionFactory};
pub use value::PropertyValue;

pub type Result<T> = std::result::Result<T, AdminError>;
