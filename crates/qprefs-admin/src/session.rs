//! Administration session traits

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;
use crate::Result;

/// Outcome of a default lookup.
///
/// A property whose type has no well-formed default is reported through
/// `Unparseable` rather than through the error channel.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Value(PropertyValue),
    Unparseable,
}

/// Options recognized when opening a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Serve repeated reads from an in-session cache
    pub cache_enabled: bool,
}

/// An object in the administration model that carries properties
pub trait PropertyHolder {
    /// Names of the properties valid on this holder
    fn property_list(&self) -> Result<Vec<String>>;

    fn property_get(&self, name: &str) -> Result<PropertyValue>;

    fn property_set(&self, name: &str, value: &PropertyValue) -> Result<()>;

    /// Remove an explicit override, reverting to the default
    fn property_delete(&self, name: &str) -> Result<()>;

    fn property_get_default(&self, name: &str) -> Result<DefaultValue>;

    fn property_is_default(&self, name: &str) -> Result<bool>;
}

/// A live connection to the administration backend.
///
/// The session itself is the system-wide property holder.
pub trait AdminSession: PropertyHolder {
    type Domain: PropertyHolder;

    /// Look up a managed domain by name.
    ///
    /// Fails with `AdminError::NoSuchDomain` when the name is unknown.
    fn domain(&self, name: &str) -> Result<Self::Domain>;

    /// Names of all managed domains
    fn domains(&self) -> Result<Vec<String>>;
}

pub trait SessionFactory {
    type Session: AdminSession;

    fn connect(&self, config: SessionConfig) -> Result<Self::Session>;
}
