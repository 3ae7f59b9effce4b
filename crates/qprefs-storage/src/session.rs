//! Local administration session
//!
//! Implements the administration traits on top of [`Database`].
//! With caching enabled, property reads are memoized per (holder, name)
//! for the lifetime of the session and invalidated on writes.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use qprefs_admin::{
    AdminError, AdminSession, DefaultValue, PropertyHolder, PropertyValue, SessionConfig,
    SessionFactory,
};

use crate::database::Database;
use crate::error::StorageError;
use crate::model::{HolderClass, PropertyDefinition, PropertyKind};

/// Holder key of the system object in the overrides table
const SYSTEM_HOLDER: &str = "";

type ReadCache = Arc<RwLock<HashMap<(String, String), PropertyValue>>>;

/// One property-carrying object: the system, or a single domain
pub struct LocalHolder {
    db: Database,
    class: HolderClass,
    holder: String,
    /// Shared with every holder of the same session; `None` when disabled
    cache: Option<ReadCache>,
}

impl LocalHolder {
    fn new(db: Database, class: HolderClass, holder: String, cache: Option<ReadCache>) -> Self {
        Self {
            db,
            class,
            holder,
            cache,
        }
    }

    /// Domain name, or `None` for the system object
    pub fn domain_name(&self) -> Option<&str> {
        match self.class {
            HolderClass::System => None,
            HolderClass::Domain => Some(&self.holder),
        }
    }

    fn definition(&self, name: &str) -> qprefs_admin::Result<PropertyDefinition> {
        self.db
            .property_definition(self.class, name)?
            .ok_or_else(|| AdminError::NoSuchProperty(name.to_string()))
    }

    fn cache_key(&self, name: &str) -> (String, String) {
        (self.holder.clone(), name.to_string())
    }

    fn cached(&self, name: &str) -> Option<PropertyValue> {
        let cache = self.cache.as_ref()?;
        cache.read().get(&self.cache_key(name)).cloned()
    }

    fn remember(&self, name: &str, value: &PropertyValue) {
        if let Some(cache) = &self.cache {
            cache.write().insert(self.cache_key(name), value.clone());
        }
    }

    fn invalidate(&self, name: &str) {
        if let Some(cache) = &self.cache {
            cache.write().remove(&self.cache_key(name));
        }
    }

    fn decode_override(&self, name: &str, raw: &str) -> qprefs_admin::Result<PropertyValue> {
        let json: serde_json::Value = serde_json::from_str(raw).map_err(StorageError::from)?;
        PropertyValue::from_json(&json).ok_or_else(|| {
            StorageError::Corrupt(format!("override for '{}' is not a scalar", name)).into()
        })
    }

    fn ensure_writable(&self, definition: &PropertyDefinition) -> qprefs_admin::Result<()> {
        if definition.writable {
            Ok(())
        } else {
            Err(AdminError::access(&definition.name, "property is read-only"))
        }
    }

    fn validate(
        &self,
        definition: &PropertyDefinition,
        value: &PropertyValue,
    ) -> qprefs_admin::Result<PropertyValue> {
        let coerced = definition.kind.coerce(value).ok_or_else(|| {
            AdminError::value(
                &definition.name,
                format!("expected {}, got {}", definition.kind, value.kind()),
            )
        })?;

        if let (PropertyKind::Vm, PropertyValue::Str(domain)) = (definition.kind, &coerced) {
            if self.domain_name() == Some(domain.as_str()) {
                return Err(AdminError::value(
                    &definition.name,
                    "a domain cannot reference itself",
                ));
            }
            if !self.db.domain_exists(domain)? {
                return Err(AdminError::value(
                    &definition.name,
                    format!("no such domain: {}", domain),
                ));
            }
        }

        Ok(coerced)
    }
}

impl PropertyHolder for LocalHolder {
    fn property_list(&self) -> qprefs_admin::Result<Vec<String>> {
        Ok(self.db.property_names(self.class)?)
    }

    fn property_get(&self, name: &str) -> qprefs_admin::Result<PropertyValue> {
        if let Some(value) = self.cached(name) {
            tracing::debug!(holder = %self.holder, property = %name, "Cache hit");
            return Ok(value);
        }

        let definition = self.definition(name)?;
        let value = match self.db.override_value(&self.holder, name)? {
            Some(raw) => self.decode_override(name, &raw)?,
            None => PropertyValue::from_json(&definition.default).ok_or_else(|| {
                AdminError::Backend(format!("property '{}' has no usable default", name))
            })?,
        };

        self.remember(name, &value);
        Ok(value)
    }

    fn property_set(&self, name: &str, value: &PropertyValue) -> qprefs_admin::Result<()> {
        let definition = self.definition(name)?;
        self.ensure_writable(&definition)?;
        let value = self.validate(&definition, value)?;

        let raw = serde_json::to_string(&value.to_json()).map_err(StorageError::from)?;
        self.db.set_override(&self.holder, name, &raw)?;
        self.invalidate(name);

        tracing::debug!(holder = %self.holder, property = %name, value = %value, "Set property");
        Ok(())
    }

    fn property_delete(&self, name: &str) -> qprefs_admin::Result<()> {
        let definition = self.definition(name)?;
        self.ensure_writable(&definition)?;

        self.db.clear_override(&self.holder, name)?;
        self.invalidate(name);

        tracing::debug!(holder = %self.holder, property = %name, "Reset property");
        Ok(())
    }

    fn property_get_default(&self, name: &str) -> qprefs_admin::Result<DefaultValue> {
        let definition = self.definition(name)?;

        Ok(match PropertyValue::from_json(&definition.default) {
            Some(value) => DefaultValue::Value(value),
            None => DefaultValue::Unparseable,
        })
    }

    fn property_is_default(&self, name: &str) -> qprefs_admin::Result<bool> {
        self.definition(name)?;
        Ok(self.db.override_value(&self.holder, name)?.is_none())
    }
}

/// Session over a local database; the session itself is the system holder
pub struct LocalSession {
    root: LocalHolder,
}

impl LocalSession {
    pub fn new(db: Database, config: SessionConfig) -> Self {
        let cache = config
            .cache_enabled
            .then(|| Arc::new(RwLock::new(HashMap::new())));

        Self {
            root: LocalHolder::new(db, HolderClass::System, SYSTEM_HOLDER.to_string(), cache),
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.root.cache.is_some()
    }
}

impl PropertyHolder for LocalSession {
    fn property_list(&self) -> qprefs_admin::Result<Vec<String>> {
        self.root.property_list()
    }

    fn property_get(&self, name: &str) -> qprefs_admin::Result<PropertyValue> {
        self.root.property_get(name)
    }

    fn property_set(&self, name: &str, value: &PropertyValue) -> qprefs_admin::Result<()> {
        self.root.property_set(name, value)
    }

    fn property_delete(&self, name: &str) -> qprefs_admin::Result<()> {
        self.root.property_delete(name)
    }

    fn property_get_default(&self, name: &str) -> qprefs_admin::Result<DefaultValue> {
        self.root.property_get_default(name)
    }

    fn property_is_default(&self, name: &str) -> qprefs_admin::Result<bool> {
        self.root.property_is_default(name)
    }
}

impl AdminSession for LocalSession {
    type Domain = LocalHolder;

    fn domain(&self, name: &str) -> qprefs_admin::Result<LocalHolder> {
        if !self.root.db.domain_exists(name)? {
            return Err(AdminError::NoSuchDomain(name.to_string()));
        }

        Ok(LocalHolder::new(
            self.root.db.clone(),
            HolderClass::Domain,
            name.to_string(),
            self.root.cache.clone(),
        ))
    }

    fn domains(&self) -> qprefs_admin::Result<Vec<String>> {
        Ok(self.root.db.domain_names()?)
    }
}

/// Opens sessions against a shared local database
#[derive(Clone)]
pub struct LocalSessionFactory {
    db: Database,
}

impl LocalSessionFactory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl SessionFactory for LocalSessionFactory {
    type Session = LocalSession;

    fn connect(&self, config: SessionConfig) -> qprefs_admin::Result<LocalSession> {
        tracing::debug!(cache_enabled = config.cache_enabled, "Opening local session");
        Ok(LocalSession::new(self.db.clone(), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.add_domain("work").unwrap();
        db.add_domain("sys-net").unwrap();
        db
    }

    fn session(db: &Database, cache_enabled: bool) -> LocalSession {
        LocalSessionFactory::new(db.clone())
            .connect(SessionConfig { cache_enabled })
            .unwrap()
    }

    #[test]
    fn test_domain_defaults_and_override() {
        let db = setup();
        let session = session(&db, false);
        let work = session.domain("work").unwrap();

        assert_eq!(work.property_get("memory").unwrap(), PropertyValue::Int(400));
        assert!(work.property_is_default("memory").unwrap());

        work.property_set("memory", &PropertyValue::Int(800)).unwrap();
        assert_eq!(work.property_get("memory").unwrap(), PropertyValue::Int(800));
        assert!(!work.property_is_default("memory").unwrap());

        work.property_delete("memory").unwrap();
        assert!(work.property_is_default("memory").unwrap());
        assert_eq!(work.property_get("memory").unwrap(), PropertyValue::Int(400));
    }

    #[test]
    fn test_overrides_are_per_holder() {
        let db = setup();
        let session = session(&db, false);
        let work = session.domain("work").unwrap();
        let net = session.domain("sys-net").unwrap();

        work.property_set("autostart", &PropertyValue::Bool(true)).unwrap();
        assert_eq!(net.property_get("autostart").unwrap(), PropertyValue::Bool(false));
    }

    #[test]
    fn test_unknown_domain() {
        let db = setup();
        let session = session(&db, true);
        assert_eq!(
            session.domain("vault").err(),
            Some(AdminError::NoSuchDomain("vault".to_string()))
        );
    }

    #[test]
    fn test_error_conditions() {
        let db = setup();
        let session = session(&db, false);
        let work = session.domain("work").unwrap();

        assert!(matches!(
            work.property_get("bogus"),
            Err(AdminError::NoSuchProperty(_))
        ));
        assert!(matches!(
            work.property_set("klass", &PropertyValue::from("TemplateVM")),
            Err(AdminError::PropertyAccess { .. })
        ));
        assert!(matches!(
            work.property_set("memory", &PropertyValue::from("lots")),
            Err(AdminError::PropertyValue { .. })
        ));
        assert!(matches!(
            work.property_set("netvm", &PropertyValue::from("sys-nope")),
            Err(AdminError::PropertyValue { .. })
        ));
        assert!(matches!(
            work.property_set("netvm", &PropertyValue::from("work")),
            Err(AdminError::PropertyValue { .. })
        ));
    }

    #[test]
    fn test_vm_reference() {
        let db = setup();
        let session = session(&db, false);
        let work = session.domain("work").unwrap();

        work.property_set("netvm", &PropertyValue::from("sys-net")).unwrap();
        assert_eq!(
            work.property_get("netvm").unwrap(),
            PropertyValue::from("sys-net")
        );

        work.property_set("netvm", &PropertyValue::from("")).unwrap();
        assert_eq!(work.property_get("netvm").unwrap(), PropertyValue::Absent);
        assert!(!work.property_is_default("netvm").unwrap());
    }

    #[test]
    fn test_unparseable_default() {
        let db = setup();
        db.define_property(&PropertyDefinition::new(
            HolderClass::System,
            "keyboard_layout",
            PropertyKind::Str,
            json!({"layout": "us", "variant": ""}),
        ))
        .unwrap();
        let session = session(&db, false);

        assert_eq!(
            session.property_get_default("keyboard_layout").unwrap(),
            DefaultValue::Unparseable
        );
        assert!(matches!(
            session.property_get("keyboard_layout"),
            Err(AdminError::Backend(_))
        ));
    }

    #[test]
    fn test_cache_serves_repeated_reads() {
        let db = setup();
        let cached = session(&db, true);
        assert!(cached.cache_enabled());
        let work = cached.domain("work").unwrap();

        assert_eq!(work.property_get("vcpus").unwrap(), PropertyValue::Int(2));

        // Written behind the session's back; the cached read wins
        db.set_override("work", "vcpus", "4").unwrap();
        assert_eq!(work.property_get("vcpus").unwrap(), PropertyValue::Int(2));

        // Writes through the session invalidate
        work.property_set("vcpus", &PropertyValue::Int(8)).unwrap();
        assert_eq!(work.property_get("vcpus").unwrap(), PropertyValue::Int(8));

        let uncached = session(&db, false);
        assert!(!uncached.cache_enabled());
    }

    #[test]
    fn test_float_accepts_int() {
        let db = setup();
        db.define_property(&PropertyDefinition::new(
            HolderClass::System,
            "stats_interval",
            PropertyKind::Float,
            json!(3.0),
        ))
        .unwrap();
        let session = session(&db, false);

        session
            .property_set("stats_interval", &PropertyValue::Int(5))
            .unwrap();
        assert_eq!(
            session.property_get("stats_interval").unwrap(),
            PropertyValue::Float(5.0)
        );
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let db = setup();
        db.define_property(&PropertyDefinition::new(
            HolderClass::System,
            "stats_interval",
            PropertyKind::Float,
            json!(3.0),
        ))
        .unwrap();
        let session = session(&db, false);

        assert!(matches!(
            session.property_set("stats_interval", &PropertyValue::Float(f64::INFINITY)),
            Err(AdminError::PropertyValue { .. })
        ));
        assert!(matches!(
            session.property_set("stats_interval", &PropertyValue::Float(f64::NAN)),
            Err(AdminError::PropertyValue { .. })
        ));
        assert_eq!(
            session.property_get("stats_interval").unwrap(),
            PropertyValue::Float(3.0)
        );
        assert!(session.property_is_default("stats_interval").unwrap());
    }

    #[test]
    fn test_read_only_system_property() {
        let factory = LocalSessionFactory::new(setup());
        factory
            .database()
            .define_property(
                &PropertyDefinition::new(
                    HolderClass::System,
                    "management_dispvm",
                    PropertyKind::Vm,
                    json!(null),
                )
                .read_only(),
            )
            .unwrap();
        let session = factory
            .connect(SessionConfig {
                cache_enabled: true,
            })
            .unwrap();

        assert!(matches!(
            session.property_set("management_dispvm", &PropertyValue::from("work")),
            Err(AdminError::PropertyAccess { .. })
        ));
        assert!(matches!(
            session.property_delete("management_dispvm"),
            Err(AdminError::PropertyAccess { .. })
        ));
        assert_eq!(
            session.property_get("management_dispvm").unwrap(),
            PropertyValue::Absent
        );
    }

    #[test]
    fn test_domains() {
        let db = setup();
        let session = session(&db, false);
        assert_eq!(session.domains().unwrap(), vec!["sys-net", "work"]);

        db.add_domain("vault").unwrap();
        assert_eq!(session.domains().unwrap(), vec!["sys-net", "vault", "work"]);
    }
}
