//! Whole-target views and idempotent state application

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use qprefs_admin::{AdminSession, PropertyValue};

use crate::accessor::PreferenceAccessor;
use crate::Result;

/// One property as currently seen on a target.
///
/// A property the backend lists but cannot read keeps its place in the
/// report with `error` set and the unreadable fields left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub name: String,
    pub value: Option<PropertyValue>,
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreferenceEntry {
    pub fn is_readable(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Change {
    /// Explicit value written
    Set {
        name: String,
        old: PropertyValue,
        new: PropertyValue,
    },
    /// Override dropped, property back at its default
    Reset { name: String, old: PropertyValue },
}

impl Change {
    pub fn name(&self) -> &str {
        match self {
            Change::Set { name, .. } | Change::Reset { name, .. } => name,
        }
    }
}

impl<S: AdminSession> PreferenceAccessor<S> {
    /// Every listed property with its value and default flag.
    ///
    /// Only a failing `list` fails the whole snapshot; per-property
    /// failures are recorded on their entry.
    pub fn snapshot(&self) -> Result<Vec<PreferenceEntry>> {
        let entries = self
            .list()?
            .into_iter()
            .map(|name| {
                let value = self.get(&name);
                let is_default = self.is_default(&name);

                let error = match (&value, &is_default) {
                    (Err(err), _) | (_, Err(err)) => {
                        tracing::warn!(
                            scope = %self.target(),
                            property = %name,
                            error = %err,
                            "Preference unreadable in snapshot"
                        );
                        Some(err.to_string())
                    }
                    _ => None,
                };

                PreferenceEntry {
                    name,
                    value: value.ok(),
                    is_default: is_default.ok(),
                    error,
                }
            })
            .collect();

        Ok(entries)
    }

    /// Bring the target in line with `desired`.
    ///
    /// `None` means "use the default": an existing override is dropped.
    /// `Some(value)` is written when the property is still at its default
    /// or currently holds something not equivalent to it; the recorded new
    /// value is what the backend stored. Stops at the first failure;
    /// changes made before it stay applied.
    pub fn apply(&self, desired: &BTreeMap<String, Option<PropertyValue>>) -> Result<Vec<Change>> {
        let mut changes = Vec::new();

        for (name, wanted) in desired {
            let current = self.get(name)?;
            let is_default = self.is_default(name)?;

            match wanted {
                None if is_default => {}
                None => {
                    self.delete(name)?;
                    changes.push(Change::Reset {
                        name: name.clone(),
                        old: current,
                    });
                }
                Some(value) if !is_default && value.equivalent(&current) => {}
                Some(value) => {
                    self.set(name, value.clone())?;
                    let stored = self.get(name)?;
                    changes.push(Change::Set {
                        name: name.clone(),
                        old: current,
                        new: stored,
                    });
                }
            }
        }

        tracing::info!(
            scope = %self.target(),
            requested = desired.len(),
            changed = changes.len(),
            "Applied preferences"
        );

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::ScopedPreferenceAccessor;
    use crate::error::ErrorKind;
    use qprefs_storage::{
        Database, HolderClass, LocalSessionFactory, PropertyDefinition, PropertyKind,
    };
    use serde_json::json;

    fn factory() -> LocalSessionFactory {
        let db = Database::open_in_memory().unwrap();
        db.define_property(&PropertyDefinition::new(
            HolderClass::System,
            "stats_interval",
            PropertyKind::Float,
            json!(3.0),
        ))
        .unwrap();
        db.define_property(&PropertyDefinition::new(
            HolderClass::System,
            "keyboard_layout",
            PropertyKind::Str,
            json!(["us"]),
        ))
        .unwrap();
        db.add_domain("work").unwrap();
        db.add_domain("sys-firewall").unwrap();
        LocalSessionFactory::new(db)
    }

    fn desired(entries: &[(&str, Option<PropertyValue>)]) -> BTreeMap<String, Option<PropertyValue>> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_snapshot() {
        let factory = factory();
        let work = ScopedPreferenceAccessor::new(&factory, "work").unwrap();
        work.set("memory", 1024i64).unwrap();

        let snapshot = work.snapshot().unwrap();
        assert_eq!(snapshot.len(), work.list().unwrap().len());

        assert!(snapshot.iter().all(|e| e.is_readable()));

        let memory = snapshot.iter().find(|e| e.name == "memory").unwrap();
        assert_eq!(memory.value, Some(PropertyValue::Int(1024)));
        assert_eq!(memory.is_default, Some(false));

        let vcpus = snapshot.iter().find(|e| e.name == "vcpus").unwrap();
        assert_eq!(vcpus.is_default, Some(true));
    }

    #[test]
    fn test_snapshot_keeps_unreadable_entries() {
        let factory = factory();
        let system = PreferenceAccessor::new(&factory).unwrap();

        let snapshot = system.snapshot().unwrap();
        assert_eq!(snapshot.len(), system.list().unwrap().len());

        let layout = snapshot
            .iter()
            .find(|e| e.name == "keyboard_layout")
            .unwrap();
        assert!(!layout.is_readable());
        assert!(layout.value.is_none());
        assert_eq!(layout.is_default, Some(true));
        assert!(layout.error.as_deref().unwrap().contains("keyboard_layout"));

        let interval = snapshot
            .iter()
            .find(|e| e.name == "stats_interval")
            .unwrap();
        assert_eq!(interval.value, Some(PropertyValue::Float(3.0)));
        assert!(interval.is_readable());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let factory = factory();
        let work = ScopedPreferenceAccessor::new(&factory, "work").unwrap();
        let wanted = desired(&[
            ("memory", Some(PropertyValue::Int(2048))),
            ("netvm", Some(PropertyValue::from("sys-firewall"))),
            ("autostart", None),
        ]);

        let changes = work.apply(&wanted).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            Change::Set {
                name: "memory".to_string(),
                old: PropertyValue::Int(400),
                new: PropertyValue::Int(2048),
            }
        );
        assert_eq!(changes[1].name(), "netvm");

        assert!(work.apply(&wanted).unwrap().is_empty());
    }

    #[test]
    fn test_apply_coerced_values_are_stable() {
        let factory = factory();
        let system = PreferenceAccessor::new(&factory).unwrap();
        let wanted = desired(&[("stats_interval", Some(PropertyValue::Int(5)))]);

        let changes = system.apply(&wanted).unwrap();
        assert_eq!(
            changes,
            vec![Change::Set {
                name: "stats_interval".to_string(),
                old: PropertyValue::Float(3.0),
                new: PropertyValue::Float(5.0),
            }]
        );
        assert!(system.apply(&wanted).unwrap().is_empty());

        let work = ScopedPreferenceAccessor::new(&factory, "work").unwrap();
        let wanted = desired(&[("netvm", Some(PropertyValue::from("")))]);
        assert_eq!(work.apply(&wanted).unwrap().len(), 1);
        assert!(work.apply(&wanted).unwrap().is_empty());
    }

    #[test]
    fn test_apply_pins_default_value() {
        let factory = factory();
        let work = ScopedPreferenceAccessor::new(&factory, "work").unwrap();

        // Same value as the default, but not yet explicit
        let changes = work
            .apply(&desired(&[("vcpus", Some(PropertyValue::Int(2)))]))
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert!(!work.is_default("vcpus").unwrap());
    }

    #[test]
    fn test_apply_reset() {
        let factory = factory();
        let work = ScopedPreferenceAccessor::new(&factory, "work").unwrap();
        work.set("debug", true).unwrap();

        let changes = work.apply(&desired(&[("debug", None)])).unwrap();
        assert_eq!(
            changes,
            vec![Change::Reset {
                name: "debug".to_string(),
                old: PropertyValue::Bool(true),
            }]
        );
        assert!(work.is_default("debug").unwrap());
    }

    #[test]
    fn test_apply_stops_on_rejection() {
        let factory = factory();
        let work = ScopedPreferenceAccessor::new(&factory, "work").unwrap();

        let err = work
            .apply(&desired(&[
                ("autostart", Some(PropertyValue::Bool(true))),
                ("memory", Some(PropertyValue::from("huge"))),
            ]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert_eq!(work.get("autostart").unwrap(), PropertyValue::Bool(true));
    }

    #[test]
    fn test_change_serialization() {
        let change = Change::Reset {
            name: "debug".to_string(),
            old: PropertyValue::Bool(true),
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            serde_json::json!({"action": "reset", "name": "debug", "old": true})
        );
    }
}
