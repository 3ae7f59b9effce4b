//! Database connection and data model operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::StorageError;
use crate::migrations::run_migrations;
use crate::model::{HolderClass, PropertyDefinition, PropertyKind};
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Register a managed domain
    pub fn add_domain(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(StorageError::Corrupt(
                "Domain name cannot be empty".to_string(),
            ));
        }

        let created_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO domains (name, created_at) VALUES (?1, ?2)",
                rusqlite::params![name, created_at],
            )?;
            Ok(())
        })?;

        tracing::info!(domain = %name, "Registered domain");
        Ok(())
    }

    /// Remove a domain and its overrides
    pub fn remove_domain(&self, name: &str) -> Result<()> {
        self.transaction(|conn| {
            conn.execute("DELETE FROM property_values WHERE holder = ?1", [name])?;
            conn.execute("DELETE FROM domains WHERE name = ?1", [name])?;
            Ok(())
        })
    }

    pub fn domain_exists(&self, name: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM domains WHERE name = ?1", [name], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn domain_names(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM domains ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(names)
        })
    }

    /// Insert or replace a property definition
    pub fn define_property(&self, definition: &PropertyDefinition) -> Result<()> {
        let default_json = serde_json::to_string(&definition.default)?;

        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO property_definitions
                 (class, name, kind, default_value, writable)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    definition.class.as_str(),
                    definition.name,
                    definition.kind.as_str(),
                    default_json,
                    definition.writable as i32,
                ],
            )?;
            Ok(())
        })
    }

    pub fn property_definition(
        &self,
        class: HolderClass,
        name: &str,
    ) -> Result<Option<PropertyDefinition>> {
        let row = self.with_connection(|conn| {
            let row = conn
                .query_row(
                    "SELECT kind, default_value, writable FROM property_definitions
                     WHERE class = ?1 AND name = ?2",
                    rusqlite::params![class.as_str(), name],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i32>(2)? != 0,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((kind, default_json, writable)) = row else {
            return Ok(None);
        };

        let kind = kind
            .parse::<PropertyKind>()
            .map_err(StorageError::Corrupt)?;
        let default = serde_json::from_str(&default_json)?;

        Ok(Some(PropertyDefinition {
            class,
            name: name.to_string(),
            kind,
            default,
            writable,
        }))
    }

    pub fn property_names(&self, class: HolderClass) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM property_definitions WHERE class = ?1 ORDER BY name")?;
            let names = stmt
                .query_map([class.as_str()], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(names)
        })
    }

    /// Stored override for a property, as raw JSON text
    pub fn override_value(&self, holder: &str, name: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM property_values WHERE holder = ?1 AND name = ?2",
                    [holder, name],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_override(&self, holder: &str, name: &str, value_json: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO property_values (holder, name, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![holder, name, value_json, updated_at],
            )?;
            Ok(())
        })
    }

    pub fn clear_override(&self, holder: &str, name: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM property_values WHERE holder = ?1 AND name = ?2",
                [holder, name],
            )?;
            Ok(())
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
