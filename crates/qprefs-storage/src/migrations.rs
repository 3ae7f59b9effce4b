//! Database migrations
//!
//! Schema: domains, property definitions, property overrides

use crate::Result;
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<i32, _> =
        conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        });

    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(rusqlite::Error::SqliteFailure(_, _)) => {
            // Table doesn't exist yet
            conn.execute(
                "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
                [],
            )?;
            conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v1: Initial schema");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS domains (
            name TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        );
    "#,
    )?;

    // Definitions are shared by every holder of a class
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS property_definitions (
            class TEXT NOT NULL CHECK (class IN ('system', 'domain')),
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            default_value TEXT NOT NULL DEFAULT 'null',
            writable INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (class, name)
        );
    "#,
    )?;

    // Explicit overrides; holder '' is the system object
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS property_values (
            holder TEXT NOT NULL,
            name TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (holder, name)
        );

        CREATE INDEX IF NOT EXISTS idx_property_values_holder ON property_values(holder);
    "#,
    )?;

    // Stock definitions
    conn.execute_batch(
        r#"
        INSERT OR IGNORE INTO property_definitions (class, name, kind, default_value, writable) VALUES
            ('system', 'clockvm', 'vm', 'null', 1),
            ('system', 'default_netvm', 'vm', 'null', 1),
            ('system', 'default_template', 'vm', 'null', 1),
            ('system', 'default_kernel', 'str', '""', 1),
            ('system', 'check_updates_vm', 'bool', 'true', 1),
            ('domain', 'autostart', 'bool', 'false', 1),
            ('domain', 'debug', 'bool', 'false', 1),
            ('domain', 'include_in_backups', 'bool', 'true', 1),
            ('domain', 'label', 'str', '"red"', 1),
            ('domain', 'memory', 'int', '400', 1),
            ('domain', 'maxmem', 'int', '4000', 1),
            ('domain', 'vcpus', 'int', '2', 1),
            ('domain', 'netvm', 'vm', 'null', 1),
            ('domain', 'kernelopts', 'str', '""', 1),
            ('domain', 'qrexec_timeout', 'int', '60', 1),
            ('domain', 'klass', 'str', '"AppVM"', 0);
    "#,
    )?;

    Ok(())
}
