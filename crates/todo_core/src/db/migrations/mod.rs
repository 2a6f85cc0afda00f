//! Schema steps for the `kv_slots` table, versioned through `PRAGMA user_version`.
//!
//! v1 creates `kv_slots(key, value, updated_at)`; the store snapshot is the
//! row keyed `todos-storage`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SLOT_SCHEMA: &[SchemaStep] = &[SchemaStep {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Schema version a fully set up slot database reports.
pub fn latest_version() -> u32 {
    SLOT_SCHEMA.last().map_or(0, |step| step.version)
}

/// Brings `kv_slots` up to `latest_version()`; a no-op when already there.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::SchemaTooNew {
            found: current_version,
            supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in SLOT_SCHEMA.iter().filter(|step| step.version > current_version) {
        tx.execute_batch(step.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={current_version} to_version={latest}");
    Ok(())
}

/// Schema version stored in the slot file; `0` for a fresh file.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
