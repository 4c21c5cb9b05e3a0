//! Document store schema migrations.
//!
//! # Responsibility
//! - Create the shared `documents` table that backs every configured
//!   collection.
//! - Bring older store files up to the schema this build understands.
//!
//! # Invariants
//! - Steps are listed in strictly increasing `version` order.
//! - All pending steps commit in one transaction together with
//!   `PRAGMA user_version`, so a store is never left half-migrated.
//! - Collection names are data, not schema; renaming a collection in settings
//!   never needs a migration.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "documents",
    sql: include_str!("0001_documents.sql"),
}];

/// Schema version written by the newest step in this build.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Upgrades the store schema to `latest_version()`.
///
/// A store stamped with a newer version is refused rather than opened.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let stored = stored_schema_version(conn)?;
    let latest = latest_version();

    if stored > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: latest,
        });
    }
    if stored == latest {
        debug!(
            "event=db_migrate module=db status=skip schema_version={}",
            stored
        );
        return Ok(());
    }

    let tx = conn.transaction()?;
    let pending = SCHEMA_STEPS.iter().filter(|step| step.version > stored);
    for step in pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} step={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} collections_table=documents",
        stored, latest
    );
    Ok(())
}

fn stored_schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    Ok(version)
}
