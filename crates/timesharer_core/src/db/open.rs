//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections from `DatabaseSettings`.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable store.
//!
//! # Invariants
//! - Returned stores have migrations fully applied.
//! - Settings are validated before any file is touched.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, Store};
use crate::config::DatabaseSettings;
use log::{error, info};
use rusqlite::Connection;
use std::time::{Duration, Instant};

/// Opens the store described by `settings` and applies pending migrations.
///
/// # Side effects
/// - Creates the database directory for on-disk stores.
/// - Emits `db_open` logging events with duration and status.
pub fn open_store(settings: &DatabaseSettings) -> DbResult<Store> {
    let started_at = Instant::now();
    let mode = if settings.is_in_memory() {
        "memory"
    } else {
        "file"
    };
    info!(
        "event=db_open module=db status=start mode={} database={}",
        mode, settings.database_name
    );

    let result = settings
        .validate()
        .map_err(DbError::from)
        .and_then(|()| open_connection(settings));

    match result {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(Store::new(conn, settings.clone()))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn open_connection(settings: &DatabaseSettings) -> DbResult<Connection> {
    let mut conn = match settings.database_path() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(path)?
        }
        None => Connection::open_in_memory()?,
    };
    bootstrap_connection(&mut conn)?;
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
