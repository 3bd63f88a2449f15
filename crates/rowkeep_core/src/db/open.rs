//! Connection bootstrap utilities.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure the pragmas repository correctness depends on.
//! - Provision the schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have the schema fully provisioned.

use super::provision::{provision, DatabaseSchema};
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and provisions the given schema.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, schema: &DatabaseSchema) -> DbResult<Connection> {
    open_mode("file", schema, || Connection::open(path))
}

/// Opens an in-memory SQLite database and provisions the given schema.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory(schema: &DatabaseSchema) -> DbResult<Connection> {
    open_mode("memory", schema, Connection::open_in_memory)
}

fn open_mode(
    mode: &'static str,
    schema: &DatabaseSchema,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, schema) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} schema_version={} duration_ms={}",
                schema.version(),
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, schema: &DatabaseSchema) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    provision(conn, schema)?;
    Ok(())
}
