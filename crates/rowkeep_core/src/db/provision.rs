//! Schema collection and provisioning executor.
//!
//! # Responsibility
//! - Collect every repository's table schema into one versioned set.
//! - Create tables on a fresh database, recreate them on version change.
//!
//! # Invariants
//! - Provisioning runs inside one transaction.
//! - `PRAGMA user_version` always ends up equal to the schema version.
//! - A database created by a newer schema version is rejected, never
//!   silently downgraded.

use crate::db::{DbError, DbResult};
use crate::schema::table::TableSchema;
use log::info;
use rusqlite::Connection;

/// The versioned set of table schemas owned by one database file.
///
/// Versions start at 1; `PRAGMA user_version` of 0 marks a fresh database.
#[derive(Debug, Clone)]
pub struct DatabaseSchema {
    version: u32,
    tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, table: TableSchema) {
        self.tables.push(table);
    }

    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.add_table(table);
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }
}

/// Brings the database up to the given schema.
///
/// Fresh databases get every create statement; databases at an older
/// version are recreated table by table (drop, then the table's upgrade
/// statements). Databases at a newer version are rejected.
pub fn provision(conn: &mut Connection, schema: &DatabaseSchema) -> DbResult<()> {
    let current = current_user_version(conn)?;
    let target = schema.version();

    if current > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: target,
        });
    }

    if current == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if current == 0 {
        for table in schema.tables() {
            tx.execute_batch(&table.create_table_sql())?;
        }
        info!(
            "event=schema_provision module=db status=ok action=create version={target} tables={}",
            schema.tables().len()
        );
    } else {
        for table in schema.tables() {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", table.name()))?;
        }
        for table in schema.tables() {
            for statement in table.upgrade_sql() {
                tx.execute_batch(&statement)?;
            }
        }
        info!(
            "event=schema_provision module=db status=ok action=recreate from={current} version={target} tables={}",
            schema.tables().len()
        );
    }
    tx.execute_batch(&format!("PRAGMA user_version = {target};"))?;
    tx.commit()?;

    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
