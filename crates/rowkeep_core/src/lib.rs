//! Schema-driven repository core over embedded SQLite.
//!
//! Entities are declared through column descriptors, persisted through a
//! generic CRUD engine, and cascaded to child tables through lifecycle
//! hooks. All writes share one manually coordinated transaction per
//! connection, so nested repository calls are atomic as a whole.

pub mod db;
pub mod logging;
pub mod repo;
pub mod schema;

pub use db::{open_db, open_db_in_memory, DatabaseSchema, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use repo::mapping::{EntityHooks, EntityMapping, NoHooks};
pub use repo::registry::RepositoryRegistry;
pub use repo::repository::SqliteRepository;
pub use repo::txn::{in_transaction, TxnScope};
pub use repo::{RepoError, RepoResult};
pub use schema::column::{Column, ColumnReference, ColumnType, ID_COLUMN, PARENT_ID_COLUMN};
pub use schema::table::TableSchema;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
