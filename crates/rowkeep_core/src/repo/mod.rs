//! Generic repository layer over schema-driven SQLite tables.
//!
//! # Responsibility
//! - Define the entity/row mapping and lifecycle-hook contracts.
//! - Provide the generic CRUD engine and the child-replacement protocol.
//! - Coordinate transaction ownership across nested repository calls.
//!
//! # Invariants
//! - Every write path runs inside exactly one physical transaction per
//!   connection, shared by nested calls.
//! - Store errors propagate unchanged; the layer performs no silent
//!   recovery.
//! - Absent rows are `None`/no-op results, not errors.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod mapping;
pub mod registry;
pub mod repository;
pub mod txn;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// I/O-level store failure, propagated unchanged and never retried.
    Db(DbError),
    /// Insert conflicted with a unique constraint on a non-replacing path.
    UniqueViolation {
        table: &'static str,
        message: String,
    },
    /// `update`/`remove` called on an entity that was never persisted.
    MissingId { table: &'static str },
    /// Persisted row could not be materialized into an entity.
    InvalidData(String),
    /// No repository is registered for the entity type.
    NoRepository { entity: &'static str },
    /// A repository for the entity type is already registered.
    DuplicateRepository { entity: &'static str },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UniqueViolation { table, message } => {
                write!(f, "unique constraint violated on table {table}: {message}")
            }
            Self::MissingId { table } => {
                write!(f, "entity for table {table} has no id yet")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::NoRepository { entity } => {
                write!(f, "no repository registered for entity type {entity}")
            }
            Self::DuplicateRepository { entity } => {
                write!(f, "repository already registered for entity type {entity}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Maps a store failure raised by a write against `table`, turning
    /// unique-constraint conflicts into the typed variant.
    pub(crate) fn from_write(table: &'static str, value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, ref message) = value {
            let unique = code.code == rusqlite::ErrorCode::ConstraintViolation
                && (code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY);
            if unique {
                return Self::UniqueViolation {
                    table,
                    message: message
                        .clone()
                        .unwrap_or_else(|| "unique constraint failed".to_string()),
                };
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}
