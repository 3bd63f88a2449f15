//! SQLite bootstrap and schema provisioning entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for repository use.
//! - Apply the collected table schemas before any data access.
//!
//! # Invariants
//! - The provisioned schema version is mirrored to `PRAGMA user_version`.
//! - Repositories must not read/write before provisioning succeeds.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod provision;

pub use open::{open_db, open_db_in_memory};
pub use provision::DatabaseSchema;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
