//! Database layer: connection setup and schema management.
//!
//! # Responsibility
//! - Hand out SQLite connections the repositories can rely on.
//! - Own the schema history in [`migrations`].
//!
//! # Invariants
//! - Every connection returned by [`open_db`] / [`open_db_in_memory`] is at
//!   [`migrations::latest_version`], has `foreign_keys=ON`, and still carries
//!   the single-current-year index.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or upgrading a database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A table or index the engine depends on was dropped after migration.
    MissingSchemaObject {
        kind: &'static str,
        name: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than this build supports ({latest_supported})"
            ),
            Self::MissingSchemaObject { kind, name } => {
                write!(f, "database schema is missing {kind} `{name}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
