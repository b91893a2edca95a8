//! SQLite snapshot sink.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the snapshot sink.
//! - Persist and reload whole-outline snapshots as seed bundles.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - The engine never blocks on this sink for correctness; the in-memory
//!   outline stays the single authority.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod snapshot;

pub use open::{open_db, open_db_in_memory};
pub use snapshot::{load_snapshot, save_snapshot};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Persisted data cannot be decoded into valid records.
    Corrupt(String),
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
            Self::Corrupt(message) => write!(f, "corrupt snapshot data: {message}"),
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
