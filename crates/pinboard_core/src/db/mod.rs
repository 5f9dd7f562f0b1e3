//! SQLite file behind `SqliteKvStore`.
//!
//! # Responsibility
//! - Open the key-value database and bring its schema up to date.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A file written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Key-value database failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// File schema is ahead of what this build understands.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "key-value database error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "key-value database uses schema {found}; this build reads up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
