//! Versioned schema steps of the key-value database.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// `(version, sql)` pairs, strictly increasing.
const STEPS: &[(u32, &str)] = &[(1, include_str!("sql/0001_kv_entries.sql"))];

/// Newest schema version this build can write.
pub fn schema_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Version recorded in the database file.
pub fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Runs every step newer than the stored version inside one transaction.
///
/// Returns the number of steps applied.
pub fn migrate(conn: &mut Connection) -> DbResult<usize> {
    let found = stored_version(conn)?;
    let supported = schema_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&(u32, &str)> = STEPS.iter().filter(|(version, _)| *version > found).collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for (version, sql) in &pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", *version)?;
    }
    tx.commit()?;
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::{migrate, schema_version, stored_version};
    use rusqlite::Connection;

    #[test]
    fn migrate_is_applied_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), 1);
        assert_eq!(migrate(&mut conn).unwrap(), 0);
        assert_eq!(stored_version(&conn).unwrap(), schema_version());
    }
}
