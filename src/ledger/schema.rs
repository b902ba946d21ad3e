//! Ledger schema definitions and migrations.

use rusqlite::Connection;

use super::error::LedgerError;

/// Current schema version. Increment when making schema changes.
pub const SCHEMA_VERSION: i32 = 1;

/// Schema DDL for version 1.
///
/// `directory` is the path relative to the photo root (`""` for the root
/// itself, `/a/b` otherwise).
const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS uploads (
    directory TEXT NOT NULL,
    filename TEXT NOT NULL,
    uploaded_at INTEGER NOT NULL,
    PRIMARY KEY (directory, filename)
);
"#;

/// Get the current schema version from the ledger.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32, LedgerError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), LedgerError> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Reject ledgers written by a newer release.
pub(crate) fn check_supported(version: i32) -> Result<(), LedgerError> {
    if version > SCHEMA_VERSION {
        return Err(LedgerError::UnsupportedSchemaVersion {
            found: version,
            expected: SCHEMA_VERSION,
        });
    }
    Ok(())
}

/// Initialize or migrate the ledger schema.
///
/// Idempotent; safe on both new and existing ledgers.
pub(crate) fn migrate(conn: &Connection) -> Result<(), LedgerError> {
    let current_version = get_schema_version(conn)?;
    check_supported(current_version)?;

    if current_version == 0 {
        conn.execute_batch(SCHEMA_V1)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
        tracing::debug!("Initialized ledger schema at version {}", SCHEMA_VERSION);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ledger_migration() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_idempotent_migration() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_unsupported_version() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(matches!(
            migrate(&conn),
            Err(LedgerError::UnsupportedSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_uploads_table_created() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM uploads", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_primary_key_rejects_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute(
            "INSERT INTO uploads (directory, filename, uploaded_at) VALUES ('/a', '1.jpg', 0)",
            [],
        )
        .unwrap();
        assert!(conn
            .execute(
                "INSERT INTO uploads (directory, filename, uploaded_at) VALUES ('/a', '1.jpg', 1)",
                [],
            )
            .is_err());
    }
}
