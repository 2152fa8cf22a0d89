//! Schema history for the cohort database.
//!
//! # Responsibility
//! - Hold the ordered schema steps this build knows about.
//! - Bring a connection up to the newest step inside one transaction.
//! - Confirm the objects the transition engine depends on are present.
//!
//! # Invariants
//! - Step versions start at 1 and grow by exactly one.
//! - `PRAGMA user_version` always names the last applied step.
//! - A database stamped with a newer version than this build is not touched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "academic_years",
        sql: include_str!("0001_academic_years.sql"),
    },
    Migration {
        version: 2,
        name: "students",
        sql: include_str!("0002_students.sql"),
    },
];

/// `(sqlite_master.type, name)` pairs a migrated database must contain.
///
/// The partial index is the storage-level guard for the single current year.
const REQUIRED_OBJECTS: &[(&str, &str)] = &[
    ("table", "academic_years"),
    ("index", "idx_academic_years_single_current"),
    ("table", "students"),
];

/// Newest schema version this build can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version stamped on `conn`.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
}

/// Upgrades `conn` to [`latest_version`] and verifies the result.
///
/// Emits one `db_migrate_step` event per applied step and a closing
/// `db_migrate` event. Nothing is logged when the schema is already current.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    if from_version < latest {
        let tx = conn.transaction()?;
        for step in MIGRATIONS.iter().filter(|step| step.version > from_version) {
            tx.execute_batch(step.sql)?;
            tx.pragma_update(None, "user_version", step.version)?;
            info!(
                "event=db_migrate_step module=db status=ok version={} name={}",
                step.version, step.name
            );
        }
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok from_version={} to_version={}",
            from_version, latest
        );
    }

    verify_schema(conn)
}

/// Fails with `MissingSchemaObject` when a required table or index is gone.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    for &(kind, name) in REQUIRED_OBJECTS {
        let present: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2);",
            [kind, name],
            |row| row.get(0),
        )?;
        if !present {
            return Err(DbError::MissingSchemaObject { kind, name });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, schema_version, verify_schema, MIGRATIONS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn step_versions_are_contiguous_from_one() {
        for (index, step) in MIGRATIONS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version() as usize, MIGRATIONS.len());
    }

    #[test]
    fn partial_upgrade_resumes_from_stamped_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0].sql).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        apply_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), latest_version());
        verify_schema(&conn).unwrap();
    }

    #[test]
    fn verify_schema_names_the_missing_object() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn.execute_batch("DROP INDEX idx_academic_years_single_current;")
            .unwrap();

        match verify_schema(&conn).unwrap_err() {
            DbError::MissingSchemaObject { kind, name } => {
                assert_eq!(kind, "index");
                assert_eq!(name, "idx_academic_years_single_current");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
