//! Academic year repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide public read and admin access over `academic_years`.
//! - Provide the crate-private Year Store the transition engine consumes.
//!
//! # Invariants
//! - Labels are unique; `create` reports a clash as `DuplicateYear`.
//! - At most one row has `is_current = 1` (also enforced by a partial
//!   unique index). `set_current` must follow `clear_current_flag` inside
//!   one transaction.
//! - New years are never created current.
//! - Only `YearStore` moves the current flag, and it is not exported.

use crate::model::academic_year::{validate_label, AcademicYear, YearId};
use crate::repo::{ensure_connection_ready, parse_flag, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};

const YEAR_SELECT_SQL: &str = "SELECT
    uuid,
    label,
    is_current
FROM academic_years";

/// Read and admin access to academic years.
///
/// Nothing here changes which year is current.
pub trait YearRepository {
    /// Loads the year flagged current, if any.
    fn find_current(&self) -> RepoResult<Option<AcademicYear>>;
    fn find_by_label(&self, label: &str) -> RepoResult<Option<AcademicYear>>;
    fn exists_by_label(&self, label: &str) -> RepoResult<bool>;
    /// Creates a non-current year.
    fn create(&self, label: &str) -> RepoResult<AcademicYear>;
    fn get_year(&self, id: YearId) -> RepoResult<Option<AcademicYear>>;
    /// Lists every year ordered by label.
    fn list_years(&self) -> RepoResult<Vec<AcademicYear>>;
    /// Counts students referencing the year, archived or not.
    fn count_students_in_year(&self, id: YearId) -> RepoResult<u64>;
    /// Hard-deletes one non-current year. Storage refuses while students
    /// reference it; the current year is refused with `CurrentYearLocked`.
    fn delete_year(&self, id: YearId) -> RepoResult<()>;
}

/// Year Store contract used by the transition orchestrator.
///
/// Implementations must not assume they run inside a transaction; the
/// orchestrator provides one through `TransitionStore`.
pub(crate) trait YearStore: YearRepository {
    /// Clears the current flag on every year.
    fn clear_current_flag(&self) -> RepoResult<()>;
    /// Flags one year current. Fails if another year still carries the flag.
    fn set_current(&self, id: YearId) -> RepoResult<()>;
}

/// SQLite-backed academic year repository.
///
/// Callers outside the crate get read and admin access only:
///
/// ```compile_fail
/// use cohort_core::db::open_db_in_memory;
/// use cohort_core::SqliteYearRepository;
///
/// let conn = open_db_in_memory().unwrap();
/// let repo = SqliteYearRepository::try_new(&conn).unwrap();
/// repo.clear_current_flag().unwrap();
/// ```
pub struct SqliteYearRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteYearRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Creates repository without re-checking schema readiness.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_one(&self, filter_sql: &str, value: &str) -> RepoResult<Option<AcademicYear>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{YEAR_SELECT_SQL} WHERE {filter_sql};"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_year_row(row)?));
        }
        Ok(None)
    }
}

impl YearRepository for SqliteYearRepository<'_> {
    fn find_current(&self) -> RepoResult<Option<AcademicYear>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{YEAR_SELECT_SQL} WHERE is_current = 1;"))?;
        let mut rows = stmt.query([])?;
        let current = match rows.next()? {
            Some(row) => parse_year_row(row)?,
            None => return Ok(None),
        };
        if rows.next()?.is_some() {
            return Err(RepoError::InvalidData(
                "more than one academic year flagged current".to_string(),
            ));
        }
        Ok(Some(current))
    }

    fn find_by_label(&self, label: &str) -> RepoResult<Option<AcademicYear>> {
        self.query_one("label = ?1", label)
    }

    fn exists_by_label(&self, label: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM academic_years WHERE label = ?1);",
            [label],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create(&self, label: &str) -> RepoResult<AcademicYear> {
        validate_label(label)?;
        let year = AcademicYear::new(label);

        let inserted = self.conn.execute(
            "INSERT INTO academic_years (uuid, label, is_current) VALUES (?1, ?2, 0);",
            params![year.uuid.to_string(), year.label.as_str()],
        );
        match inserted {
            Ok(_) => Ok(year),
            Err(err) if is_unique_violation(&err) => Err(RepoError::DuplicateYear(year.label)),
            Err(err) => Err(err.into()),
        }
    }

    fn get_year(&self, id: YearId) -> RepoResult<Option<AcademicYear>> {
        self.query_one("uuid = ?1", &id.to_string())
    }

    fn list_years(&self) -> RepoResult<Vec<AcademicYear>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{YEAR_SELECT_SQL} ORDER BY label ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut years = Vec::new();
        while let Some(row) = rows.next()? {
            years.push(parse_year_row(row)?);
        }
        Ok(years)
    }

    fn count_students_in_year(&self, id: YearId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM students WHERE year_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative student count `{count}`")))
    }

    fn delete_year(&self, id: YearId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM academic_years WHERE uuid = ?1 AND is_current = 0;",
            [id.to_string()],
        )?;
        if changed > 0 {
            return Ok(());
        }
        match self.get_year(id)? {
            Some(_) => Err(RepoError::CurrentYearLocked(id)),
            None => Err(RepoError::YearNotFound(id)),
        }
    }
}

impl YearStore for SqliteYearRepository<'_> {
    fn clear_current_flag(&self) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE academic_years
             SET is_current = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE is_current = 1;",
            [],
        )?;
        Ok(())
    }

    fn set_current(&self, id: YearId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE academic_years
             SET is_current = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::YearNotFound(id));
        }
        Ok(())
    }
}

fn parse_year_row(row: &Row<'_>) -> RepoResult<AcademicYear> {
    let uuid_text: String = row.get("uuid")?;
    let label: String = row.get("label")?;
    if validate_label(&label).is_err() {
        return Err(RepoError::InvalidData(format!(
            "invalid label `{label}` in academic_years.label"
        )));
    }

    Ok(AcademicYear {
        uuid: parse_uuid(&uuid_text, "academic_years.uuid")?,
        label,
        is_current: parse_flag(row.get("is_current")?, "academic_years.is_current")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) => {
            inner.code == ErrorCode::ConstraintViolation
                && inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}
