//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide enrollment, lookup, listing, correction, removal and program
//!   statistics.
//! - Provide the crate-private Student Store the transition engine consumes.
//!
//! # Invariants
//! - Write paths call `Student::validate()` before SQL mutations.
//! - `save_all` is all-or-nothing: it opens its own transaction in
//!   autocommit mode and joins the caller's transaction otherwise.
//! - Listing is deterministic: `last_name ASC, first_name ASC, uuid ASC`.

use crate::model::academic_year::YearId;
use crate::model::student::{Student, StudentId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_flag, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const STUDENT_SELECT_SQL: &str = "SELECT
    uuid,
    first_name,
    last_name,
    email,
    program_code,
    is_archived,
    year_uuid
FROM students";

const STUDENT_ORDER_SQL: &str = " ORDER BY last_name ASC, first_name ASC, uuid ASC";

/// Query options for listing students.
#[derive(Debug, Clone, Default)]
pub struct StudentListQuery {
    /// Restrict to students referencing this year.
    pub year_uuid: Option<YearId>,
    pub include_archived: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Per program and year head counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramYearStats {
    pub program_code: String,
    pub year_label: String,
    pub total: u64,
    pub active: u64,
    pub archived: u64,
}

/// Admin repository for students.
pub trait StudentRepository {
    fn create_student(&self, student: &Student) -> RepoResult<StudentId>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Loads every non-archived student referencing `year`.
    fn find_active_by_year(&self, year: YearId) -> RepoResult<Vec<Student>>;
    fn list_students(&self, query: &StudentListQuery) -> RepoResult<Vec<Student>>;
    /// Overwrites one stored student. `StudentNotFound` when the id is unknown.
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    /// Hard-deletes one student.
    fn delete_student(&self, id: StudentId) -> RepoResult<()>;
    /// Head counts grouped by program code and year label, newest year first.
    fn program_statistics(&self) -> RepoResult<Vec<ProgramYearStats>>;
}

/// Student Store contract used by the transition orchestrator.
pub(crate) trait StudentStore: StudentRepository {
    /// Persists updated students. Either all rows are written or none are.
    fn save_all(&self, students: &[Student]) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentStore for SqliteStudentRepository<'_> {
    fn save_all(&self, students: &[Student]) -> RepoResult<()> {
        for student in students {
            student.validate()?;
        }

        if !self.conn.is_autocommit() {
            return write_students(self.conn, students);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_students(&tx, students)?;
        tx.commit()?;
        Ok(())
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, student: &Student) -> RepoResult<StudentId> {
        student.validate()?;

        self.conn.execute(
            "INSERT INTO students (
                uuid,
                first_name,
                last_name,
                email,
                program_code,
                is_archived,
                year_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                student.uuid.to_string(),
                student.first_name.as_str(),
                student.last_name.as_str(),
                student.email.as_deref(),
                student.program_code.as_str(),
                bool_to_int(student.is_archived),
                student.year_uuid.to_string(),
            ],
        )?;

        Ok(student.uuid)
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }
        Ok(None)
    }

    fn find_active_by_year(&self, year: YearId) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL}
             WHERE year_uuid = ?1
               AND is_archived = 0{STUDENT_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([year.to_string()])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }

    fn list_students(&self, query: &StudentListQuery) -> RepoResult<Vec<Student>> {
        let mut sql = format!("{STUDENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_archived {
            sql.push_str(" AND is_archived = 0");
        }

        if let Some(year_uuid) = query.year_uuid {
            sql.push_str(" AND year_uuid = ?");
            bind_values.push(Value::Text(year_uuid.to_string()));
        }

        sql.push_str(STUDENT_ORDER_SQL);

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;
        write_students(self.conn, std::slice::from_ref(student))
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::StudentNotFound(id));
        }
        Ok(())
    }

    fn program_statistics(&self) -> RepoResult<Vec<ProgramYearStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                s.program_code,
                y.label,
                COUNT(*) AS total,
                SUM(CASE WHEN s.is_archived = 0 THEN 1 ELSE 0 END) AS active,
                SUM(CASE WHEN s.is_archived = 1 THEN 1 ELSE 0 END) AS archived
             FROM students s
             INNER JOIN academic_years y ON y.uuid = s.year_uuid
             GROUP BY s.program_code, y.label
             ORDER BY y.label DESC, s.program_code ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut stats = Vec::new();
        while let Some(row) = rows.next()? {
            stats.push(ProgramYearStats {
                program_code: row.get(0)?,
                year_label: row.get(1)?,
                total: parse_count(row.get(2)?)?,
                active: parse_count(row.get(3)?)?,
                archived: parse_count(row.get(4)?)?,
            });
        }
        Ok(stats)
    }
}

fn write_students(conn: &Connection, students: &[Student]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "UPDATE students
         SET
            first_name = ?1,
            last_name = ?2,
            email = ?3,
            program_code = ?4,
            is_archived = ?5,
            year_uuid = ?6,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?7;",
    )?;

    for student in students {
        let changed = stmt.execute(params![
            student.first_name.as_str(),
            student.last_name.as_str(),
            student.email.as_deref(),
            student.program_code.as_str(),
            bool_to_int(student.is_archived),
            student.year_uuid.to_string(),
            student.uuid.to_string(),
        ])?;
        if changed == 0 {
            return Err(RepoError::StudentNotFound(student.uuid));
        }
    }

    Ok(())
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let uuid_text: String = row.get("uuid")?;
    let year_text: String = row.get("year_uuid")?;

    let student = Student {
        uuid: parse_uuid(&uuid_text, "students.uuid")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        program_code: row.get("program_code")?,
        is_archived: parse_flag(row.get("is_archived")?, "students.is_archived")?,
        year_uuid: parse_uuid(&year_text, "students.year_uuid")?,
    };
    student.validate()?;
    Ok(student)
}

fn parse_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative student count `{value}`")))
}
