use cohort_core::db::open_db_in_memory;
use cohort_core::{
    AcademicYear, ProgramYearStats, RepoError, SqliteStudentRepository, SqliteYearRepository,
    Student, StudentListQuery, StudentRepository, StudentValidationError, YearRepository,
};
use rusqlite::Connection;

fn create_year(conn: &Connection, label: &str) -> AcademicYear {
    SqliteYearRepository::try_new(conn)
        .unwrap()
        .create(label)
        .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let year = create_year(&conn, "2024-2025");
    let repo = SqliteStudentRepository::try_new(&conn).unwrap();

    let mut student = Student::new("Ada", "Lovelace", "P1", year.uuid);
    student.email = Some("ada@example.org".to_string());
    let id = repo.create_student(&student).unwrap();

    let loaded = repo.get_student(id).unwrap().unwrap();
    assert_eq!(loaded, student);
    assert!(loaded.is_active());
}

#[test]
fn create_rejects_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let year = create_year(&conn, "2024-2025");
    let repo = SqliteStudentRepository::try_new(&conn).unwrap();

    let student = Student::new("Ada", "Lovelace", "  ", year.uuid);
    assert!(matches!(
        repo.create_student(&student).unwrap_err(),
        RepoError::Validation(StudentValidationError::BlankProgramCode)
    ));
}

#[test]
fn find_active_by_year_skips_archived_and_other_years() {
    let conn = open_db_in_memory().unwrap();
    let current = create_year(&conn, "2024-2025");
    let other = create_year(&conn, "2023-2024");
    let repo = SqliteStudentRepository::try_new(&conn).unwrap();

    let active = Student::new("Ada", "Lovelace", "P1", current.uuid);
    let mut archived = Student::new("Grace", "Hopper", "P3", current.uuid);
    archived.is_archived = true;
    let elsewhere = Student::new("Alan", "Turing", "P2", other.uuid);
    for student in [&active, &archived, &elsewhere] {
        repo.create_student(student).unwrap();
    }

    let loaded = repo.find_active_by_year(current.uuid).unwrap();
    assert_eq!(loaded, vec![active]);
}

#[test]
fn list_students_filters_and_orders_by_name() {
    let conn = open_db_in_memory().unwrap();
    let year = create_year(&conn, "2024-2025");
    let repo = SqliteStudentRepository::try_new(&conn).unwrap();

    let mut archived = Student::new("Grace", "Hopper", "P3", year.uuid);
    archived.is_archived = true;
    repo.create_student(&Student::new("Alan", "Turing", "P2", year.uuid))
        .unwrap();
    repo.create_student(&archived).unwrap();
    repo.create_student(&Student::new("Ada", "Lovelace", "P1", year.uuid))
        .unwrap();

    let active: Vec<String> = repo
        .list_students(&StudentListQuery::default())
        .unwrap()
        .into_iter()
        .map(|student| student.last_name)
        .collect();
    assert_eq!(active, vec!["Lovelace", "Turing"]);

    let all: Vec<String> = repo
        .list_students(&StudentListQuery {
            include_archived: true,
            ..StudentListQuery::default()
        })
        .unwrap()
        .into_iter()
        .map(|student| student.last_name)
        .collect();
    assert_eq!(all, vec!["Hopper", "Lovelace", "Turing"]);

    let paged = repo
        .list_students(&StudentListQuery {
            include_archived: true,
            limit: Some(1),
            offset: 1,
            ..StudentListQuery::default()
        })
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].last_name, "Lovelace");
}

#[test]
fn update_student_overwrites_stored_fields() {
    let conn = open_db_in_memory().unwrap();
    let year = create_year(&conn, "2024-2025");
    let repo = SqliteStudentRepository::try_new(&conn).unwrap();

    let mut student = Student::new("Ada", "Lovelace", "P1", year.uuid);
    repo.create_student(&student).unwrap();

    student.last_name = "King".to_string();
    student.email = Some("ada@example.org".to_string());
    repo.update_student(&student).unwrap();
    assert_eq!(repo.get_student(student.uuid).unwrap().unwrap(), student);

    let unknown = Student::new("Alan", "Turing", "P1", year.uuid);
    assert!(matches!(
        repo.update_student(&unknown).unwrap_err(),
        RepoError::StudentNotFound(id) if id == unknown.uuid
    ));
}

#[test]
fn delete_student_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let year = create_year(&conn, "2024-2025");
    let repo = SqliteStudentRepository::try_new(&conn).unwrap();
    let student = Student::new("Ada", "Lovelace", "P1", year.uuid);
    repo.create_student(&student).unwrap();

    repo.delete_student(student.uuid).unwrap();
    assert!(repo.get_student(student.uuid).unwrap().is_none());
    assert!(matches!(
        repo.delete_student(student.uuid).unwrap_err(),
        RepoError::StudentNotFound(_)
    ));
}

#[test]
fn program_statistics_groups_by_year_and_program() {
    let conn = open_db_in_memory().unwrap();
    let old = create_year(&conn, "2023-2024");
    let new = create_year(&conn, "2024-2025");
    let repo = SqliteStudentRepository::try_new(&conn).unwrap();

    let mut graduate = Student::new("Grace", "Hopper", "P3", old.uuid);
    graduate.is_archived = true;
    repo.create_student(&graduate).unwrap();
    repo.create_student(&Student::new("Ada", "Lovelace", "P1", new.uuid))
        .unwrap();
    repo.create_student(&Student::new("Alan", "Turing", "P1", new.uuid))
        .unwrap();
    repo.create_student(&Student::new("Edsger", "Dijkstra", "X9", new.uuid))
        .unwrap();

    let stats = repo.program_statistics().unwrap();
    assert_eq!(
        stats,
        vec![
            ProgramYearStats {
                program_code: "P1".to_string(),
                year_label: "2024-2025".to_string(),
                total: 2,
                active: 2,
                archived: 0,
            },
            ProgramYearStats {
                program_code: "X9".to_string(),
                year_label: "2024-2025".to_string(),
                total: 1,
                active: 1,
                archived: 0,
            },
            ProgramYearStats {
                program_code: "P3".to_string(),
                year_label: "2023-2024".to_string(),
                total: 1,
                active: 0,
                archived: 1,
            },
        ]
    );
}
