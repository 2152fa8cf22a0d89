use cohort_core::db::open_db_in_memory;
use cohort_core::{
    AcademicYearService, SqliteStudentRepository, SqliteTransitionStore, SqliteYearRepository,
    Student, StudentRepository, YearServiceError, YearTransitionService,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> AcademicYearService<SqliteYearRepository<'_>> {
    AcademicYearService::new(SqliteYearRepository::try_new(conn).unwrap())
}

#[test]
fn create_year_is_not_current() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let year = service.create_year("2024-2025").unwrap();
    assert!(!year.is_current);
    assert!(service.current_year().unwrap().is_none());
    assert_eq!(service.list_years().unwrap(), vec![year.clone()]);
    assert_eq!(service.get_year(year.uuid).unwrap(), Some(year));
}

#[test]
fn create_year_validates_label_and_uniqueness() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create_year("2024-2025").unwrap();

    assert!(matches!(
        service.create_year("2024/2025").unwrap_err(),
        YearServiceError::MalformedLabel(_)
    ));
    match service.create_year("2024-2025").unwrap_err() {
        YearServiceError::DuplicateYear(label) => assert_eq!(label, "2024-2025"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn delete_year_refuses_current_year() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTransitionStore::try_new(&conn).unwrap();
    let current = YearTransitionService::new(store)
        .advance_to_year("2024-2025")
        .unwrap();

    match service(&conn).delete_year(current.uuid).unwrap_err() {
        YearServiceError::YearIsCurrent(label) => assert_eq!(label, "2024-2025"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn delete_year_refuses_referenced_year() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let year = service.create_year("2020-2021").unwrap();
    let mut graduate = Student::new("Grace", "Hopper", "P3", year.uuid);
    graduate.is_archived = true;
    SqliteStudentRepository::try_new(&conn)
        .unwrap()
        .create_student(&graduate)
        .unwrap();

    match service.delete_year(year.uuid).unwrap_err() {
        YearServiceError::YearInUse { label, students } => {
            assert_eq!(label, "2020-2021");
            assert_eq!(students, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(service.find_year_by_label("2020-2021").unwrap().is_some());
}

#[test]
fn delete_unreferenced_year() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let year = service.create_year("2030-2031").unwrap();

    service.delete_year(year.uuid).unwrap();
    assert!(service.find_year_by_label("2030-2031").unwrap().is_none());
    assert!(matches!(
        service.delete_year(year.uuid).unwrap_err(),
        YearServiceError::YearNotFound(_)
    ));
}
