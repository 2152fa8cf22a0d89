use cohort_core::{Student, StudentValidationError};
use uuid::Uuid;

#[test]
fn new_student_is_active_without_email() {
    let year = Uuid::new_v4();
    let student = Student::new("Ada", "Lovelace", "P1", year);

    assert!(student.is_active());
    assert!(!student.is_archived);
    assert_eq!(student.email, None);
    assert_eq!(student.year_uuid, year);
    assert_eq!(student.full_name(), "Ada Lovelace");
    assert!(student.validate().is_ok());
}

#[test]
fn validate_rejects_blank_fields_in_order() {
    let year = Uuid::new_v4();

    assert_eq!(
        Student::new(" ", "", "", year).validate(),
        Err(StudentValidationError::BlankFirstName)
    );
    assert_eq!(
        Student::new("Ada", "\t", "P1", year).validate(),
        Err(StudentValidationError::BlankLastName)
    );
    assert_eq!(
        Student::new("Ada", "Lovelace", "", year).validate(),
        Err(StudentValidationError::BlankProgramCode)
    );
}

#[test]
fn archived_student_is_not_active() {
    let mut student = Student::new("Grace", "Hopper", "P3", Uuid::new_v4());
    student.is_archived = true;

    assert!(!student.is_active());
    assert!(student.validate().is_ok());
}

#[test]
fn serde_roundtrip_keeps_all_fields() {
    let mut student = Student::new("Alan", "Turing", "X9", Uuid::new_v4());
    student.email = Some("alan@example.org".to_string());

    let json = serde_json::to_string(&student).unwrap();
    let decoded: Student = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, student);
}
