//! Command handlers for the `cohort` CLI.
//!
//! # Responsibility
//! - Resolve configuration, open the database and run one command.
//! - Render results as plain text on stdout.

use crate::args::{Cli, Command, StudentsAction, YearsAction};
use anyhow::{anyhow, Context, Result};
use cohort_core::db::open_db;
use cohort_core::{
    init_logging, AcademicYear, AcademicYearService, CohortConfig, EnrollStudentRequest,
    SqliteStudentRepository, SqliteTransitionStore, SqliteYearRepository, StudentListQuery,
    StudentService, StudentServiceError, TransitionError, UpdateStudentRequest, YearId,
    YearServiceError, YearTransitionService,
};
use log::info;
use rusqlite::Connection;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

const EXIT_INTERNAL: u8 = 1;
const EXIT_REJECTED: u8 = 2;

/// Input problem detected by the CLI itself, such as an unknown year label.
#[derive(Debug)]
pub struct UsageError(String);

impl Display for UsageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => CohortConfig::load(path)?,
        None => CohortConfig::default(),
    };
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    config.validate()?;

    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log_dir `{}` is not valid UTF-8", log_dir.display()))?;
        init_logging(&config.log_level, log_dir).map_err(|err| anyhow!(err))?;
    }

    let conn = open_db(&config.database_path).with_context(|| {
        format!(
            "failed to open database `{}`",
            config.database_path.display()
        )
    })?;

    match cli.command {
        Command::Years { action } => run_years(&conn, action),
        Command::Advance { label } => run_advance(&conn, &config, &label),
        Command::Students { action } => run_students(&conn, action),
        Command::Stats => run_stats(&conn),
    }
}

/// Maps a failure to the process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.is::<UsageError>() {
            return EXIT_REJECTED;
        }
        if let Some(err) = cause.downcast_ref::<TransitionError>() {
            return if err.is_rejected() {
                EXIT_REJECTED
            } else {
                EXIT_INTERNAL
            };
        }
        if let Some(err) = cause.downcast_ref::<YearServiceError>() {
            return match err {
                YearServiceError::Repo(_) => EXIT_INTERNAL,
                _ => EXIT_REJECTED,
            };
        }
        if let Some(err) = cause.downcast_ref::<StudentServiceError>() {
            return match err {
                StudentServiceError::InvalidInput(_)
                | StudentServiceError::YearNotFound(_)
                | StudentServiceError::NoCurrentYear
                | StudentServiceError::StudentNotFound(_)
                | StudentServiceError::ArchivedYearFrozen(_) => EXIT_REJECTED,
                _ => EXIT_INTERNAL,
            };
        }
    }
    EXIT_INTERNAL
}

fn year_service(conn: &Connection) -> Result<AcademicYearService<SqliteYearRepository<'_>>> {
    Ok(AcademicYearService::new(SqliteYearRepository::try_new(conn)?))
}

fn resolve_label(conn: &Connection, label: &str) -> Result<AcademicYear> {
    year_service(conn)?
        .find_year_by_label(label)?
        .ok_or_else(|| UsageError(format!("academic year `{label}` does not exist")).into())
}

fn run_years(conn: &Connection, action: YearsAction) -> Result<()> {
    let service = year_service(conn)?;
    match action {
        YearsAction::List => {
            for year in service.list_years()? {
                println!("{}", render_year(&year));
            }
        }
        YearsAction::Current => match service.current_year()? {
            Some(year) => println!("{}", year.label),
            None => println!("no current academic year"),
        },
        YearsAction::Create { label } => {
            let year = service.create_year(&label)?;
            println!("created {} ({})", year.label, year.uuid);
        }
        YearsAction::Delete { label } => {
            let year = resolve_label(conn, &label)?;
            service.delete_year(year.uuid)?;
            println!("deleted {}", year.label);
        }
    }
    Ok(())
}

fn run_advance(conn: &Connection, config: &CohortConfig, label: &str) -> Result<()> {
    let store = SqliteTransitionStore::try_new(conn)?;
    let service = YearTransitionService::with_rules(store, config.promotion_rules()?);
    let report = service.advance_to_year_with_report(label)?;

    match &report.previous_label {
        Some(previous) => println!(
            "{} -> {}: advanced={} graduated={} carried={}",
            previous, report.year.label, report.advanced, report.graduated, report.carried
        ),
        None => println!("{} is now the current academic year", report.year.label),
    }
    info!(
        "event=cli_advance module=cli status=ok year={} promoted={}",
        report.year.label,
        report.promoted_total()
    );
    Ok(())
}

fn run_students(conn: &Connection, action: StudentsAction) -> Result<()> {
    let service = StudentService::new(
        SqliteStudentRepository::try_new(conn)?,
        SqliteYearRepository::try_new(conn)?,
    );
    match action {
        StudentsAction::Enroll {
            first_name,
            last_name,
            program,
            email,
            year,
        } => {
            let year_uuid = match year {
                Some(label) => Some(resolve_label(conn, &label)?.uuid),
                None => None,
            };
            let student = service.enroll(&EnrollStudentRequest {
                first_name,
                last_name,
                email,
                program_code: program,
                year_uuid,
            })?;
            println!("enrolled {} ({})", student.full_name(), student.uuid);
        }
        StudentsAction::Update {
            id,
            first_name,
            last_name,
            program,
            email,
            year,
        } => {
            let year_uuid = match year {
                Some(label) => Some(resolve_label(conn, &label)?.uuid),
                None => None,
            };
            let student = service.update_student(
                id,
                &UpdateStudentRequest {
                    first_name,
                    last_name,
                    email,
                    program_code: program,
                    year_uuid,
                },
            )?;
            println!("updated {} ({})", student.full_name(), student.uuid);
        }
        StudentsAction::Delete { id } => {
            service.delete_student(id)?;
            println!("deleted {id}");
        }
        StudentsAction::List { year, all } => {
            let year_uuid = match year {
                Some(label) => Some(resolve_label(conn, &label)?.uuid),
                None => None,
            };
            let labels = year_labels(conn)?;
            let students = service.list_students(&StudentListQuery {
                year_uuid,
                include_archived: all,
                ..StudentListQuery::default()
            })?;
            for student in students {
                let label = labels
                    .get(&student.year_uuid)
                    .map(String::as_str)
                    .unwrap_or("?");
                println!(
                    "{}  {:<24}  {:<6}  {}{}",
                    student.uuid,
                    format!("{}, {}", student.last_name, student.first_name),
                    student.program_code,
                    label,
                    if student.is_archived { "  archived" } else { "" }
                );
            }
        }
    }
    Ok(())
}

fn run_stats(conn: &Connection) -> Result<()> {
    let service = StudentService::new(
        SqliteStudentRepository::try_new(conn)?,
        SqliteYearRepository::try_new(conn)?,
    );
    println!(
        "{:<10}  {:<8}  {:>6}  {:>6}  {:>8}",
        "year", "program", "total", "active", "archived"
    );
    for row in service.program_statistics()? {
        println!(
            "{:<10}  {:<8}  {:>6}  {:>6}  {:>8}",
            row.year_label, row.program_code, row.total, row.active, row.archived
        );
    }
    Ok(())
}

fn year_labels(conn: &Connection) -> Result<HashMap<YearId, String>> {
    Ok(year_service(conn)?
        .list_years()?
        .into_iter()
        .map(|year| (year.uuid, year.label))
        .collect())
}

fn render_year(year: &AcademicYear) -> String {
    if year.is_current {
        format!("{} *", year.label)
    } else {
        year.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_code_for, UsageError, EXIT_INTERNAL, EXIT_REJECTED};
    use anyhow::anyhow;
    use cohort_core::{RepoError, StudentServiceError, TransitionError, YearServiceError};

    #[test]
    fn rejected_transition_exits_with_two() {
        let err = anyhow::Error::new(TransitionError::Rejected {
            current: "2024-2025".to_string(),
            proposed: "2026-2027".to_string(),
        });
        assert_eq!(exit_code_for(&err), EXIT_REJECTED);
    }

    #[test]
    fn storage_failure_exits_with_one() {
        let err = anyhow::Error::new(TransitionError::Internal(RepoError::InvalidData(
            "broken".to_string(),
        )));
        assert_eq!(exit_code_for(&err), EXIT_INTERNAL);
        assert_eq!(exit_code_for(&anyhow!("unexpected")), EXIT_INTERNAL);
    }

    #[test]
    fn usage_and_admin_errors_exit_with_two() {
        let err = anyhow::Error::new(UsageError("unknown year".to_string()));
        assert_eq!(exit_code_for(&err), EXIT_REJECTED);

        let err = anyhow::Error::new(YearServiceError::DuplicateYear("2024-2025".to_string()))
            .context("create failed");
        assert_eq!(exit_code_for(&err), EXIT_REJECTED);
    }

    #[test]
    fn student_lookup_and_frozen_year_exit_with_two() {
        let id = sample_student_id();
        let err = anyhow::Error::new(StudentServiceError::StudentNotFound(id));
        assert_eq!(exit_code_for(&err), EXIT_REJECTED);
        let err = anyhow::Error::new(StudentServiceError::ArchivedYearFrozen(id));
        assert_eq!(exit_code_for(&err), EXIT_REJECTED);
        let err = anyhow::Error::new(StudentServiceError::Repo(RepoError::InvalidData(
            "broken".to_string(),
        )));
        assert_eq!(exit_code_for(&err), EXIT_INTERNAL);
    }

    fn sample_student_id() -> cohort_core::StudentId {
        "6f1c2a7e-8d44-4c1b-9a53-2f0b1d3e4c5a".parse().unwrap()
    }
}
