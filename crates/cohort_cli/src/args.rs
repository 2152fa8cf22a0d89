//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use cohort_core::StudentId;
use std::path::PathBuf;

/// Track students through academic years.
#[derive(Parser, Debug)]
#[command(name = "cohort", version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides `database_path` from the config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and administer academic years
    Years {
        #[command(subcommand)]
        action: YearsAction,
    },

    /// Make LABEL the current academic year and promote students
    Advance {
        /// Next academic year, e.g. 2025-2026
        label: String,
    },

    /// Enroll, correct, remove and list students
    Students {
        #[command(subcommand)]
        action: StudentsAction,
    },

    /// Student counts per program and academic year
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum YearsAction {
    /// List all academic years
    List,
    /// Show the current academic year
    Current,
    /// Create a (non-current) academic year
    Create { label: String },
    /// Delete an academic year that is neither current nor referenced
    Delete { label: String },
}

#[derive(Subcommand, Debug)]
pub enum StudentsAction {
    /// Enroll one student
    Enroll {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Program code, e.g. P1
        #[arg(long)]
        program: String,
        #[arg(long)]
        email: Option<String>,
        /// Academic year label (defaults to the current year)
        #[arg(long)]
        year: Option<String>,
    },
    /// Correct fields of one student; omitted flags stay unchanged
    Update {
        id: StudentId,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        program: Option<String>,
        /// An empty value clears the email
        #[arg(long)]
        email: Option<String>,
        /// Move an active student to another academic year label
        #[arg(long)]
        year: Option<String>,
    },
    /// Remove one student record
    Delete { id: StudentId },
    /// List students
    List {
        /// Only students of this academic year
        #[arg(long)]
        year: Option<String>,
        /// Include archived students
        #[arg(long)]
        all: bool,
    },
}
