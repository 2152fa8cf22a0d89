//! Unit of work for academic year transitions.
//!
//! # Responsibility
//! - Bind a Year Store and a Student Store to one storage transaction.
//! - Commit only when the whole unit of work succeeds.
//!
//! # Invariants
//! - Any `Err` returned by the unit of work, or raised by begin/commit,
//!   leaves storage exactly as it was before the call.
//! - The SQLite implementation takes the database write lock when the
//!   transaction begins (`BEGIN IMMEDIATE`), so two transitions never
//!   interleave, even across connections or processes.

use crate::repo::student_repo::{SqliteStudentRepository, StudentStore};
use crate::repo::year_repo::{SqliteYearRepository, YearStore};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Storage that can run a year transition as one serializable unit.
///
/// Not exported: only `YearTransitionService` drives the stores it hands out.
pub(crate) trait TransitionStore {
    /// Runs `work` against stores sharing one transaction.
    ///
    /// Commits when `work` returns `Ok`; rolls back on any error.
    fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&dyn YearStore, &dyn StudentStore) -> Result<T, E>;
}

/// SQLite-backed transition unit of work.
///
/// Public only as the handle passed to `YearTransitionService`.
pub struct SqliteTransitionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTransitionStore<'conn> {
    /// Creates the store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TransitionStore for SqliteTransitionStore<'_> {
    fn within_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&dyn YearStore, &dyn StudentStore) -> Result<T, E>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;

        let years = SqliteYearRepository::new_unchecked(&tx);
        let students = SqliteStudentRepository::new_unchecked(&tx);
        // Dropping `tx` on the error path rolls back.
        let value = work(&years, &students)?;

        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}
