//! Shared error types for the services crate.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use routine_core::model::{AssignmentError, AssignmentId, KidId, RoutineId, SessionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Kid(KidId),
    Routine(RoutineId),
    Assignment(AssignmentId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Kid(id) => write!(f, "kid {id}"),
            Missing::Routine(id) => write!(f, "routine {id}"),
            Missing::Assignment(id) => write!(f, "assignment {id}"),
        }
    }
}

/// Errors emitted by `AssignmentScheduler`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("kid {kid_id} already has an assignment on {date}")]
    DuplicateAssignment { kid_id: KidId, date: NaiveDate },
    #[error("{0} not found")]
    NotFound(Missing),
    #[error("routine {0} is assigned and cannot be changed; duplicate it instead")]
    RoutineInUse(RoutineId),
    #[error(transparent)]
    InvalidTransition(#[from] AssignmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TrainingSessionManager`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrainingError {
    #[error("assignment {0} not found")]
    AssignmentNotFound(AssignmentId),
    #[error("a session for assignment {active} is already active")]
    SessionAlreadyActive { active: AssignmentId },
    #[error("session not ready: {processed} of {total} exercises processed")]
    SessionNotReady { processed: usize, total: usize },
    #[error(transparent)]
    InvalidTransition(#[from] SessionError),
    #[error("failed to persist training session: {0}")]
    Persistence(#[source] StorageError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
