use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{AssignmentId, KidId, RoutineId, TutorId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssignmentError {
    #[error("cannot move assignment from {from} to {to}")]
    InvalidTransition {
        from: AssignmentStatus,
        to: AssignmentStatus,
    },

    #[error("completed assignment is missing its completion time")]
    MissingCompletion,

    #[error("unknown assignment status: {0}")]
    UnknownStatus(String),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl AssignmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = AssignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(AssignmentError::UnknownStatus(s.to_string())),
        }
    }
}

//
// ─── ASSIGNMENT ────────────────────────────────────────────────────────────────
//

/// Binds one routine to one kid on one calendar date.
///
/// Assignments are never deleted. A day's assignment is replaced by skipping
/// it and creating a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    id: AssignmentId,
    routine_id: RoutineId,
    kid_id: KidId,
    assigned_date: NaiveDate,
    status: AssignmentStatus,
    assigned_by: TutorId,
    completed_at: Option<DateTime<Utc>>,
    total_time_spent_seconds: Option<u64>,
}

impl Assignment {
    /// Creates a pending assignment.
    #[must_use]
    pub fn new(
        id: AssignmentId,
        routine_id: RoutineId,
        kid_id: KidId,
        assigned_date: NaiveDate,
        assigned_by: TutorId,
    ) -> Self {
        Self {
            id,
            routine_id,
            kid_id,
            assigned_date,
            status: AssignmentStatus::Pending,
            assigned_by,
            completed_at: None,
            total_time_spent_seconds: None,
        }
    }

    /// Rehydrate an assignment from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::MissingCompletion` if a completed assignment
    /// has no completion time.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: AssignmentId,
        routine_id: RoutineId,
        kid_id: KidId,
        assigned_date: NaiveDate,
        status: AssignmentStatus,
        assigned_by: TutorId,
        completed_at: Option<DateTime<Utc>>,
        total_time_spent_seconds: Option<u64>,
    ) -> Result<Self, AssignmentError> {
        if status == AssignmentStatus::Completed && completed_at.is_none() {
            return Err(AssignmentError::MissingCompletion);
        }
        Ok(Self {
            id,
            routine_id,
            kid_id,
            assigned_date,
            status,
            assigned_by,
            completed_at,
            total_time_spent_seconds,
        })
    }

    #[must_use]
    pub fn id(&self) -> &AssignmentId {
        &self.id
    }

    #[must_use]
    pub fn routine_id(&self) -> &RoutineId {
        &self.routine_id
    }

    #[must_use]
    pub fn kid_id(&self) -> &KidId {
        &self.kid_id
    }

    #[must_use]
    pub fn assigned_date(&self) -> NaiveDate {
        self.assigned_date
    }

    #[must_use]
    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    #[must_use]
    pub fn assigned_by(&self) -> &TutorId {
        &self.assigned_by
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn total_time_spent_seconds(&self) -> Option<u64> {
        self.total_time_spent_seconds
    }

    /// Skipped assignments do not occupy their day.
    #[must_use]
    pub fn occupies_day(&self) -> bool {
        self.status != AssignmentStatus::Skipped
    }

    /// `Pending -> InProgress`. Already in progress is accepted as-is.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::InvalidTransition` from `Completed` or `Skipped`.
    pub fn mark_in_progress(&mut self) -> Result<(), AssignmentError> {
        match self.status {
            AssignmentStatus::Pending | AssignmentStatus::InProgress => {
                self.status = AssignmentStatus::InProgress;
                Ok(())
            }
            from => Err(AssignmentError::InvalidTransition {
                from,
                to: AssignmentStatus::InProgress,
            }),
        }
    }

    /// Record a finished training session.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::InvalidTransition` from `Completed` or `Skipped`.
    pub fn complete(
        &mut self,
        completed_at: DateTime<Utc>,
        total_time_spent_seconds: u64,
    ) -> Result<(), AssignmentError> {
        match self.status {
            AssignmentStatus::Pending | AssignmentStatus::InProgress => {
                self.status = AssignmentStatus::Completed;
                self.completed_at = Some(completed_at);
                self.total_time_spent_seconds = Some(total_time_spent_seconds);
                Ok(())
            }
            from => Err(AssignmentError::InvalidTransition {
                from,
                to: AssignmentStatus::Completed,
            }),
        }
    }

    /// Release the day so another assignment can take it.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::InvalidTransition` from `Completed` or `Skipped`.
    pub fn skip(&mut self) -> Result<(), AssignmentError> {
        match self.status {
            AssignmentStatus::Pending | AssignmentStatus::InProgress => {
                self.status = AssignmentStatus::Skipped;
                Ok(())
            }
            from => Err(AssignmentError::InvalidTransition {
                from,
                to: AssignmentStatus::Skipped,
            }),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn assignment() -> Assignment {
        Assignment::new(
            AssignmentId::new("assign-1"),
            RoutineId::new("routine-002"),
            KidId::new("kid-1"),
            NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            TutorId::new("tutor-1"),
        )
    }

    #[test]
    fn pending_to_completed_records_totals() {
        let mut a = assignment();
        a.mark_in_progress().unwrap();
        a.mark_in_progress().unwrap();
        a.complete(fixed_now(), 95).unwrap();

        assert_eq!(a.status(), AssignmentStatus::Completed);
        assert_eq!(a.completed_at(), Some(fixed_now()));
        assert_eq!(a.total_time_spent_seconds(), Some(95));
        assert!(a.occupies_day());
    }

    #[test]
    fn completed_cannot_be_skipped_or_restarted() {
        let mut a = assignment();
        a.complete(fixed_now(), 10).unwrap();

        assert_eq!(
            a.skip().unwrap_err(),
            AssignmentError::InvalidTransition {
                from: AssignmentStatus::Completed,
                to: AssignmentStatus::Skipped,
            }
        );
        assert!(a.mark_in_progress().is_err());
    }

    #[test]
    fn skipped_releases_the_day() {
        let mut a = assignment();
        a.skip().unwrap();
        assert!(!a.occupies_day());
        assert!(a.complete(fixed_now(), 1).is_err());
    }

    #[test]
    fn persisted_completed_requires_timestamp() {
        let err = Assignment::from_persisted(
            AssignmentId::new("a"),
            RoutineId::new("r"),
            KidId::new("k"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            AssignmentStatus::Completed,
            TutorId::new("t"),
            None,
            Some(5),
        )
        .unwrap_err();
        assert_eq!(err, AssignmentError::MissingCompletion);
    }

    #[test]
    fn status_string_round_trip() {
        for status in [
            AssignmentStatus::Pending,
            AssignmentStatus::InProgress,
            AssignmentStatus::Completed,
            AssignmentStatus::Skipped,
        ] {
            assert_eq!(status.as_str().parse::<AssignmentStatus>().unwrap(), status);
        }
    }
}
