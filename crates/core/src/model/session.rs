use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{AssignmentId, ExerciseId};

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a training session stands.
///
/// `ReadyToComplete` means every exercise has been processed but the routine
/// has not been finalized yet. Finalizing clears the session, which is
/// `NotStarted` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Paused,
    ReadyToComplete,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NotStarted => "not started",
            SessionState::InProgress => "in progress",
            SessionState::Paused => "paused",
            SessionState::ReadyToComplete => "ready to complete",
        };
        f.write_str(label)
    }
}

/// Operations of the session state machine, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    CompleteExercise,
    Pause,
    Resume,
    CompleteRoutine,
    Cancel,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionAction::Start => "start",
            SessionAction::CompleteExercise => "complete an exercise",
            SessionAction::Pause => "pause",
            SessionAction::Resume => "resume",
            SessionAction::CompleteRoutine => "complete the routine",
            SessionAction::Cancel => "cancel",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {action} while the session is {state}")]
    InvalidTransition {
        action: SessionAction,
        state: SessionState,
    },

    #[error("session record is inconsistent: {0}")]
    Inconsistent(String),
}

//
// ─── EXERCISE RESULT ───────────────────────────────────────────────────────────
//

/// Outcome of one exercise inside a session. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseResult {
    exercise_id: ExerciseId,
    started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    time_spent_seconds: u32,
    skipped: bool,
}

impl ExerciseResult {
    #[must_use]
    pub fn exercise_id(&self) -> ExerciseId {
        self.exercise_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// `None` for skipped exercises.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn time_spent_seconds(&self) -> u32 {
        self.time_spent_seconds
    }

    #[must_use]
    pub fn skipped(&self) -> bool {
        self.skipped
    }
}

//
// ─── TRAINING SESSION ──────────────────────────────────────────────────────────
//

/// Resumable progress through one assignment's exercises.
///
/// The serialized form is the persisted session record:
/// `assignmentId`, `currentExerciseIndex`, `startedAt`, `isPaused`,
/// `isCompleted`, `exerciseResults`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
    assignment_id: AssignmentId,
    current_exercise_index: usize,
    started_at: DateTime<Utc>,
    is_paused: bool,
    is_completed: bool,
    exercise_results: Vec<ExerciseResult>,
}

impl TrainingSession {
    #[must_use]
    pub fn start(assignment_id: AssignmentId, started_at: DateTime<Utc>) -> Self {
        Self {
            assignment_id,
            current_exercise_index: 0,
            started_at,
            is_paused: false,
            is_completed: false,
            exercise_results: Vec::new(),
        }
    }

    #[must_use]
    pub fn assignment_id(&self) -> &AssignmentId {
        &self.assignment_id
    }

    #[must_use]
    pub fn current_exercise_index(&self) -> usize {
        self.current_exercise_index
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn exercise_results(&self) -> &[ExerciseResult] {
        &self.exercise_results
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_completed {
            SessionState::ReadyToComplete
        } else if self.is_paused {
            SessionState::Paused
        } else {
            SessionState::InProgress
        }
    }

    /// Sum of time spent across all recorded exercises.
    #[must_use]
    pub fn total_time_spent_seconds(&self) -> u64 {
        self.exercise_results
            .iter()
            .map(|r| u64::from(r.time_spent_seconds))
            .sum()
    }

    /// Append a result and advance by exactly one exercise.
    ///
    /// `exercise_count` is the routine length; reaching it marks the session
    /// completed. The result's start is `at - time_spent`, never earlier than
    /// the session start. Skipped exercises carry no completion time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is in progress.
    pub fn record_exercise(
        &mut self,
        exercise_id: ExerciseId,
        time_spent_seconds: u32,
        skipped: bool,
        at: DateTime<Utc>,
        exercise_count: usize,
    ) -> Result<&ExerciseResult, SessionError> {
        self.require(SessionAction::CompleteExercise, SessionState::InProgress)?;

        let started_at =
            (at - Duration::seconds(i64::from(time_spent_seconds))).max(self.started_at);
        self.exercise_results.push(ExerciseResult {
            exercise_id,
            started_at,
            completed_at: (!skipped).then_some(at),
            time_spent_seconds,
            skipped,
        });
        self.current_exercise_index += 1;
        self.is_completed = self.current_exercise_index == exercise_count;

        self.exercise_results
            .last()
            .ok_or_else(|| SessionError::Inconsistent("result was not recorded".into()))
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is in progress.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.require(SessionAction::Pause, SessionState::InProgress)?;
        self.is_paused = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is paused.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.require(SessionAction::Resume, SessionState::Paused)?;
        self.is_paused = false;
        Ok(())
    }

    /// Check that a rehydrated record agrees with itself and its routine.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Inconsistent` describing the first violation.
    pub fn validate(&self, exercise_count: usize) -> Result<(), SessionError> {
        if self.current_exercise_index != self.exercise_results.len() {
            return Err(SessionError::Inconsistent(format!(
                "index {} does not match {} recorded results",
                self.current_exercise_index,
                self.exercise_results.len()
            )));
        }
        if self.current_exercise_index > exercise_count {
            return Err(SessionError::Inconsistent(format!(
                "index {} exceeds routine length {exercise_count}",
                self.current_exercise_index
            )));
        }
        if self.is_completed != (self.current_exercise_index == exercise_count) {
            return Err(SessionError::Inconsistent(format!(
                "completion flag {} disagrees with index {} of {exercise_count}",
                self.is_completed, self.current_exercise_index
            )));
        }
        if self.is_paused && self.is_completed {
            return Err(SessionError::Inconsistent(
                "completed session is marked paused".into(),
            ));
        }
        Ok(())
    }

    fn require(&self, action: SessionAction, expected: SessionState) -> Result<(), SessionError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { action, state })
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
