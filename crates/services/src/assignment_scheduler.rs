use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use routine_core::DateRange;
use routine_core::model::{Assignment, AssignmentId, KidId, Routine, RoutineId, TutorId};
use storage::repository::{AssignmentRepository, KidRepository, RoutineRepository, StorageError};
use tracing::{debug, info};

use crate::error::{Missing, SchedulerError};

/// Owns the `(kid, day) -> assignment` schedule.
///
/// At most one non-skipped assignment exists per kid per day. Conflicts are
/// reported to the caller; nothing is replaced implicitly.
#[derive(Clone)]
pub struct AssignmentScheduler {
    kids: Arc<dyn KidRepository>,
    routines: Arc<dyn RoutineRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl AssignmentScheduler {
    #[must_use]
    pub fn new(
        kids: Arc<dyn KidRepository>,
        routines: Arc<dyn RoutineRepository>,
        assignments: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            kids,
            routines,
            assignments,
        }
    }

    /// The assignment occupying `date` for the kid, if any.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Storage` if repository access fails.
    pub async fn assignment_for(
        &self,
        kid_id: &KidId,
        date: NaiveDate,
    ) -> Result<Option<Assignment>, SchedulerError> {
        Ok(self.assignments.active_for_day(kid_id, date).await?)
    }

    /// Schedule `routine_id` for the kid on `date`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::DuplicateAssignment` if the day is taken,
    /// `SchedulerError::NotFound` for an unknown kid or routine, and
    /// `SchedulerError::Storage` if persistence fails.
    pub async fn create(
        &self,
        kid_id: &KidId,
        date: NaiveDate,
        routine_id: &RoutineId,
        assigned_by: &TutorId,
    ) -> Result<Assignment, SchedulerError> {
        if self.kids.get_kid(kid_id).await?.is_none() {
            return Err(SchedulerError::NotFound(Missing::Kid(kid_id.clone())));
        }
        if self.routines.get_routine(routine_id).await?.is_none() {
            return Err(SchedulerError::NotFound(Missing::Routine(routine_id.clone())));
        }
        let duplicate = || SchedulerError::DuplicateAssignment {
            kid_id: kid_id.clone(),
            date,
        };
        if self.assignments.active_for_day(kid_id, date).await?.is_some() {
            return Err(duplicate());
        }

        let assignment = Assignment::new(
            AssignmentId::generate(),
            routine_id.clone(),
            kid_id.clone(),
            date,
            assigned_by.clone(),
        );
        match self.assignments.insert_assignment(&assignment).await {
            Ok(()) => {}
            // lost a race with another writer for the same day
            Err(StorageError::Conflict) => return Err(duplicate()),
            Err(e) => return Err(e.into()),
        }

        info!(
            assignment_id = %assignment.id(),
            kid_id = %kid_id,
            routine_id = %routine_id,
            %date,
            "assignment created"
        );
        Ok(assignment)
    }

    /// Assignments for the kid inside `range`, oldest first. Skipped entries
    /// are included.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Storage` if repository access fails.
    pub async fn list_for_kid(
        &self,
        kid_id: &KidId,
        range: DateRange,
    ) -> Result<Vec<Assignment>, SchedulerError> {
        Ok(self.assignments.list_for_kid(kid_id, range).await?)
    }

    /// # Errors
    ///
    /// Returns `SchedulerError::Storage` if repository access fails.
    pub async fn get(&self, id: &AssignmentId) -> Result<Option<Assignment>, SchedulerError> {
        Ok(self.assignments.get_assignment(id).await?)
    }

    /// Mark an assignment skipped, freeing its day for a new assignment.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotFound` for an unknown id and
    /// `SchedulerError::InvalidTransition` if it is already completed or skipped.
    pub async fn skip(&self, id: &AssignmentId) -> Result<Assignment, SchedulerError> {
        let mut assignment = self.require(id).await?;
        assignment.skip()?;
        self.assignments.update_assignment(&assignment).await?;
        info!(assignment_id = %id, kid_id = %assignment.kid_id(), "assignment skipped");
        Ok(assignment)
    }

    pub(crate) async fn routine(&self, id: &RoutineId) -> Result<Option<Routine>, SchedulerError> {
        Ok(self.routines.get_routine(id).await?)
    }

    pub(crate) async fn mark_in_progress(
        &self,
        id: &AssignmentId,
    ) -> Result<Assignment, SchedulerError> {
        let mut assignment = self.require(id).await?;
        assignment.mark_in_progress()?;
        self.assignments.update_assignment(&assignment).await?;
        debug!(assignment_id = %id, "assignment in progress");
        Ok(assignment)
    }

    pub(crate) async fn complete(
        &self,
        id: &AssignmentId,
        completed_at: DateTime<Utc>,
        total_time_spent_seconds: u64,
    ) -> Result<Assignment, SchedulerError> {
        let mut assignment = self.require(id).await?;
        assignment.complete(completed_at, total_time_spent_seconds)?;
        self.assignments.update_assignment(&assignment).await?;
        info!(
            assignment_id = %id,
            total_time_spent_seconds,
            "assignment completed"
        );
        Ok(assignment)
    }

    async fn require(&self, id: &AssignmentId) -> Result<Assignment, SchedulerError> {
        self.assignments
            .get_assignment(id)
            .await?
            .ok_or_else(|| SchedulerError::NotFound(Missing::Assignment(id.clone())))
    }
}
