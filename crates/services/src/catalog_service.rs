use std::sync::Arc;

use routine_core::model::{Kid, Routine, RoutineId, TutorId};
use storage::repository::{AssignmentRepository, KidRepository, RoutineRepository};
use tracing::info;

use crate::error::{Missing, SchedulerError};

/// Kid profiles and the routine library.
///
/// A routine that any assignment points at is frozen; tutors customize it
/// through [`CatalogService::duplicate_routine`].
#[derive(Clone)]
pub struct CatalogService {
    kids: Arc<dyn KidRepository>,
    routines: Arc<dyn RoutineRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl CatalogService {
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

    /// # Errors
    ///
    /// Returns `SchedulerError::Storage` if persistence fails.
    pub async fn save_kid(&self, kid: &Kid) -> Result<(), SchedulerError> {
        self.kids.upsert_kid(kid).await?;
        Ok(())
    }

    /// Insert a routine, or update one no assignment references yet.
    ///
    /// Saving identical content over a referenced routine is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::RoutineInUse` if the routine is referenced
    /// and the content differs, and `SchedulerError::Storage` if persistence fails.
    pub async fn save_routine(&self, routine: &Routine) -> Result<(), SchedulerError> {
        if let Some(existing) = self.routines.get_routine(routine.id()).await? {
            if existing == *routine {
                return Ok(());
            }
            if self.assignments.routine_referenced(routine.id()).await? {
                return Err(SchedulerError::RoutineInUse(routine.id().clone()));
            }
        }
        self.routines.upsert_routine(routine).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SchedulerError::Storage` if repository access fails.
    pub async fn kids_for_tutor(&self, tutor_id: &TutorId) -> Result<Vec<Kid>, SchedulerError> {
        Ok(self.kids.list_kids_for_tutor(tutor_id).await?)
    }

    /// # Errors
    ///
    /// Returns `SchedulerError::Storage` if repository access fails.
    pub async fn routine(&self, id: &RoutineId) -> Result<Option<Routine>, SchedulerError> {
        Ok(self.routines.get_routine(id).await?)
    }

    /// Routines ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Storage` if repository access fails.
    pub async fn routines(&self) -> Result<Vec<Routine>, SchedulerError> {
        Ok(self.routines.list_routines().await?)
    }

    /// Copy a routine into a private one owned by `tutor`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotFound` for an unknown routine and
    /// `SchedulerError::Storage` if persistence fails.
    pub async fn duplicate_routine(
        &self,
        id: &RoutineId,
        tutor: &TutorId,
    ) -> Result<Routine, SchedulerError> {
        let source = self
            .routines
            .get_routine(id)
            .await?
            .ok_or_else(|| SchedulerError::NotFound(Missing::Routine(id.clone())))?;
        let copy = source.duplicate_for(tutor.clone(), RoutineId::generate());
        self.routines.upsert_routine(&copy).await?;
        info!(source = %id, routine_id = %copy.id(), tutor_id = %tutor, "routine duplicated");
        Ok(copy)
    }
}
