use async_trait::async_trait;
use chrono::NaiveDate;
use routine_core::DateRange;
use routine_core::model::{Assignment, AssignmentId, Kid, KidId, Routine, RoutineId, TutorId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

#[async_trait]
pub trait KidRepository: Send + Sync {
    /// Persist or update a kid profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the kid cannot be stored.
    async fn upsert_kid(&self, kid: &Kid) -> Result<(), StorageError>;

    /// Fetch a kid by ID, `None` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_kid(&self, id: &KidId) -> Result<Option<Kid>, StorageError>;

    /// Kids managed by a tutor, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_kids_for_tutor(&self, tutor_id: &TutorId) -> Result<Vec<Kid>, StorageError>;
}

#[async_trait]
pub trait RoutineRepository: Send + Sync {
    /// Persist or update a routine.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the routine cannot be stored.
    async fn upsert_routine(&self, routine: &Routine) -> Result<(), StorageError>;

    /// Fetch a routine by ID, `None` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_routine(&self, id: &RoutineId) -> Result<Option<Routine>, StorageError>;

    /// All routines ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_routines(&self) -> Result<Vec<Routine>, StorageError>;
}

/// Query surface over routine assignments, indexed by `(kid, day)`.
///
/// Adapters refuse to hold two assignments that occupy the same day for the
/// same kid; skipped assignments do not occupy their day.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, StorageError>;

    /// The non-skipped assignment for a kid on a day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn active_for_day(
        &self,
        kid_id: &KidId,
        day: NaiveDate,
    ) -> Result<Option<Assignment>, StorageError>;

    /// Assignments for a kid inside `range`, ascending by date then insertion.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_for_kid(
        &self,
        kid_id: &KidId,
        range: DateRange,
    ) -> Result<Vec<Assignment>, StorageError>;

    /// Whether any assignment, in any status, points at the routine.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn routine_referenced(&self, routine_id: &RoutineId) -> Result<bool, StorageError>;

    /// Store a new assignment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the ID exists or the day is occupied.
    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StorageError>;

    /// Replace an existing assignment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the ID is unknown, or
    /// `StorageError::Conflict` if the update would double-book a day.
    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), StorageError>;
}

/// Durable key-value slot used to persist the active training session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct AssignmentTable {
    by_id: HashMap<AssignmentId, Assignment>,
    insertion: Vec<AssignmentId>,
    by_day: HashMap<(KidId, NaiveDate), AssignmentId>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    kids: Arc<Mutex<HashMap<KidId, Kid>>>,
    routines: Arc<Mutex<HashMap<RoutineId, Routine>>>,
    assignments: Arc<Mutex<AssignmentTable>>,
    kv: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl KidRepository for InMemoryRepository {
    async fn upsert_kid(&self, kid: &Kid) -> Result<(), StorageError> {
        let mut guard = self.kids.lock().map_err(poisoned)?;
        guard.insert(kid.id().clone(), kid.clone());
        Ok(())
    }

    async fn get_kid(&self, id: &KidId) -> Result<Option<Kid>, StorageError> {
        let guard = self.kids.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_kids_for_tutor(&self, tutor_id: &TutorId) -> Result<Vec<Kid>, StorageError> {
        let guard = self.kids.lock().map_err(poisoned)?;
        let mut kids: Vec<Kid> = guard
            .values()
            .filter(|kid| kid.tutor_id() == tutor_id)
            .cloned()
            .collect();
        kids.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(kids)
    }
}

#[async_trait]
impl RoutineRepository for InMemoryRepository {
    async fn upsert_routine(&self, routine: &Routine) -> Result<(), StorageError> {
        let mut guard = self.routines.lock().map_err(poisoned)?;
        guard.insert(routine.id().clone(), routine.clone());
        Ok(())
    }

    async fn get_routine(&self, id: &RoutineId) -> Result<Option<Routine>, StorageError> {
        let guard = self.routines.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_routines(&self) -> Result<Vec<Routine>, StorageError> {
        let guard = self.routines.lock().map_err(poisoned)?;
        let mut routines: Vec<Routine> = guard.values().cloned().collect();
        routines.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(routines)
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryRepository {
    async fn get_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, StorageError> {
        let guard = self.assignments.lock().map_err(poisoned)?;
        Ok(guard.by_id.get(id).cloned())
    }

    async fn active_for_day(
        &self,
        kid_id: &KidId,
        day: NaiveDate,
    ) -> Result<Option<Assignment>, StorageError> {
        let guard = self.assignments.lock().map_err(poisoned)?;
        Ok(guard
            .by_day
            .get(&(kid_id.clone(), day))
            .and_then(|id| guard.by_id.get(id))
            .cloned())
    }

    async fn list_for_kid(
        &self,
        kid_id: &KidId,
        range: DateRange,
    ) -> Result<Vec<Assignment>, StorageError> {
        let guard = self.assignments.lock().map_err(poisoned)?;
        let mut found: Vec<Assignment> = guard
            .insertion
            .iter()
            .filter_map(|id| guard.by_id.get(id))
            .filter(|a| a.kid_id() == kid_id && range.contains(a.assigned_date()))
            .cloned()
            .collect();
        // stable sort keeps insertion order within a day
        found.sort_by_key(Assignment::assigned_date);
        Ok(found)
    }

    async fn routine_referenced(&self, routine_id: &RoutineId) -> Result<bool, StorageError> {
        let guard = self.assignments.lock().map_err(poisoned)?;
        Ok(guard.by_id.values().any(|a| a.routine_id() == routine_id))
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StorageError> {
        let mut guard = self.assignments.lock().map_err(poisoned)?;
        if guard.by_id.contains_key(assignment.id()) {
            return Err(StorageError::Conflict);
        }
        let day_key = (assignment.kid_id().clone(), assignment.assigned_date());
        if assignment.occupies_day() {
            if guard.by_day.contains_key(&day_key) {
                return Err(StorageError::Conflict);
            }
            guard.by_day.insert(day_key, assignment.id().clone());
        }
        guard.insertion.push(assignment.id().clone());
        guard
            .by_id
            .insert(assignment.id().clone(), assignment.clone());
        Ok(())
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), StorageError> {
        let mut guard = self.assignments.lock().map_err(poisoned)?;
        if !guard.by_id.contains_key(assignment.id()) {
            return Err(StorageError::NotFound);
        }
        let day_key = (assignment.kid_id().clone(), assignment.assigned_date());
        let holder = guard.by_day.get(&day_key).cloned();
        match (assignment.occupies_day(), holder) {
            (true, Some(holder)) if &holder != assignment.id() => {
                return Err(StorageError::Conflict);
            }
            (true, _) => {
                guard.by_day.insert(day_key, assignment.id().clone());
            }
            (false, Some(holder)) if &holder == assignment.id() => {
                guard.by_day.remove(&day_key);
            }
            (false, _) => {}
        }
        guard
            .by_id
            .insert(assignment.id().clone(), assignment.clone());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.kv.lock().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.kv.lock().map_err(poisoned)?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.kv.lock().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kids: Arc<dyn KidRepository>,
    pub routines: Arc<dyn RoutineRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            kids: Arc::new(repo.clone()),
            routines: Arc::new(repo.clone()),
            assignments: Arc::new(repo.clone()),
            sessions: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routine_core::model::AssignmentStatus;
    use routine_core::time::fixed_now;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn assignment(id: &str, kid: &str, d: u32) -> Assignment {
        Assignment::new(
            AssignmentId::new(id),
            RoutineId::new("routine-001"),
            KidId::new(kid),
            day(d),
            TutorId::new("tutor-1"),
        )
    }

    #[tokio::test]
    async fn day_index_rejects_second_active_assignment() {
        let repo = InMemoryRepository::new();
        repo.insert_assignment(&assignment("a1", "kid-1", 5))
            .await
            .unwrap();

        let err = repo
            .insert_assignment(&assignment("a2", "kid-1", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        // another kid on the same day is fine
        repo.insert_assignment(&assignment("a3", "kid-2", 5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn skipping_frees_the_day() {
        let repo = InMemoryRepository::new();
        let mut first = assignment("a1", "kid-1", 5);
        repo.insert_assignment(&first).await.unwrap();

        first.skip().unwrap();
        repo.update_assignment(&first).await.unwrap();
        assert!(
            repo.active_for_day(&KidId::new("kid-1"), day(5))
                .await
                .unwrap()
                .is_none()
        );

        repo.insert_assignment(&assignment("a2", "kid-1", 5))
            .await
            .unwrap();
        let active = repo
            .active_for_day(&KidId::new("kid-1"), day(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id(), &AssignmentId::new("a2"));
    }

    #[tokio::test]
    async fn list_for_kid_is_ascending_and_bounded() {
        let repo = InMemoryRepository::new();
        for (id, d) in [("a7", 7), ("a3", 3), ("a5", 5), ("a9", 9)] {
            repo.insert_assignment(&assignment(id, "kid-1", d))
                .await
                .unwrap();
        }
        let range = DateRange::new(day(3), day(7)).unwrap();
        let listed = repo
            .list_for_kid(&KidId::new("kid-1"), range)
            .await
            .unwrap();
        let dates: Vec<_> = listed.iter().map(Assignment::assigned_date).collect();
        assert_eq!(dates, vec![day(3), day(5), day(7)]);
    }

    #[tokio::test]
    async fn update_of_unknown_assignment_is_not_found() {
        let repo = InMemoryRepository::new();
        let mut a = assignment("a1", "kid-1", 5);
        a.complete(fixed_now(), 10).unwrap();
        assert_eq!(a.status(), AssignmentStatus::Completed);
        let err = repo.update_assignment(&a).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn skipped_assignments_still_reference_their_routine() {
        let repo = InMemoryRepository::new();
        let routine = RoutineId::new("routine-001");
        assert!(!repo.routine_referenced(&routine).await.unwrap());

        let mut a = assignment("a1", "kid-1", 5);
        repo.insert_assignment(&a).await.unwrap();
        a.skip().unwrap();
        repo.update_assignment(&a).await.unwrap();

        assert!(repo.routine_referenced(&routine).await.unwrap());
        assert!(
            !repo
                .routine_referenced(&RoutineId::new("routine-002"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn session_slot_set_get_delete() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get("slot").await.unwrap(), None);
        repo.set("slot", "{}").await.unwrap();
        assert_eq!(repo.get("slot").await.unwrap().as_deref(), Some("{}"));
        repo.delete("slot").await.unwrap();
        repo.delete("slot").await.unwrap();
        assert_eq!(repo.get("slot").await.unwrap(), None);
    }
}
