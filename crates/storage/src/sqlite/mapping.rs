use routine_core::model::{
    Assignment, AssignmentId, AssignmentStatus, Difficulty, Exercise, Kid, KidId, Routine,
    RoutineAuthor, RoutineId, TutorId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Writes that trip a unique constraint surface as `Conflict`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
    }
    conn(e)
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn map_kid_row(row: &SqliteRow) -> Result<Kid, StorageError> {
    Kid::new(
        KidId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("name").map_err(ser)?,
        TutorId::new(row.try_get::<String, _>("tutor_id").map_err(ser)?),
    )
    .map_err(ser)
}

pub(crate) fn map_routine_row(row: &SqliteRow) -> Result<Routine, StorageError> {
    let exercises: Vec<Exercise> =
        serde_json::from_str(&row.try_get::<String, _>("exercises").map_err(ser)?).map_err(ser)?;
    let categories: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("categories").map_err(ser)?)
            .map_err(ser)?;
    let difficulty: Difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Routine::new(
        RoutineId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        exercises,
        difficulty,
        categories,
        RoutineAuthor::parse(&row.try_get::<String, _>("created_by").map_err(ser)?),
        row.try_get::<i64, _>("is_public").map_err(ser)? != 0,
    )
    .map_err(ser)
}

pub(crate) fn map_assignment_row(row: &SqliteRow) -> Result<Assignment, StorageError> {
    let status: AssignmentStatus = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let total = row
        .try_get::<Option<i64>, _>("total_time_spent_seconds")
        .map_err(ser)?
        .map(|v| i64_to_u64("total_time_spent_seconds", v))
        .transpose()?;

    Assignment::from_persisted(
        AssignmentId::new(row.try_get::<String, _>("id").map_err(ser)?),
        RoutineId::new(row.try_get::<String, _>("routine_id").map_err(ser)?),
        KidId::new(row.try_get::<String, _>("kid_id").map_err(ser)?),
        row.try_get("assigned_date").map_err(ser)?,
        status,
        TutorId::new(row.try_get::<String, _>("assigned_by").map_err(ser)?),
        row.try_get("completed_at").map_err(ser)?,
        total,
    )
    .map_err(ser)
}
