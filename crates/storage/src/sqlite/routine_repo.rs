use routine_core::model::{Routine, RoutineId};

use super::SqliteRepository;
use super::mapping::{conn, map_routine_row, ser};
use crate::repository::{RoutineRepository, StorageError};

const ROUTINE_COLUMNS: &str = "id, title, exercises, difficulty, categories, created_by, is_public";

#[async_trait::async_trait]
impl RoutineRepository for SqliteRepository {
    async fn upsert_routine(&self, routine: &Routine) -> Result<(), StorageError> {
        let exercises = serde_json::to_string(routine.exercises()).map_err(ser)?;
        let categories = serde_json::to_string(routine.categories()).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO routines (id, title, exercises, difficulty, categories, created_by, is_public)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                exercises = excluded.exercises,
                difficulty = excluded.difficulty,
                categories = excluded.categories,
                created_by = excluded.created_by,
                is_public = excluded.is_public
            ",
        )
        .bind(routine.id().as_str())
        .bind(routine.title())
        .bind(exercises)
        .bind(routine.difficulty().as_str())
        .bind(categories)
        .bind(routine.created_by().as_str())
        .bind(i64::from(routine.is_public()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_routine(&self, id: &RoutineId) -> Result<Option<Routine>, StorageError> {
        let row = sqlx::query(&format!("SELECT {ROUTINE_COLUMNS} FROM routines WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_routine_row).transpose()
    }

    async fn list_routines(&self) -> Result<Vec<Routine>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM routines ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_routine_row).collect()
    }
}
