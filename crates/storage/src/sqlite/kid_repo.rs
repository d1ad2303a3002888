use routine_core::model::{Kid, KidId, TutorId};

use super::SqliteRepository;
use super::mapping::{conn, map_kid_row};
use crate::repository::{KidRepository, StorageError};

#[async_trait::async_trait]
impl KidRepository for SqliteRepository {
    async fn upsert_kid(&self, kid: &Kid) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO kids (id, name, tutor_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                tutor_id = excluded.tutor_id
            ",
        )
        .bind(kid.id().as_str())
        .bind(kid.name())
        .bind(kid.tutor_id().as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_kid(&self, id: &KidId) -> Result<Option<Kid>, StorageError> {
        let row = sqlx::query("SELECT id, name, tutor_id FROM kids WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_kid_row).transpose()
    }

    async fn list_kids_for_tutor(&self, tutor_id: &TutorId) -> Result<Vec<Kid>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, tutor_id FROM kids WHERE tutor_id = ?1 ORDER BY id ASC",
        )
        .bind(tutor_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_kid_row).collect()
    }
}
