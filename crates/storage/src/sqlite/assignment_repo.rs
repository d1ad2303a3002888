use chrono::NaiveDate;
use routine_core::DateRange;
use routine_core::model::{Assignment, AssignmentId, KidId, RoutineId};

use super::SqliteRepository;
use super::mapping::{conn, map_assignment_row, u64_to_i64, write_err};
use crate::repository::{AssignmentRepository, StorageError};

const ASSIGNMENT_COLUMNS: &str = "id, routine_id, kid_id, assigned_date, status, assigned_by, \
                                  completed_at, total_time_spent_seconds";

#[async_trait::async_trait]
impl AssignmentRepository for SqliteRepository {
    async fn get_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_assignment_row).transpose()
    }

    async fn active_for_day(
        &self,
        kid_id: &KidId,
        day: NaiveDate,
    ) -> Result<Option<Assignment>, StorageError> {
        let row = sqlx::query(&format!(
            r"
            SELECT {ASSIGNMENT_COLUMNS} FROM assignments
            WHERE kid_id = ?1 AND assigned_date = ?2 AND status <> 'skipped'
            "
        ))
        .bind(kid_id.as_str())
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_assignment_row).transpose()
    }

    async fn list_for_kid(
        &self,
        kid_id: &KidId,
        range: DateRange,
    ) -> Result<Vec<Assignment>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ASSIGNMENT_COLUMNS} FROM assignments
            WHERE kid_id = ?1 AND assigned_date BETWEEN ?2 AND ?3
            ORDER BY assigned_date ASC, rowid ASC
            "
        ))
        .bind(kid_id.as_str())
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_assignment_row).collect()
    }

    async fn routine_referenced(&self, routine_id: &RoutineId) -> Result<bool, StorageError> {
        let referenced: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assignments WHERE routine_id = ?1)")
                .bind(routine_id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(conn)?;
        Ok(referenced != 0)
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StorageError> {
        let total = assignment
            .total_time_spent_seconds()
            .map(|v| u64_to_i64("total_time_spent_seconds", v))
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO assignments (id, routine_id, kid_id, assigned_date, status, assigned_by, completed_at, total_time_spent_seconds)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(assignment.id().as_str())
        .bind(assignment.routine_id().as_str())
        .bind(assignment.kid_id().as_str())
        .bind(assignment.assigned_date())
        .bind(assignment.status().as_str())
        .bind(assignment.assigned_by().as_str())
        .bind(assignment.completed_at())
        .bind(total)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), StorageError> {
        let total = assignment
            .total_time_spent_seconds()
            .map(|v| u64_to_i64("total_time_spent_seconds", v))
            .transpose()?;

        let res = sqlx::query(
            r"
            UPDATE assignments SET
                routine_id = ?2,
                kid_id = ?3,
                assigned_date = ?4,
                status = ?5,
                assigned_by = ?6,
                completed_at = ?7,
                total_time_spent_seconds = ?8
            WHERE id = ?1
            ",
        )
        .bind(assignment.id().as_str())
        .bind(assignment.routine_id().as_str())
        .bind(assignment.kid_id().as_str())
        .bind(assignment.assigned_date())
        .bind(assignment.status().as_str())
        .bind(assignment.assigned_by().as_str())
        .bind(assignment.completed_at())
        .bind(total)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
