use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates kids, routines, assignments (with the one-active-per-day
/// index) and the key-value slot table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS kids (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    tutor_id TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS routines (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    exercises TEXT NOT NULL,
                    difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
                    categories TEXT NOT NULL,
                    created_by TEXT NOT NULL,
                    is_public INTEGER NOT NULL CHECK (is_public IN (0, 1))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS assignments (
                    id TEXT PRIMARY KEY,
                    routine_id TEXT NOT NULL,
                    kid_id TEXT NOT NULL,
                    assigned_date TEXT NOT NULL,
                    status TEXT NOT NULL
                        CHECK (status IN ('pending', 'in_progress', 'completed', 'skipped')),
                    assigned_by TEXT NOT NULL,
                    completed_at TEXT,
                    total_time_spent_seconds INTEGER CHECK (total_time_spent_seconds >= 0),
                    FOREIGN KEY (routine_id) REFERENCES routines(id),
                    FOREIGN KEY (kid_id) REFERENCES kids(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_kid_day_active
                ON assignments(kid_id, assigned_date)
                WHERE status <> 'skipped';
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_assignments_kid_date
                ON assignments(kid_id, assigned_date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
