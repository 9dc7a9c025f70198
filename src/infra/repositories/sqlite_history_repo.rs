use crate::domain::{models::{guide::Guide, history::HistoryEntry}, ports::HistoryRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{types::Json, SqlitePool};

pub struct SqliteHistoryRepo {
    pool: SqlitePool,
}

impl SqliteHistoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepo {
    async fn add(&self, entry: &HistoryEntry) -> Result<HistoryEntry, AppError> {
        sqlx::query_as::<_, HistoryEntry>(
            "INSERT INTO history_entries (id, user_id, guide_id, snapshot, created_at) VALUES (?, ?, ?, ?, ?)
             RETURNING id, user_id, guide_id, snapshot, created_at"
        )
            .bind(&entry.id)
            .bind(&entry.user_id)
            .bind(&entry.guide_id)
            .bind(&entry.snapshot)
            .bind(entry.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        sqlx::query_as::<_, HistoryEntry>(
            "SELECT id, user_id, guide_id, snapshot, created_at FROM history_entries WHERE user_id = ? ORDER BY created_at DESC"
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn contains_guide(&self, user_id: &str, guide_id: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM history_entries WHERE user_id = ? AND guide_id = ?"
        )
            .bind(user_id)
            .bind(guide_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(count > 0)
    }

    async fn find_snapshot(&self, user_id: &str, guide_id: &str) -> Result<Option<Guide>, AppError> {
        let snapshot = sqlx::query_scalar::<_, Json<Guide>>(
            "SELECT snapshot FROM history_entries WHERE user_id = ? AND guide_id = ? ORDER BY created_at DESC LIMIT 1"
        )
            .bind(user_id)
            .bind(guide_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(snapshot.map(|Json(guide)| guide))
    }

    async fn clear(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM history_entries WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn sync_snapshot(&self, guide: &Guide) -> Result<(), AppError> {
        sqlx::query("UPDATE history_entries SET snapshot = ? WHERE guide_id = ?")
            .bind(Json(guide))
            .bind(&guide.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn delete_by_guide(&self, guide_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM history_entries WHERE guide_id = ?")
            .bind(guide_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
