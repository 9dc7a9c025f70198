use crate::domain::{models::guide::{Guide, GuideStatus}, ports::GuideRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

const GUIDE_COLUMNS: &str = "id, title, category, priority, safety_warnings, tools, steps, resources, grounding_sources, \
    author, author_email, status, moderator_feedback, created_at, updated_at";

pub struct SqliteGuideRepo {
    pool: SqlitePool,
}

impl SqliteGuideRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuideRepository for SqliteGuideRepo {
    async fn create(&self, guide: &Guide) -> Result<Guide, AppError> {
        sqlx::query_as::<_, Guide>(&format!(
            "INSERT INTO guides ({GUIDE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {GUIDE_COLUMNS}"
        ))
            .bind(&guide.id)
            .bind(&guide.title)
            .bind(guide.category.as_str())
            .bind(guide.priority.as_str())
            .bind(&guide.safety_warnings)
            .bind(&guide.tools)
            .bind(&guide.steps)
            .bind(&guide.resources)
            .bind(&guide.grounding_sources)
            .bind(guide.author.as_str())
            .bind(&guide.author_email)
            .bind(guide.status.as_str())
            .bind(&guide.moderator_feedback)
            .bind(guide.created_at)
            .bind(guide.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Guide>, AppError> {
        sqlx::query_as::<_, Guide>(&format!("SELECT {GUIDE_COLUMNS} FROM guides WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_status(&self, status: GuideStatus) -> Result<Vec<Guide>, AppError> {
        sqlx::query_as::<_, Guide>(&format!(
            "SELECT {GUIDE_COLUMNS} FROM guides WHERE status = ? ORDER BY created_at DESC"
        ))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_author(&self, author_email: &str) -> Result<Vec<Guide>, AppError> {
        sqlx::query_as::<_, Guide>(&format!(
            "SELECT {GUIDE_COLUMNS} FROM guides WHERE LOWER(author_email) = LOWER(?) ORDER BY created_at DESC"
        ))
            .bind(author_email)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_status(&self, status: GuideStatus) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM guides WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_steps(&self, guide: &Guide) -> Result<Guide, AppError> {
        sqlx::query_as::<_, Guide>(&format!(
            "UPDATE guides SET steps = ?, updated_at = ? WHERE id = ? RETURNING {GUIDE_COLUMNS}"
        ))
            .bind(&guide.steps)
            .bind(guide.updated_at)
            .bind(&guide.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Guía no encontrada".into()))
    }

    async fn update_moderation(&self, guide: &Guide) -> Result<Guide, AppError> {
        sqlx::query_as::<_, Guide>(&format!(
            "UPDATE guides SET status = ?, moderator_feedback = ?, updated_at = ? WHERE id = ? RETURNING {GUIDE_COLUMNS}"
        ))
            .bind(guide.status.as_str())
            .bind(&guide.moderator_feedback)
            .bind(guide.updated_at)
            .bind(&guide.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Guía no encontrada".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM guides WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
