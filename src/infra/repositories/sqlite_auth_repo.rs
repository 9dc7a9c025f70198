use crate::domain::{models::auth::{AccountTokenRecord, RefreshTokenRecord, TokenPurpose}, ports::AuthRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct SqliteAuthRepo { pool: SqlitePool }
impl SqliteAuthRepo { pub fn new(pool: SqlitePool) -> Self { Self { pool } } }

#[async_trait]
impl AuthRepository for SqliteAuthRepo {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token_hash, user_id, family_id, generation_id, expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
            .bind(&record.token_hash)
            .bind(&record.user_id)
            .bind(record.family_id)
            .bind(record.generation_id)
            .bind(record.expires_at)
            .bind(record.created_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT token_hash, user_id, family_id, generation_id, expires_at, created_at
             FROM refresh_tokens WHERE token_hash = ?"
        )
            .bind(token_hash)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn latest_refresh_generation(&self, family_id: Uuid) -> Result<Option<i32>, AppError> {
        sqlx::query_scalar::<_, Option<i32>>("SELECT MAX(generation_id) FROM refresh_tokens WHERE family_id = ?")
            .bind(family_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE family_id = ?")
            .bind(family_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn delete_refresh_tokens_for_user(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn create_account_token(&self, record: &AccountTokenRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO account_tokens (token_hash, user_id, purpose, expires_at, created_at) VALUES (?, ?, ?, ?, ?)"
        )
            .bind(&record.token_hash)
            .bind(&record.user_id)
            .bind(record.purpose.as_str())
            .bind(record.expires_at)
            .bind(record.created_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_account_token(&self, token_hash: &str) -> Result<Option<AccountTokenRecord>, AppError> {
        sqlx::query_as::<_, AccountTokenRecord>(
            "SELECT token_hash, user_id, purpose, expires_at, created_at FROM account_tokens WHERE token_hash = ?"
        )
            .bind(token_hash)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_account_token(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM account_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn delete_account_tokens(&self, user_id: &str, purpose: TokenPurpose) -> Result<(), AppError> {
        sqlx::query("DELETE FROM account_tokens WHERE user_id = ? AND purpose = ?")
            .bind(user_id)
            .bind(purpose.as_str())
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
