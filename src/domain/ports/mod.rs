use crate::domain::models::{
    user::{User, Role, Quota}, guide::{Guide, GuideStatus}, history::HistoryEntry,
    auth::{RefreshTokenRecord, AccountTokenRecord, TokenPurpose},
    ai::{LlmRequest, LlmResponse},
};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn update_plan(&self, id: &str, role: Role, quota: Quota) -> Result<User, AppError>;
    async fn set_verified(&self, id: &str) -> Result<(), AppError>;
    async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), AppError>;
    /// Takes one generation from a limited quota. Never drops below zero;
    /// returns false when nothing was left to take.
    async fn consume_generation(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait GuideRepository: Send + Sync {
    async fn create(&self, guide: &Guide) -> Result<Guide, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Guide>, AppError>;
    async fn list_by_status(&self, status: GuideStatus) -> Result<Vec<Guide>, AppError>;
    async fn list_by_author(&self, author_email: &str) -> Result<Vec<Guide>, AppError>;
    async fn count_by_status(&self, status: GuideStatus) -> Result<i64, AppError>;
    async fn update_steps(&self, guide: &Guide) -> Result<Guide, AppError>;
    async fn update_moderation(&self, guide: &Guide) -> Result<Guide, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn add(&self, entry: &HistoryEntry) -> Result<HistoryEntry, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<HistoryEntry>, AppError>;
    async fn contains_guide(&self, user_id: &str, guide_id: &str) -> Result<bool, AppError>;
    /// The user's latest copy of a guide, also for guides never published.
    async fn find_snapshot(&self, user_id: &str, guide_id: &str) -> Result<Option<Guide>, AppError>;
    async fn clear(&self, user_id: &str) -> Result<u64, AppError>;
    async fn sync_snapshot(&self, guide: &Guide) -> Result<(), AppError>;
    async fn delete_by_guide(&self, guide_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    /// Highest generation issued so far in a refresh family.
    async fn latest_refresh_generation(&self, family_id: Uuid) -> Result<Option<i32>, AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
    async fn delete_refresh_tokens_for_user(&self, user_id: &str) -> Result<(), AppError>;

    async fn create_account_token(&self, record: &AccountTokenRecord) -> Result<(), AppError>;
    async fn find_account_token(&self, token_hash: &str) -> Result<Option<AccountTokenRecord>, AppError>;
    async fn delete_account_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_account_tokens(&self, user_id: &str, purpose: TokenPurpose) -> Result<(), AppError>;
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
