use crate::domain::models::ai::{ChatTurn, ImageFile};
use crate::domain::models::guide::{GuideStatus, TaskCategory, TaskComplexity, TaskPriority};
use crate::domain::models::user::Role;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Deserialize, Default)]
pub struct GuideListQuery {
    pub category: Option<TaskCategory>,
    pub q: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ModerationQueueQuery {
    pub status: Option<GuideStatus>,
}

#[derive(Deserialize)]
pub struct RejectGuideRequest {
    #[serde(default)]
    pub feedback: String,
}

#[derive(Deserialize)]
pub struct CreateGenerationRequest {
    pub description: String,
    #[serde(default = "default_complexity")]
    pub complexity: TaskComplexity,
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,
    pub image: Option<ImageFile>,
    pub publish: Option<bool>,
}

fn default_complexity() -> TaskComplexity {
    TaskComplexity::Medium
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

#[derive(Deserialize)]
pub struct DescribeMediaRequest {
    pub image: ImageFile,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub from_email: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}
