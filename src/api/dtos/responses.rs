use crate::domain::models::guide::Guide;
use crate::domain::models::user::{Quota, UserProfile};
use serde::Serialize;

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: Option<UserProfile>,
}

#[derive(Serialize)]
pub struct GenerationResponse {
    pub guide: Guide,
    pub remaining_generations: Quota,
}

#[derive(Serialize)]
pub struct ModerationStatsResponse {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Serialize)]
pub struct MediaDescriptionResponse {
    pub description: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Serialize)]
pub struct ClearHistoryResponse {
    pub deleted: u64,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
