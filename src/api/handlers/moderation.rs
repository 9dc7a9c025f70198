use axum::{extract::{Path, Query, State}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{ModerationQueueQuery, RejectGuideRequest};
use crate::api::dtos::responses::ModerationStatsResponse;
use crate::api::extractors::auth::AdminUser;
use crate::domain::models::guide::GuideStatus;
use crate::domain::services::moderation::ModerationAction;
use std::sync::Arc;
use tracing::info;

pub async fn list_queue(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<ModerationQueueQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = query.status.unwrap_or(GuideStatus::Pending);
    let guides = state.guide_repo.list_by_status(status).await?;
    Ok(Json(guides))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let (pending, approved, rejected) = state.guide_service.stats().await?;
    Ok(Json(ModerationStatsResponse { pending, approved, rejected }))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(guide_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let guide = state.guide_service.moderate(&guide_id, ModerationAction::Approve).await?;
    info!("Admin {} approved guide {}", admin.id, guide.id);
    Ok(Json(guide))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(guide_id): Path<String>,
    Json(payload): Json<RejectGuideRequest>,
) -> Result<impl IntoResponse, AppError> {
    let guide = state.guide_service
        .moderate(&guide_id, ModerationAction::Reject { feedback: payload.feedback })
        .await?;
    info!("Admin {} rejected guide {}", admin.id, guide.id);
    Ok(Json(guide))
}

pub async fn delete_guide(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(guide_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.guide_service.delete(&guide_id).await?;
    info!("Admin {} deleted guide {}", admin.id, guide_id);
    Ok(StatusCode::NO_CONTENT)
}
