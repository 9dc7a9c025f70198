use axum::{extract::{Path, Query, State}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::GuideListQuery;
use crate::api::extractors::{auth::{AuthUser, CurrentUser}, maybe_auth::MaybeAuthUser};
use crate::domain::services::guide_service::GuideDraft;
use std::sync::Arc;
use tracing::info;

pub async fn list_guides(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GuideListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let guides = state.guide_service.list_public(query.category, query.q.as_deref()).await?;
    Ok(Json(guides))
}

pub async fn get_guide(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(guide_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let guide = state.guide_service.find_visible(&guide_id, viewer.as_ref()).await?;
    Ok(Json(guide))
}

pub async fn create_guide(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<GuideDraft>,
) -> Result<impl IntoResponse, AppError> {
    let guide = state.guide_service.contribute(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(guide)))
}

pub async fn list_my_guides(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let guides = state.guide_repo.list_by_author(&user.email).await?;
    Ok(Json(guides))
}

pub async fn refine_step(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((guide_id, step_number)): Path<(String, u32)>,
) -> Result<impl IntoResponse, AppError> {
    let guide = state.guide_service
        .refine_step(state.llm_service.as_ref(), &user, &guide_id, step_number)
        .await?;

    info!("User {} refined step {} of guide {}", user.id, step_number, guide.id);
    Ok(Json(guide))
}

pub async fn top_contributors(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.guide_service.top_contributors().await?))
}
