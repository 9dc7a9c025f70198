use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::responses::ClearHistoryResponse;
use crate::api::extractors::auth::AuthUser;
use std::sync::Arc;
use tracing::info;

pub async fn list_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.history_repo.list_by_user(&user.id).await?;
    Ok(Json(entries))
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.history_repo.clear(&user.id).await?;
    info!("Cleared {} history entries for user {}", deleted, user.id);
    Ok(Json(ClearHistoryResponse { deleted }))
}
