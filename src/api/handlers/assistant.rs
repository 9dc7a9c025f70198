use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{ChatRequest, DescribeMediaRequest};
use crate::api::dtos::responses::{ChatResponse, MediaDescriptionResponse};
use crate::api::extractors::auth::CurrentUser;
use std::sync::Arc;

pub async fn describe_media(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<DescribeMediaRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !user.role.can_attach_media() {
        return Err(AppError::Forbidden("Actualiza a Pro para subir imágenes.".into()));
    }
    let description = state.assistant_service.describe_media(payload.image).await?;
    Ok(Json(MediaDescriptionResponse { description }))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reply = state.assistant_service.chat(&payload.message, payload.history).await?;
    Ok(Json(ChatResponse { reply }))
}
