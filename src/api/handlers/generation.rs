use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::CreateGenerationRequest;
use crate::api::dtos::responses::GenerationResponse;
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::generation::GenerationRequest;
use std::sync::Arc;

pub async fn create_generation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateGenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = GenerationRequest {
        description: payload.description,
        complexity: payload.complexity,
        priority: payload.priority,
        image: payload.image,
        publish: payload.publish.unwrap_or(true),
    };

    let outcome = state.generation_service.generate(&user.id, request).await?;

    Ok((StatusCode::CREATED, Json(GenerationResponse {
        guide: outcome.guide,
        remaining_generations: outcome.remaining_generations,
    })))
}
