use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::FeedbackRequest;
use crate::api::dtos::responses::MessageResponse;
use std::sync::Arc;

pub async fn send_feedback(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.notification_service
        .send_feedback(payload.from_email.as_deref(), payload.subject.as_deref(), &payload.message)
        .await?;
    Ok(Json(MessageResponse { message: "¡Gracias por tu comentario!" }))
}
