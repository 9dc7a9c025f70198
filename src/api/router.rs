use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{account, assistant, auth, feedback, generation, guides, health, history, moderation};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

/// Fits a 4 MiB image after base64 encoding.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/session", get(auth::session))
        .route("/api/v1/auth/verify-email", post(auth::verify_email))
        .route("/api/v1/auth/verify-email/resend", post(auth::resend_verification))
        .route("/api/v1/auth/password-reset", post(auth::request_password_reset))
        .route("/api/v1/auth/password-reset/confirm", post(auth::confirm_password_reset))

        // Account & Plans
        .route("/api/v1/account", get(account::get_account))
        .route("/api/v1/account/plan", put(account::change_plan))
        .route("/api/v1/plans", get(account::list_plans))

        // Guides
        .route("/api/v1/guides", get(guides::list_guides).post(guides::create_guide))
        .route("/api/v1/guides/mine", get(guides::list_my_guides))
        .route("/api/v1/guides/{guide_id}", get(guides::get_guide))
        .route("/api/v1/guides/{guide_id}/steps/{step_number}/refine", post(guides::refine_step))
        .route("/api/v1/contributors/top", get(guides::top_contributors))

        // Generation & AI helpers
        .route("/api/v1/generations", post(generation::create_generation))
        .route("/api/v1/ai/describe-media", post(assistant::describe_media))
        .route("/api/v1/assistant/chat", post(assistant::chat))

        // History
        .route("/api/v1/history", get(history::list_history).delete(history::clear_history))

        // Feedback
        .route("/api/v1/feedback", post(feedback::send_feedback))

        // Admin
        .route("/api/v1/admin/users", get(account::list_users))
        .route("/api/v1/admin/users/{user_id}/role", put(account::set_user_role))
        .route("/api/v1/admin/guides", get(moderation::list_queue))
        .route("/api/v1/admin/guides/stats", get(moderation::stats))
        .route("/api/v1/admin/guides/{guide_id}", delete(moderation::delete_guide))
        .route("/api/v1/admin/guides/{guide_id}/approve", post(moderation::approve))
        .route("/api/v1/admin/guides/{guide_id}/reject", post(moderation::reject))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
