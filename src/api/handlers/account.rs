use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::ChangeRoleRequest;
use crate::api::extractors::auth::{AdminUser, AuthUser};
use crate::api::handlers::auth::set_cookies;
use crate::domain::models::auth::AuthResponse;
use crate::domain::models::user::UserProfile;
use crate::domain::services::plans::{plan_catalog, quota_for_role};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::info;

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&session.id).await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user.profile()))
}

pub async fn list_plans() -> impl IntoResponse {
    Json(plan_catalog())
}

/// Self-service plan change. Payment is simulated; the new quota replaces the old one.
pub async fn change_plan(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    AuthUser(session): AuthUser,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !payload.role.is_self_service() {
        return Err(AppError::Forbidden("Ese plan no está disponible.".into()));
    }

    let mut user = state.user_repo.find_by_id(&session.id).await?
        .ok_or(AppError::Unauthorized)?;

    if user.role != payload.role {
        user = state.user_repo
            .update_plan(&user.id, payload.role, quota_for_role(payload.role))
            .await?;
        info!("User {} switched to plan {}", user.id, user.role.as_str());
    }

    // Re-issue the session so the role claim matches the stored plan.
    let (access_jwt, refresh_token, csrf_token) = state.auth_service.login(&user).await?;
    set_cookies(&cookies, &access_jwt, &refresh_token);

    Ok(Json(AuthResponse { csrf_token, user: user.profile() }))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<UserProfile> = state.user_repo.list().await?
        .iter()
        .map(|u| u.profile())
        .collect();
    Ok(Json(users))
}

pub async fn set_user_role(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo
        .update_plan(&user_id, payload.role, quota_for_role(payload.role))
        .await?;

    info!("Admin {} set role {} on user {}", admin.id, user.role.as_str(), user.id);
    Ok(Json(user.profile()))
}
