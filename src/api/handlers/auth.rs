use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{
    LoginRequest, PasswordResetConfirmRequest, PasswordResetRequest, RegisterRequest, TokenRequest,
};
use crate::api::dtos::responses::{MessageResponse, SessionResponse};
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::domain::models::auth::{AuthResponse, TokenPurpose};
use crate::domain::models::user::{Role, User};
use crate::domain::services::auth_service::{hash_password, verify_password};
use crate::domain::services::plans::quota_for_role;
use crate::domain::services::validation::{normalize_email, validate_new_password};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::{info, warn};

pub async fn register(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email)?;
    validate_new_password(&payload.password, &payload.password_confirmation)?;

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Ya existe una cuenta con ese correo.".into()));
    }

    let role = if state.config.is_bootstrap_admin(&email) { Role::Administrator } else { Role::Basic };
    let password_hash = hash_password(&payload.password)?;
    let user = state.user_repo.create(&User::new(email, password_hash, role, quota_for_role(role))).await?;

    send_verification(&state, &user).await;

    let (access_jwt, refresh_token, csrf_token) = state.auth_service.login(&user).await?;
    set_cookies(&cookies, &access_jwt, &refresh_token);

    info!("User registered: {} ({})", user.id, user.role.as_str());

    Ok((StatusCode::CREATED, Json(AuthResponse { csrf_token, user: user.profile() })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email).map_err(|_| AppError::InvalidCredentials)?;
    let user = state.user_repo.find_by_email(&email).await?
        .ok_or(AppError::InvalidCredentials)?;

    verify_password(&payload.password, &user.password_hash)?;

    let (access_jwt, refresh_token, csrf_token) = state.auth_service.login(&user).await?;

    set_cookies(&cookies, &access_jwt, &refresh_token);

    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse { csrf_token, user: user.profile() }))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let refresh_cookie = cookies.get("refresh_token").ok_or(AppError::Unauthorized)?;
    let raw_token = refresh_cookie.value();

    let token_hash = state.auth_service.hash_token(raw_token);
    let record = state.auth_repo.find_refresh_token(&token_hash).await?
        .ok_or(AppError::Unauthorized)?;

    let user = state.user_repo.find_by_id(&record.user_id).await?
        .ok_or(AppError::Unauthorized)?;

    let (new_access, new_refresh, new_csrf) = state.auth_service.refresh(raw_token, &user).await?;

    set_cookies(&cookies, &new_access, &new_refresh);

    info!("Token refreshed for user: {}", user.id);

    Ok(Json(AuthResponse { csrf_token: new_csrf, user: user.profile() }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = cookies.get("refresh_token") {
        let _ = state.auth_service.logout(cookie.value()).await;
    }

    clear_cookies(&cookies);

    info!("User logged out");

    Ok(StatusCode::OK)
}

pub async fn session(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(session): MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = match session {
        Some(s) => state.user_repo.find_by_id(&s.id).await?.map(|u| u.profile()),
        None => None,
    };
    Ok(Json(SessionResponse { user }))
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = state.auth_service
        .consume_account_token(&payload.token, TokenPurpose::EmailVerification)
        .await?;

    state.user_repo.set_verified(&user_id).await?;
    info!("Email verified for user: {}", user_id);

    Ok(Json(MessageResponse { message: "Correo verificado correctamente." }))
}

pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&session.id).await?
        .ok_or(AppError::Unauthorized)?;

    if user.is_verified {
        return Ok(Json(MessageResponse { message: "Tu correo ya está verificado." }));
    }

    let token = state.auth_service.issue_account_token(&user.id, TokenPurpose::EmailVerification).await?;
    state.notification_service.send_verification(&user.email, &token).await?;

    Ok(Json(MessageResponse { message: "Te hemos enviado un nuevo enlace de verificación." }))
}

/// Always answers the same way so the endpoint cannot reveal which accounts exist.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reply = Json(MessageResponse {
        message: "Si existe una cuenta con ese correo, recibirás un enlace para restablecer la contraseña.",
    });

    let Ok(email) = normalize_email(&payload.email) else {
        return Ok(reply);
    };

    if let Some(user) = state.user_repo.find_by_email(&email).await? {
        let token = state.auth_service.issue_account_token(&user.id, TokenPurpose::PasswordReset).await?;
        if let Err(e) = state.notification_service.send_password_reset(&user.email, &token).await {
            warn!("Password reset email for {} failed: {}", user.id, e);
        }
    }

    Ok(reply)
}

pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_new_password(&payload.password, &payload.password_confirmation)?;

    let user_id = state.auth_service
        .consume_account_token(&payload.token, TokenPurpose::PasswordReset)
        .await?;

    let password_hash = hash_password(&payload.password)?;
    state.user_repo.update_password(&user_id, &password_hash).await?;
    state.auth_service.revoke_all(&user_id).await?;

    info!("Password reset completed for user: {}", user_id);

    Ok(Json(MessageResponse { message: "Contraseña actualizada. Ya puedes iniciar sesión." }))
}

async fn send_verification(state: &AppState, user: &User) {
    let result = match state.auth_service.issue_account_token(&user.id, TokenPurpose::EmailVerification).await {
        Ok(token) => state.notification_service.send_verification(&user.email, &token).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("Verification email for {} failed: {}", user.id, e);
    }
}

pub(crate) fn set_cookies(cookies: &Cookies, access: &str, refresh: &str) {
    let mut access_c = Cookie::new("access_token", access.to_string());
    access_c.set_http_only(true);
    access_c.set_secure(true);
    access_c.set_same_site(SameSite::Strict);
    access_c.set_path("/");
    access_c.set_max_age(Duration::minutes(15));
    cookies.add(access_c);

    let mut refresh_c = Cookie::new("refresh_token", refresh.to_string());
    refresh_c.set_http_only(true);
    refresh_c.set_secure(true);
    refresh_c.set_same_site(SameSite::Strict);
    refresh_c.set_path("/");
    refresh_c.set_max_age(Duration::days(7));
    cookies.add(refresh_c);
}

fn clear_cookies(cookies: &Cookies) {
    cookies.remove(Cookie::build(("access_token", "")).path("/").into());
    cookies.remove(Cookie::build(("refresh_token", "")).path("/").into());
}
