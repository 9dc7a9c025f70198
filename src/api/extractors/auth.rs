use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::domain::models::auth::{Claims, SessionUser};
use crate::domain::services::auth_service::TOKEN_AUDIENCE;
use crate::config::Config;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{debug, error, Span};

pub struct AuthUser(pub SessionUser);

/// Authenticated user whose role is read from the store instead of the token claim,
/// so a role change applies to the very next request.
pub struct CurrentUser(pub SessionUser);

/// Authenticated user currently holding the ADMINISTRATOR role.
pub struct AdminUser(pub SessionUser);

pub(crate) fn decode_access_token(config: &Config, token: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())
        .map_err(|e| {
            error!("Invalid JWT public key: {}", e);
            AppError::Internal
        })?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[TOKEN_AUDIENCE]);
    validation.set_issuer(&[config.auth_issuer.as_str()]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(AppError::Internal)?;

        let access_token = cookies.get("access_token")
            .ok_or(AppError::Unauthorized)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = decode_access_token(&app_state.config, &access_token)?;

        let method = &parts.method;
        if method != "GET" && method != "HEAD" && method != "OPTIONS" {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .and_then(|v| v.to_str().ok())
                .ok_or(AppError::Forbidden("Falta el token CSRF.".into()))?;

            if csrf_header_val != claims.csrf_token {
                return Err(AppError::Forbidden("Token CSRF inválido.".into()));
            }
        }

        let user = SessionUser::from(claims);

        Span::current().record("user_id", &user.id);

        Ok(AuthUser(user))
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(session) = AuthUser::from_request_parts(parts, state).await?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let stored = app_state.user_repo.find_by_id(&session.id).await?
            .ok_or(AppError::Unauthorized)?;

        if stored.role != session.role {
            debug!("Role of user {} changed from {} to {} since token issue", stored.id, session.role.as_str(), stored.role.as_str());
        }

        Ok(CurrentUser(SessionUser { id: stored.id, email: stored.email, role: stored.role }))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden("Se requieren permisos de administrador.".into()));
        }
        Ok(AdminUser(user))
    }
}
