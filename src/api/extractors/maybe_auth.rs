use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::api::extractors::auth::decode_access_token;
use crate::domain::models::auth::SessionUser;
use std::convert::Infallible;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::debug;

/// Session if one is present and valid; guests are `None`.
pub struct MaybeAuthUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let Some(cookies) = parts.extensions.get::<Cookies>() else {
            return Ok(MaybeAuthUser(None));
        };

        let Some(access_token) = cookies.get("access_token").map(|c| c.value().to_string()) else {
            return Ok(MaybeAuthUser(None));
        };

        match decode_access_token(&app_state.config, &access_token) {
            Ok(claims) => Ok(MaybeAuthUser(Some(SessionUser::from(claims)))),
            Err(_) => {
                debug!("Ignoring invalid access token on optional-auth route");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
