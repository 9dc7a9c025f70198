use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::domain::models::user::{Role, UnknownVariant, UserProfile};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://tutorial.app/claims/email")]
    pub email: String,

    #[serde(rename = "https://tutorial.app/claims/role")]
    pub role: Role,

    #[serde(rename = "https://tutorial.app/claims/csrf")]
    pub csrf_token: String,
}

/// Identity carried by a valid access token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self { id: claims.sub, email: claims.email, role: claims.role }
    }
}

#[derive(Debug, FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: String,
    pub family_id: Uuid,
    pub generation_id: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "EMAIL_VERIFICATION",
            TokenPurpose::PasswordReset => "PASSWORD_RESET",
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        match self {
            TokenPurpose::EmailVerification => chrono::Duration::hours(24),
            TokenPurpose::PasswordReset => chrono::Duration::hours(1),
        }
    }
}

impl TryFrom<String> for TokenPurpose {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "EMAIL_VERIFICATION" => Ok(TokenPurpose::EmailVerification),
            "PASSWORD_RESET" => Ok(TokenPurpose::PasswordReset),
            _ => Err(UnknownVariant { kind: "token purpose", value }),
        }
    }
}

/// Single-use token mailed to the account owner (verification, password reset).
#[derive(Debug, FromRow)]
pub struct AccountTokenRecord {
    pub token_hash: String,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub csrf_token: String,
    pub user: UserProfile,
}

/// Issued session material: (access JWT, raw refresh token, csrf token).
pub type TokenPair = (String, String, String);
