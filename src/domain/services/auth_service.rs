use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RefreshTokenRecord, AccountTokenRecord, TokenPurpose, TokenPair}, user::User},
    ports::AuthRepository
};
use crate::error::AppError;
use crate::config::Config;
use argon2::{password_hash::{SaltString, PasswordHasher, PasswordHash, PasswordVerifier}, Argon2};
use jsonwebtoken::{encode, EncodingKey, Header, Algorithm};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Sha256, Digest};
use tracing::warn;

pub const TOKEN_AUDIENCE: &str = "tutorial-frontend";

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    config: Config,
    encoding_key: EncodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, config: Config) -> Self {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .expect("Invalid JWT Private Key PEM");

        Self { repo, config, encoding_key }
    }

    pub async fn login(&self, user: &User) -> Result<TokenPair, AppError> {
        let family_id = Uuid::new_v4();
        self.issue_token_pair(user, family_id, 1).await
    }

    /// Rotates a refresh token. Rotated-out tokens stay on record so that presenting one
    /// again is recognised as reuse, which revokes the whole family.
    pub async fn refresh(&self, raw_refresh_token: &str, user: &User) -> Result<TokenPair, AppError> {
        let token_hash = self.hash_token(raw_refresh_token);

        let record = self.repo.find_refresh_token(&token_hash).await?
            .ok_or(AppError::Unauthorized)?;

        let latest = self.repo.latest_refresh_generation(record.family_id).await?
            .unwrap_or(record.generation_id);
        if latest > record.generation_id {
            warn!(
                "Refresh token reuse for user {} (family {}, generation {} of {}); revoking family",
                record.user_id, record.family_id, record.generation_id, latest
            );
            self.repo.delete_refresh_family(record.family_id).await?;
            return Err(AppError::Unauthorized);
        }

        if record.expires_at < Utc::now() {
            self.repo.delete_refresh_family(record.family_id).await?;
            return Err(AppError::Unauthorized);
        }

        self.issue_token_pair(user, record.family_id, record.generation_id + 1).await
    }

    /// Ends the session the refresh token belongs to.
    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        match self.repo.find_refresh_token(&token_hash).await? {
            Some(record) => self.repo.delete_refresh_family(record.family_id).await,
            None => Ok(()),
        }
    }

    /// Drops every session of the user, e.g. after a password reset.
    pub async fn revoke_all(&self, user_id: &str) -> Result<(), AppError> {
        self.repo.delete_refresh_tokens_for_user(user_id).await
    }

    async fn issue_token_pair(&self, user: &User, family_id: Uuid, generation_id: i32) -> Result<TokenPair, AppError> {
        let csrf_token = random_token(32);
        let now = Utc::now();
        let exp = (now + Duration::minutes(15)).timestamp() as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: user.id.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            role: user.role,
            csrf_token: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token = random_token(64);
        let refresh_token_hash = self.hash_token(&refresh_token);

        let refresh_record = RefreshTokenRecord {
            token_hash: refresh_token_hash,
            user_id: user.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(7),
            created_at: now,
        };

        self.repo.create_refresh_token(&refresh_record).await?;
        Ok((access_token, refresh_token, csrf_token))
    }

    /// Issues a mailed single-use token, replacing any earlier one for the same purpose.
    pub async fn issue_account_token(&self, user_id: &str, purpose: TokenPurpose) -> Result<String, AppError> {
        self.repo.delete_account_tokens(user_id, purpose).await?;

        let raw = random_token(48);
        let now = Utc::now();
        let record = AccountTokenRecord {
            token_hash: self.hash_token(&raw),
            user_id: user_id.to_string(),
            purpose,
            expires_at: now + purpose.ttl(),
            created_at: now,
        };
        self.repo.create_account_token(&record).await?;
        Ok(raw)
    }

    /// Redeems a mailed token and returns the owning user id.
    pub async fn consume_account_token(&self, raw: &str, purpose: TokenPurpose) -> Result<String, AppError> {
        let invalid = || AppError::Validation("El enlace no es válido o ha caducado.".into());
        let token_hash = self.hash_token(raw.trim());

        let record = self.repo.find_account_token(&token_hash).await?
            .ok_or_else(invalid)?;

        if record.purpose != purpose {
            return Err(invalid());
        }

        self.repo.delete_account_token(&token_hash).await?;

        if record.expires_at < Utc::now() {
            return Err(invalid());
        }
        Ok(record.user_id)
    }

    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

pub fn hash_password(raw: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal)
}

pub fn verify_password(raw: &str, stored_hash: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal)?;

    Argon2::default().verify_password(raw.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

fn random_token(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}
