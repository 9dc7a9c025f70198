use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_max_retries: u32,
    pub public_base_url: String,
    pub feedback_recipient: String,
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.tutorial.local".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").or_else(|_| env::var("API_KEY")).ok().filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_max_retries: env::var("GEMINI_MAX_RETRIES").unwrap_or_else(|_| "0".to_string()).parse().expect("GEMINI_MAX_RETRIES must be a number"),
            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            feedback_recipient: env::var("FEEDBACK_RECIPIENT").unwrap_or_else(|_| "tecnicfitia@tecnicalfitnesartificialintelligence.app".to_string()),
            admin_emails: parse_email_list(&env::var("BOOTSTRAP_ADMIN_EMAILS").unwrap_or_default()),
        }
    }

    pub fn is_bootstrap_admin(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(email))
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
