#![allow(dead_code)]

use guide_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::load_templates,
    infra::repositories::{
        sqlite_auth_repo::SqliteAuthRepo,
        sqlite_guide_repo::SqliteGuideRepo,
        sqlite_history_repo::SqliteHistoryRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    domain::models::ai::{LlmRequest, LlmResponse},
    domain::models::guide::GroundingSource,
    domain::models::user::Role,
    domain::ports::{EmailService, LlmService},
    domain::services::plans::quota_for_role,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "secreto123";

pub const GUIDE_JSON: &str = r#"{
    "taskTitle": "Cambiar una bombilla",
    "category": "HOME",
    "safetyWarnings": ["Corta la corriente antes de empezar"],
    "requiredTools": ["Escalera", "Bombilla nueva"],
    "steps": [
        {"stepNumber": 1, "title": "Apagar", "description": "Apaga el interruptor."},
        {"stepNumber": 2, "title": "Sustituir", "description": "Desenrosca la bombilla y coloca la nueva."}
    ],
    "onlineResources": [{"title": "Guía de iluminación", "url": "https://example.com/luces"}]
}"#;

pub const REFINED_TEXT: &str = "Baja el diferencial del cuadro y comprueba con un buscapolos que no hay tensión.";

/// Answers structured requests with a fixed guide and free-text requests with a fixed sentence.
#[derive(Default)]
pub struct MockLlmService {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockLlmService {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("Proveedor de IA no disponible (503)".into()));
        }

        if request.response_schema.is_some() {
            Ok(LlmResponse {
                text: GUIDE_JSON.to_string(),
                grounding_sources: vec![GroundingSource {
                    title: "Fuente".into(),
                    url: "https://example.com/fuente".into(),
                }],
            })
        } else {
            Ok(LlmResponse { text: REFINED_TEXT.to_string(), grounding_sources: vec![] })
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailService {
    pub fn sent_to(&self, recipient: &str) -> Vec<SentEmail> {
        self.sent.lock().unwrap().iter().filter(|m| m.recipient == recipient).cloned().collect()
    }

    /// Raw token from the most recent link mailed to `recipient`.
    pub fn last_token_for(&self, recipient: &str) -> String {
        let mail = self.sent_to(recipient).pop().expect("No email sent to recipient");
        let start = mail.html_body.find("token=").expect("No token link in email") + 6;
        mail.html_body[start..].chars().take_while(|c| c.is_ascii_alphanumeric()).collect()
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuthHeaders {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub llm: Arc<MockLlmService>,
    pub mailer: Arc<RecordingEmailService>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            gemini_api_key: None,
            gemini_model: "test-model".to_string(),
            gemini_max_retries: 0,
            public_base_url: "http://app.test".to_string(),
            feedback_recipient: "feedback@example.com".to_string(),
            admin_emails: vec![ADMIN_EMAIL.to_string()],
        };

        let llm = Arc::new(MockLlmService::default());
        let mailer = Arc::new(RecordingEmailService::default());

        let state = Arc::new(AppState::assemble(
            config,
            Arc::new(SqliteUserRepo::new(pool.clone())),
            Arc::new(SqliteGuideRepo::new(pool.clone())),
            Arc::new(SqliteHistoryRepo::new(pool.clone())),
            Arc::new(SqliteAuthRepo::new(pool.clone())),
            mailer.clone(),
            llm.clone(),
            Arc::new(load_templates().unwrap()),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            llm,
            mailer,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", auth.csrf_token.clone());
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Presents a refresh token the way the browser would, as its only cookie.
    pub async fn refresh(&self, refresh_token: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/refresh")
            .header(header::COOKIE, format!("refresh_token={}", refresh_token))
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn register(&self, email: &str) -> AuthHeaders {
        let response = self.request("POST", "/api/v1/auth/register", None, Some(json!({
            "email": email,
            "password": PASSWORD,
            "password_confirmation": PASSWORD
        }))).await;

        if !response.status().is_success() {
            panic!("Register failed in test helper: status {}", response.status());
        }
        auth_headers(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthHeaders {
        let response = self.request("POST", "/api/v1/auth/login", None, Some(json!({
            "email": email,
            "password": password
        }))).await;

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }
        auth_headers(response).await
    }

    /// Registers a user, moves them to `role` directly in the store and logs in again
    /// so the token carries the new role.
    pub async fn user_with_role(&self, email: &str, role: Role) -> AuthHeaders {
        self.register(email).await;
        let user = self.state.user_repo.find_by_email(email).await.unwrap().unwrap();
        self.state.user_repo.update_plan(&user.id, role, quota_for_role(role)).await.unwrap();
        self.login(email, PASSWORD).await
    }

    pub async fn admin(&self) -> AuthHeaders {
        self.register(ADMIN_EMAIL).await
    }
}

async fn auth_headers(response: Response) -> AuthHeaders {
    let access_token = cookie_value(&response, "access_token").expect("No access_token cookie returned");
    let refresh_token = cookie_value(&response, "refresh_token").expect("No refresh_token cookie returned");

    let body_json = parse_body(response).await;
    let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

    AuthHeaders {
        access_token,
        refresh_token,
        csrf_token,
    }
}

/// Value of a cookie set by the response, if any.
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .map(|c| c[prefix.len()..].split(';').next().unwrap_or_default().to_string())
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
