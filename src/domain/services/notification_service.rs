use std::sync::Arc;
use serde_json::json;
use tera::{Context, Tera};
use tracing::{error, info};
use crate::domain::ports::EmailService;
use crate::error::AppError;

pub const ANONYMOUS_SENDER: &str = "anonymous";

pub struct NotificationService {
    email: Arc<dyn EmailService>,
    templates: Arc<Tera>,
    public_base_url: String,
    feedback_recipient: String,
}

impl NotificationService {
    pub fn new(
        email: Arc<dyn EmailService>,
        templates: Arc<Tera>,
        public_base_url: String,
        feedback_recipient: String,
    ) -> Self {
        Self { email, templates, public_base_url, feedback_recipient }
    }

    pub async fn send_verification(&self, recipient: &str, token: &str) -> Result<(), AppError> {
        let link = self.link("verify-email", token);
        let body = self.render("verify_email.html", json!({ "email": recipient, "link": link }))?;
        self.email.send(recipient, "Confirma tu correo electrónico", &body).await?;
        info!("Verification email sent to {}", recipient);
        Ok(())
    }

    pub async fn send_password_reset(&self, recipient: &str, token: &str) -> Result<(), AppError> {
        let link = self.link("reset-password", token);
        let body = self.render("password_reset.html", json!({ "email": recipient, "link": link }))?;
        self.email.send(recipient, "Restablece tu contraseña", &body).await?;
        info!("Password reset email sent to {}", recipient);
        Ok(())
    }

    pub async fn send_feedback(&self, from_email: Option<&str>, subject: Option<&str>, message: &str) -> Result<(), AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("El mensaje no puede estar vacío.".into()));
        }
        let sender = from_email.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(ANONYMOUS_SENDER);
        let subject = subject.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("Sin asunto");

        let body = self.render("feedback.html", json!({
            "sender": sender,
            "subject": subject,
            "message": message,
        }))?;
        self.email.send(&self.feedback_recipient, &format!("[Feedback] {}", subject), &body).await?;
        info!("Feedback from {} forwarded", sender);
        Ok(())
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}/{}?token={}", self.public_base_url.trim_end_matches('/'), path, token)
    }

    fn render(&self, template: &str, data: serde_json::Value) -> Result<String, AppError> {
        let context = Context::from_value(data).map_err(|_| AppError::Internal)?;
        self.templates.render(template, &context).map_err(|e| {
            error!("Template {} failed to render: {}", template, e);
            AppError::Internal
        })
    }
}
