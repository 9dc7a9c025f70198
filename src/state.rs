use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, EmailService, GuideRepository, HistoryRepository, LlmService, UserRepository,
};
use crate::domain::services::{
    assistant_service::AssistantService, auth_service::AuthService, generation::GenerationService,
    guide_service::GuideService, notification_service::NotificationService,
};
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub guide_repo: Arc<dyn GuideRepository>,
    pub history_repo: Arc<dyn HistoryRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub auth_service: Arc<AuthService>,
    pub generation_service: Arc<GenerationService>,
    pub guide_service: Arc<GuideService>,
    pub assistant_service: Arc<AssistantService>,
    pub notification_service: Arc<NotificationService>,
    pub email_service: Arc<dyn EmailService>,
    pub llm_service: Arc<dyn LlmService>,
}

impl AppState {
    /// Wires the domain services on top of a set of adapters.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        config: Config,
        user_repo: Arc<dyn UserRepository>,
        guide_repo: Arc<dyn GuideRepository>,
        history_repo: Arc<dyn HistoryRepository>,
        auth_repo: Arc<dyn AuthRepository>,
        email_service: Arc<dyn EmailService>,
        llm_service: Arc<dyn LlmService>,
        templates: Arc<Tera>,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(auth_repo.clone(), config.clone()));
        let generation_service = Arc::new(GenerationService::new(
            user_repo.clone(),
            guide_repo.clone(),
            history_repo.clone(),
            llm_service.clone(),
        ));
        let guide_service = Arc::new(GuideService::new(guide_repo.clone(), history_repo.clone()));
        let assistant_service = Arc::new(AssistantService::new(llm_service.clone()));
        let notification_service = Arc::new(NotificationService::new(
            email_service.clone(),
            templates,
            config.public_base_url.clone(),
            config.feedback_recipient.clone(),
        ));

        Self {
            config,
            user_repo,
            guide_repo,
            history_repo,
            auth_repo,
            auth_service,
            generation_service,
            guide_service,
            assistant_service,
            notification_service,
            email_service,
            llm_service,
        }
    }
}
