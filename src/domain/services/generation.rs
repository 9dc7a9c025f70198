use std::sync::Arc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use crate::domain::models::{
    ai::{ImageFile, LlmRequest},
    guide::{Guide, GuideContent, OnlineResource, ProcessStep, TaskCategory, TaskComplexity, TaskPriority},
    history::HistoryEntry,
    user::Quota,
};
use crate::domain::ports::{GuideRepository, HistoryRepository, LlmService, UserRepository};
use crate::domain::services::validation::{is_valid_url, validate_description, validate_image};
use crate::error::AppError;

const SYSTEM_INSTRUCTION: &str = r#"Eres un técnico experto que redacta guías paso a paso en español.
Dada la descripción de una tarea (y, si se adjunta, una imagen del objeto), genera una guía
segura, concreta y ordenada. Incluye advertencias de seguridad relevantes, herramientas y
materiales necesarios, pasos numerados con título y descripción detallada, y recursos en línea
fiables. Responde únicamente con JSON que siga el esquema indicado."#;

pub struct GenerationRequest {
    pub description: String,
    pub complexity: TaskComplexity,
    pub priority: TaskPriority,
    pub image: Option<ImageFile>,
    pub publish: bool,
}

pub struct GenerationOutcome {
    pub guide: Guide,
    pub remaining_generations: Quota,
}

pub struct GenerationService {
    users: Arc<dyn UserRepository>,
    guides: Arc<dyn GuideRepository>,
    history: Arc<dyn HistoryRepository>,
    llm: Arc<dyn LlmService>,
}

impl GenerationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        guides: Arc<dyn GuideRepository>,
        history: Arc<dyn HistoryRepository>,
        llm: Arc<dyn LlmService>,
    ) -> Self {
        Self { users, guides, history, llm }
    }

    /// Quota check, model call, persistence, then quota decrement.
    ///
    /// Persisting and decrementing are separate writes; a failure in between
    /// leaves the guide stored without the generation being charged.
    pub async fn generate(&self, user_id: &str, request: GenerationRequest) -> Result<GenerationOutcome, AppError> {
        let user = self.users.find_by_id(user_id).await?
            .ok_or(AppError::Unauthorized)?;

        validate_description(&request.description)?;

        if !user.remaining_generations.has_remaining() {
            warn!("Generation refused for user {}: quota exhausted", user.id);
            return Err(AppError::QuotaExceeded);
        }

        if let Some(image) = &request.image {
            if !user.role.can_attach_media() {
                return Err(AppError::Forbidden("Actualiza a Pro para subir imágenes.".into()));
            }
            validate_image(image)?;
        }

        let llm_request = LlmRequest::text(SYSTEM_INSTRUCTION, build_prompt(&request))
            .with_image(request.image.clone())
            .with_schema(guide_schema());

        let response = self.llm.generate(&llm_request).await.map_err(into_upstream)?;

        let mut content = parse_generated_guide(&response.text, request.priority)?;
        content.grounding_sources = response.grounding_sources;
        let guide = Guide::generated(content);

        if request.publish {
            self.guides.create(&guide).await?;
        }
        self.history.add(&HistoryEntry::new(user.id.clone(), &guide)).await?;

        let remaining_generations = match user.remaining_generations {
            Quota::Unlimited => Quota::Unlimited,
            Quota::Limited(_) => {
                if !self.users.consume_generation(&user.id).await? {
                    warn!("Quota for user {} was already exhausted when charging", user.id);
                }
                self.users.find_by_id(&user.id).await?
                    .map(|u| u.remaining_generations)
                    .unwrap_or(Quota::Limited(0))
            }
        };

        info!("Generated guide {} for user {}", guide.id, user.id);
        Ok(GenerationOutcome { guide, remaining_generations })
    }
}

/// Every failure of the model call surfaces as an upstream error.
pub fn into_upstream(err: AppError) -> AppError {
    match err {
        AppError::Upstream(msg) => AppError::Upstream(msg),
        AppError::Validation(msg) => AppError::Upstream(msg),
        other => AppError::Upstream(other.to_string()),
    }
}

fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Descripción de la tarea: {}\nComplejidad estimada: {}\nPrioridad: {}",
        request.description.trim(),
        request.complexity.label(),
        request.priority.as_str(),
    );
    if request.image.is_some() {
        prompt.push_str("\nSe adjunta una imagen del objeto; úsala para afinar el diagnóstico.");
    }
    prompt
}

pub fn guide_schema() -> Value {
    let categories: Vec<&str> = TaskCategory::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "taskTitle": { "type": "STRING" },
            "category": { "type": "STRING", "enum": categories },
            "safetyWarnings": { "type": "ARRAY", "items": { "type": "STRING" } },
            "requiredTools": { "type": "ARRAY", "items": { "type": "STRING" } },
            "steps": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "stepNumber": { "type": "INTEGER" },
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["stepNumber", "title", "description"]
                }
            },
            "onlineResources": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "url": { "type": "STRING" }
                    },
                    "required": ["title", "url"]
                }
            }
        },
        "required": ["taskTitle", "category", "safetyWarnings", "requiredTools", "steps"]
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedStep {
    title: String,
    description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedGuide {
    task_title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    safety_warnings: Vec<String>,
    #[serde(default)]
    required_tools: Vec<String>,
    steps: Vec<GeneratedStep>,
    #[serde(default)]
    online_resources: Vec<OnlineResource>,
}

/// Turns the model's JSON into guide content. Steps are renumbered in order
/// and resources with unusable links are dropped.
pub fn parse_generated_guide(raw: &str, priority: TaskPriority) -> Result<GuideContent, AppError> {
    let cleaned = raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let parsed: GeneratedGuide = serde_json::from_str(cleaned).map_err(|e| {
        warn!("Unparseable generation output: {}", e);
        AppError::Upstream("La respuesta de la IA no tiene el formato esperado.".into())
    })?;

    let steps: Vec<ProcessStep> = parsed.steps.into_iter()
        .filter(|s| !s.title.trim().is_empty() || !s.description.trim().is_empty())
        .enumerate()
        .map(|(i, s)| ProcessStep {
            step_number: i as u32 + 1,
            title: s.title.trim().to_string(),
            description: s.description.trim().to_string(),
            image_url: None,
            video_url: None,
        })
        .collect();

    if parsed.task_title.trim().is_empty() || steps.is_empty() {
        return Err(AppError::Upstream("La IA no devolvió una guía completa.".into()));
    }

    Ok(GuideContent {
        title: parsed.task_title.trim().to_string(),
        category: TaskCategory::from_loose(&parsed.category),
        priority,
        safety_warnings: non_blank(parsed.safety_warnings),
        tools: non_blank(parsed.required_tools),
        steps,
        resources: parsed.online_resources.into_iter()
            .filter(|r| !r.title.trim().is_empty() && is_valid_url(&r.url))
            .collect(),
        grounding_sources: Vec::new(),
    })
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
