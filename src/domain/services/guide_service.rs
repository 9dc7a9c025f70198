use std::collections::HashMap;
use std::sync::Arc;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::domain::models::{
    ai::LlmRequest,
    auth::SessionUser,
    guide::{Guide, GuideAuthor, GuideContent, GuideStatus, OnlineResource, ProcessStep, TaskCategory, TaskPriority},
};
use crate::domain::ports::{GuideRepository, HistoryRepository, LlmService};
use crate::domain::services::generation::into_upstream;
use crate::domain::services::moderation::{self, ModerationAction};
use crate::domain::services::validation::is_valid_url;
use crate::error::AppError;

pub const TOP_CONTRIBUTORS_LIMIT: usize = 10;

const REFINE_INSTRUCTION: &str = "Eres un técnico experto. Reescribe la descripción del paso indicado con más detalle y precisión, \
    manteniendo el mismo objetivo. Responde solo con el nuevo texto de la descripción, sin títulos ni formato markdown.";

#[derive(Debug, Deserialize)]
pub struct StepDraft {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuideDraft {
    pub title: String,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    #[serde(default)]
    pub safety_warnings: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    pub steps: Vec<StepDraft>,
    #[serde(default)]
    pub resources: Vec<OnlineResource>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Contributor {
    pub email: String,
    pub count: usize,
}

pub struct GuideService {
    guides: Arc<dyn GuideRepository>,
    history: Arc<dyn HistoryRepository>,
}

impl GuideService {
    pub fn new(guides: Arc<dyn GuideRepository>, history: Arc<dyn HistoryRepository>) -> Self {
        Self { guides, history }
    }

    /// Approved guides, newest first, optionally narrowed by category and title text.
    pub async fn list_public(&self, category: Option<TaskCategory>, query: Option<&str>) -> Result<Vec<Guide>, AppError> {
        let needle = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
        let guides = self.guides.list_by_status(GuideStatus::Approved).await?;

        Ok(guides.into_iter()
            .filter(|g| category.is_none_or(|c| g.category == c))
            .filter(|g| needle.as_deref().is_none_or(|n| g.title.to_lowercase().contains(n)))
            .collect())
    }

    pub async fn stats(&self) -> Result<(i64, i64, i64), AppError> {
        Ok((
            self.guides.count_by_status(GuideStatus::Pending).await?,
            self.guides.count_by_status(GuideStatus::Approved).await?,
            self.guides.count_by_status(GuideStatus::Rejected).await?,
        ))
    }

    pub async fn contribute(&self, author: &SessionUser, draft: GuideDraft) -> Result<Guide, AppError> {
        if !author.role.can_contribute() {
            return Err(AppError::Forbidden("Solo los colaboradores pueden aportar guías.".into()));
        }
        let content = validate_draft(draft)?;
        let created = self.guides.create(&Guide::contributed(content, author.email.clone())).await?;
        info!("Guide {} submitted for review by {}", created.id, author.id);
        Ok(created)
    }

    /// Approved guides are public; anything else only reaches its author and admins.
    pub async fn find_visible(&self, id: &str, viewer: Option<&SessionUser>) -> Result<Guide, AppError> {
        let guide = self.guides.find_by_id(id).await?
            .ok_or(AppError::NotFound("Guía no encontrada".into()))?;

        let visible = guide.status == GuideStatus::Approved
            || viewer.is_some_and(|u| u.role.is_admin() || guide.is_authored_by(&u.email));

        if !visible {
            return Err(AppError::NotFound("Guía no encontrada".into()));
        }
        Ok(guide)
    }

    pub async fn moderate(&self, id: &str, action: ModerationAction) -> Result<Guide, AppError> {
        let mut guide = self.guides.find_by_id(id).await?
            .ok_or(AppError::NotFound("Guía no encontrada".into()))?;

        moderation::apply(&mut guide, action)?;
        let updated = self.guides.update_moderation(&guide).await?;
        info!("Guide {} moved to {}", updated.id, updated.status.as_str());
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.guides.find_by_id(id).await?
            .ok_or(AppError::NotFound("Guía no encontrada".into()))?;

        self.guides.delete(id).await?;
        self.history.delete_by_guide(id).await?;
        info!("Guide {} deleted", id);
        Ok(())
    }

    /// Rewrites one step with the model and stores it on the guide and on every history copy.
    ///
    /// Unpublished generations live only in the caller's history; those are
    /// refined in place there.
    pub async fn refine_step(
        &self,
        llm: &dyn LlmService,
        user: &SessionUser,
        guide_id: &str,
        step_number: u32,
    ) -> Result<Guide, AppError> {
        let (mut guide, published) = match self.guides.find_by_id(guide_id).await? {
            Some(guide) => {
                let allowed = user.role.is_admin()
                    || guide.is_authored_by(&user.email)
                    || self.history.contains_guide(&user.id, &guide.id).await?;
                if !allowed {
                    return Err(AppError::Forbidden("No puedes modificar esta guía.".into()));
                }
                (guide, true)
            }
            None => {
                let snapshot = self.history.find_snapshot(&user.id, guide_id).await?
                    .ok_or(AppError::NotFound("Guía no encontrada".into()))?;
                (snapshot, false)
            }
        };

        let step = guide.steps.0.iter()
            .find(|s| s.step_number == step_number)
            .cloned()
            .ok_or(AppError::NotFound("Paso no encontrado".into()))?;

        let prompt = format!(
            "Guía: {}\nPaso {}: {}\nDescripción actual: {}",
            guide.title, step.step_number, step.title, step.description
        );
        let response = llm.generate(&LlmRequest::text(REFINE_INSTRUCTION, prompt)).await
            .map_err(into_upstream)?;

        let refined = response.text.trim();
        if refined.is_empty() {
            return Err(AppError::Upstream("La IA no devolvió una descripción.".into()));
        }

        if let Some(target) = guide.steps.0.iter_mut().find(|s| s.step_number == step_number) {
            target.description = refined.to_string();
        }
        guide.updated_at = Utc::now();

        let updated = if published {
            self.guides.update_steps(&guide).await?
        } else {
            guide
        };
        self.history.sync_snapshot(&updated).await?;
        info!("Refined step {} of guide {}", step_number, updated.id);
        Ok(updated)
    }

    pub async fn top_contributors(&self) -> Result<Vec<Contributor>, AppError> {
        let approved = self.guides.list_by_status(GuideStatus::Approved).await?;
        Ok(rank_contributors(&approved, TOP_CONTRIBUTORS_LIMIT))
    }
}

/// Counts approved community guides per author, highest first.
pub fn rank_contributors(guides: &[Guide], limit: usize) -> Vec<Contributor> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for guide in guides {
        if guide.author != GuideAuthor::Collaborator || guide.status != GuideStatus::Approved {
            continue;
        }
        if let Some(email) = guide.author_email.as_deref() {
            *counts.entry(email).or_default() += 1;
        }
    }

    let mut ranked: Vec<Contributor> = counts.into_iter()
        .map(|(email, count)| Contributor { email: email.to_string(), count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.email.cmp(&b.email)));
    ranked.truncate(limit);
    ranked
}

fn validate_draft(draft: GuideDraft) -> Result<GuideContent, AppError> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("El título de la guía es obligatorio.".into()));
    }

    if draft.steps.is_empty() {
        return Err(AppError::Validation("La guía necesita al menos un paso.".into()));
    }
    let mut steps = Vec::with_capacity(draft.steps.len());
    for (i, s) in draft.steps.into_iter().enumerate() {
        if s.title.trim().is_empty() || s.description.trim().is_empty() {
            return Err(AppError::Validation(format!("El paso {} necesita título y descripción.", i + 1)));
        }
        steps.push(ProcessStep {
            step_number: i as u32 + 1,
            title: s.title.trim().to_string(),
            description: s.description.trim().to_string(),
            image_url: s.image_url.filter(|u| !u.trim().is_empty()),
            video_url: s.video_url.filter(|u| !u.trim().is_empty()),
        });
    }

    let resources: Vec<OnlineResource> = draft.resources.into_iter()
        .filter(|r| !r.title.trim().is_empty() && !r.url.trim().is_empty())
        .map(|r| OnlineResource { title: r.title.trim().to_string(), url: r.url.trim().to_string() })
        .collect();
    if resources.iter().any(|r| !is_valid_url(&r.url)) {
        return Err(AppError::Validation("Por favor, introduce una URL válida.".into()));
    }

    let clean = |items: Vec<String>| -> Vec<String> {
        items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    };

    Ok(GuideContent {
        title,
        category: draft.category,
        priority: draft.priority,
        safety_warnings: clean(draft.safety_warnings),
        tools: clean(draft.tools),
        steps,
        resources,
        grounding_sources: Vec::new(),
    })
}
