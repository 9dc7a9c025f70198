use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use crate::domain::models::user::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuideStatus {
    Pending,
    Approved,
    Rejected,
}

impl GuideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideStatus::Pending => "PENDING",
            GuideStatus::Approved => "APPROVED",
            GuideStatus::Rejected => "REJECTED",
        }
    }
}

impl TryFrom<String> for GuideStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(GuideStatus::Pending),
            "APPROVED" => Ok(GuideStatus::Approved),
            "REJECTED" => Ok(GuideStatus::Rejected),
            _ => Err(UnknownVariant { kind: "guide status", value }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuideAuthor {
    Ai,
    Collaborator,
}

impl GuideAuthor {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideAuthor::Ai => "AI",
            GuideAuthor::Collaborator => "COLLABORATOR",
        }
    }
}

impl TryFrom<String> for GuideAuthor {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "AI" => Ok(GuideAuthor::Ai),
            "COLLABORATOR" => Ok(GuideAuthor::Collaborator),
            _ => Err(UnknownVariant { kind: "guide author", value }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "HIGH",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::Low => "LOW",
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "HIGH" => Ok(TaskPriority::High),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "LOW" => Ok(TaskPriority::Low),
            _ => Err(UnknownVariant { kind: "priority", value }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskComplexity {
    Simple,
    Medium,
    Complex,
}

impl TaskComplexity {
    /// Wording used inside the generation prompt.
    pub fn label(&self) -> &'static str {
        match self {
            TaskComplexity::Simple => "Simple",
            TaskComplexity::Medium => "Media",
            TaskComplexity::Complex => "Compleja",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Home,
    Automotive,
    Technology,
    Crafts,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::Home,
        TaskCategory::Automotive,
        TaskCategory::Technology,
        TaskCategory::Crafts,
        TaskCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Home => "HOME",
            TaskCategory::Automotive => "AUTOMOTIVE",
            TaskCategory::Technology => "TECHNOLOGY",
            TaskCategory::Crafts => "CRAFTS",
            TaskCategory::Other => "OTHER",
        }
    }

    /// Lenient parse for model output; anything unrecognised lands in `Other`.
    pub fn from_loose(value: &str) -> Self {
        let upper = value.trim().to_uppercase();
        TaskCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .unwrap_or(TaskCategory::Other)
    }
}

impl TryFrom<String> for TaskCategory {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .ok_or(UnknownVariant { kind: "category", value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub step_number: u32,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineResource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Guide {
    pub id: String,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub category: TaskCategory,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,
    pub safety_warnings: Json<Vec<String>>,
    pub tools: Json<Vec<String>>,
    pub steps: Json<Vec<ProcessStep>>,
    pub resources: Json<Vec<OnlineResource>>,
    pub grounding_sources: Json<Vec<GroundingSource>>,
    #[sqlx(try_from = "String")]
    pub author: GuideAuthor,
    pub author_email: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: GuideStatus,
    pub moderator_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a guide, independent of who wrote it.
#[derive(Debug, Clone)]
pub struct GuideContent {
    pub title: String,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub safety_warnings: Vec<String>,
    pub tools: Vec<String>,
    pub steps: Vec<ProcessStep>,
    pub resources: Vec<OnlineResource>,
    pub grounding_sources: Vec<GroundingSource>,
}

impl Guide {
    fn build(content: GuideContent, author: GuideAuthor, author_email: Option<String>, status: GuideStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: content.title,
            category: content.category,
            priority: content.priority,
            safety_warnings: Json(content.safety_warnings),
            tools: Json(content.tools),
            steps: Json(content.steps),
            resources: Json(content.resources),
            grounding_sources: Json(content.grounding_sources),
            author,
            author_email,
            status,
            moderator_feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// AI output is published without review.
    pub fn generated(content: GuideContent) -> Self {
        Self::build(content, GuideAuthor::Ai, None, GuideStatus::Approved)
    }

    /// Community submissions always wait for moderation.
    pub fn contributed(content: GuideContent, author_email: String) -> Self {
        Self::build(content, GuideAuthor::Collaborator, Some(author_email), GuideStatus::Pending)
    }

    pub fn is_authored_by(&self, email: &str) -> bool {
        self.author_email.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(email))
    }
}
