use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use crate::domain::models::guide::Guide;

/// A user's private copy of a guide they generated.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct HistoryEntry {
    pub id: String,
    pub user_id: String,
    pub guide_id: String,
    #[serde(rename = "guide")]
    pub snapshot: Json<Guide>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(user_id: String, guide: &Guide) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            guide_id: guide.id.clone(),
            snapshot: Json(guide.clone()),
            created_at: Utc::now(),
        }
    }
}
