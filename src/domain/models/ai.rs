use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::domain::models::guide::GroundingSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Media attached to a prompt, as uploaded by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageFile {
    pub base64: String,
    pub mime_type: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_instruction: String,
    /// Conversation in order; the last turn is the prompt being answered.
    pub turns: Vec<ChatTurn>,
    pub image: Option<ImageFile>,
    /// JSON schema the provider must follow. `None` means free text.
    pub response_schema: Option<Value>,
}

impl LlmRequest {
    pub fn text(system_instruction: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            turns: vec![ChatTurn { role: TurnRole::User, content: prompt.into() }],
            image: None,
            response_schema: None,
        }
    }

    pub fn with_image(mut self, image: Option<ImageFile>) -> Self {
        self.image = image;
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: String,
    pub grounding_sources: Vec<GroundingSource>,
}
