use std::sync::Arc;
use tracing::warn;
use crate::domain::models::ai::{ChatTurn, ImageFile, LlmRequest, TurnRole};
use crate::domain::ports::LlmService;
use crate::domain::services::validation::validate_image;
use crate::error::AppError;

pub const MEDIA_FALLBACK: &str = "No se pudo analizar el archivo. Por favor, describe la tarea manualmente.";
pub const CHAT_FALLBACK: &str = "Lo siento, no pude procesar tu solicitud en este momento.";

/// Turns kept from the client-side conversation.
const MAX_CHAT_TURNS: usize = 20;

const MEDIA_INSTRUCTION: &str = "Describe en español, en dos o tres frases, el objeto de la imagen y la tarea de \
    mantenimiento o reparación que parece necesitar. La descripción se usará como punto de partida de una guía.";

const CHAT_INSTRUCTION: &str = "Eres el asistente de ayuda de TUTORIAL 2.0, una aplicación que genera guías paso a paso \
    con IA. Los planes son: Básico (3 generaciones), Estándar (20 generaciones), Pro (ilimitadas y análisis de imágenes) \
    y Colaborador (ilimitadas y publicación de guías revisadas por moderadores). Responde en español, de forma breve y amable.";

pub struct AssistantService {
    llm: Arc<dyn LlmService>,
}

impl AssistantService {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    /// Short description of an uploaded image. Model failures degrade to a fixed hint.
    pub async fn describe_media(&self, image: ImageFile) -> Result<String, AppError> {
        validate_image(&image)?;
        let prompt = format!("Archivo: {}", image.name);
        let request = LlmRequest::text(MEDIA_INSTRUCTION, prompt).with_image(Some(image));

        match self.llm.generate(&request).await {
            Ok(response) if !response.text.trim().is_empty() => Ok(response.text.trim().to_string()),
            Ok(_) => Ok(MEDIA_FALLBACK.to_string()),
            Err(e) => {
                warn!("Media description failed: {}", e);
                Ok(MEDIA_FALLBACK.to_string())
            }
        }
    }

    pub async fn chat(&self, message: &str, history: Vec<ChatTurn>) -> Result<String, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("El mensaje no puede estar vacío.".into()));
        }

        let mut turns: Vec<ChatTurn> = history.into_iter()
            .filter(|t| !t.content.trim().is_empty())
            .collect();
        if turns.len() > MAX_CHAT_TURNS {
            turns.drain(..turns.len() - MAX_CHAT_TURNS);
        }
        // Conversations sent to the provider must open with a user turn.
        while turns.first().is_some_and(|t| t.role != TurnRole::User) {
            turns.remove(0);
        }
        turns.push(ChatTurn { role: TurnRole::User, content: message.to_string() });

        let request = LlmRequest {
            system_instruction: CHAT_INSTRUCTION.to_string(),
            turns,
            image: None,
            response_schema: None,
        };

        match self.llm.generate(&request).await {
            Ok(response) if !response.text.trim().is_empty() => Ok(response.text.trim().to_string()),
            Ok(_) => Ok(CHAT_FALLBACK.to_string()),
            Err(e) => {
                warn!("Assistant chat failed: {}", e);
                Ok(CHAT_FALLBACK.to_string())
            }
        }
    }
}
