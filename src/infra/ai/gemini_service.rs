use crate::domain::models::ai::{LlmRequest, LlmResponse, TurnRole};
use crate::domain::models::guide::GroundingSource;
use crate::domain::ports::LlmService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{error, info, warn, instrument};
use std::time::Duration;
use tokio::time::sleep;

const INITIAL_BACKOFF_MS: u64 = 500;
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiService {
    client: Client,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
}

impl GeminiService {
    pub fn new(api_key: Option<String>, model: String, max_retries: u32) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            max_retries,
        }
    }

    async fn send_request_with_retry(&self, url: &str, api_key: &str, payload: &Value) -> Result<LlmResponse, AppError> {
        let mut retries = 0;
        let mut backoff = INITIAL_BACKOFF_MS;

        loop {
            let res = self.client.post(url)
                .header("x-goog-api-key", api_key)
                .header("Content-Type", "application/json")
                .json(payload)
                .send()
                .await;

            match res {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body: Value = response.json().await.map_err(|e| {
                            error!("Failed to parse Gemini response JSON: {:?}", e);
                            AppError::Upstream("Respuesta de la IA ilegible.".to_string())
                        })?;
                        return extract_content(&body);
                    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if retries >= self.max_retries {
                            let text = response.text().await.unwrap_or_default();
                            error!("Gemini API failed after {} retries. Status: {}, Body: {}", retries, status, text);
                            return Err(AppError::Upstream(format!("Proveedor de IA no disponible ({})", status)));
                        }
                        warn!("Gemini API transient error {}. Retrying in {}ms...", status, backoff);
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        error!("Gemini API terminal error {}: {}", status, text);
                        return Err(AppError::Upstream(format!("Solicitud rechazada por la IA ({})", status)));
                    }
                },
                Err(e) => {
                    if retries >= self.max_retries {
                        error!("Gemini network error after {} retries: {:?}", retries, e);
                        return Err(AppError::Upstream("No se pudo contactar con la IA.".to_string()));
                    }
                    warn!("Gemini network error. Retrying in {}ms... {:?}", backoff, e);
                }
            }

            sleep(Duration::from_millis(backoff)).await;
            retries += 1;
            backoff *= 2;
        }
    }
}

fn build_payload(request: &LlmRequest) -> Value {
    let last = request.turns.len().saturating_sub(1);
    let contents: Vec<Value> = request.turns.iter().enumerate().map(|(i, turn)| {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Assistant => "model",
        };
        let mut parts = vec![json!({ "text": turn.content })];
        // The attachment rides on the final user turn.
        if i == last && let Some(image) = &request.image {
            parts.push(json!({
                "inlineData": { "mimeType": image.mime_type, "data": image.base64 }
            }));
        }
        json!({ "role": role, "parts": parts })
    }).collect();

    let mut generation_config = json!({
        "temperature": 0.7,
        "maxOutputTokens": 8192,
    });
    if let Some(schema) = &request.response_schema {
        generation_config["responseMimeType"] = json!("application/json");
        generation_config["responseSchema"] = schema.clone();
    }

    json!({
        "contents": contents,
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        },
        "generationConfig": generation_config,
        "safetySettings": [
            { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE" },
            { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_MEDIUM_AND_ABOVE" },
            { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_MEDIUM_AND_ABOVE" },
            { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE" }
        ]
    })
}

fn extract_content(body: &Value) -> Result<LlmResponse, AppError> {
    if let Some(candidates) = body.get("candidates").and_then(|c| c.as_array())
        && let Some(first) = candidates.first() {

        if let Some(finish_reason) = first.get("finishReason").and_then(|s| s.as_str())
            && finish_reason != "STOP" {
                warn!("AI generation stopped abnormally. Reason: {}", finish_reason);
                if finish_reason == "SAFETY" {
                    return Err(AppError::Upstream("La IA bloqueó la respuesta por seguridad.".to_string()));
                }
            }

        if let Some(content) = first.get("content")
            && let Some(parts) = content.get("parts").and_then(|p| p.as_array()) {
            let text: String = parts.iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect();

            if !text.trim().is_empty() {
                return Ok(LlmResponse {
                    text: text.trim().to_string(),
                    grounding_sources: extract_grounding(first),
                });
            }
        }
    }

    error!("Invalid or unexpected response structure from Gemini: {:?}", body);
    Err(AppError::Upstream("La IA no devolvió contenido.".to_string()))
}

fn extract_grounding(candidate: &Value) -> Vec<GroundingSource> {
    let Some(chunks) = candidate.pointer("/groundingMetadata/groundingChunks").and_then(|c| c.as_array()) else {
        return Vec::new();
    };

    chunks.iter()
        .filter_map(|chunk| {
            let web = chunk.get("web")?;
            let url = web.get("uri").and_then(|u| u.as_str())?;
            let title = web.get("title").and_then(|t| t.as_str()).unwrap_or(url);
            Some(GroundingSource { title: title.to_string(), url: url.to_string() })
        })
        .collect()
}

#[async_trait]
impl LlmService for GeminiService {
    #[instrument(skip(self, request), fields(prompt_len = request.turns.iter().map(|t| t.content.len()).sum::<usize>()))]
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("GEMINI_API_KEY is not configured");
            AppError::Upstream("El servicio de IA no está configurado.".to_string())
        })?;

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let payload = build_payload(request);

        info!("Sending generation request to Gemini...");
        let result = self.send_request_with_retry(&url, api_key, &payload).await?;
        info!("Successfully generated content from AI.");
        Ok(result)
    }
}
