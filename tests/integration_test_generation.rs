mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use guide_backend::domain::models::user::{Quota, Role};
use serde_json::{json, Value};

const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn generation_body() -> Value {
    json!({
        "description": "La bombilla del salón parpadea",
        "complexity": "SIMPLE",
        "priority": "LOW"
    })
}

#[tokio::test]
async fn test_basic_quota_is_spent_then_refused() {
    let app = TestApp::new().await;
    let auth = app.register("basic@example.com").await;

    for expected_remaining in [2, 1, 0] {
        let response = app.request("POST", "/api/v1/generations", Some(&auth), Some(generation_body())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_body(response).await;
        assert_eq!(body["remaining_generations"], expected_remaining);
        assert_eq!(body["guide"]["status"], "APPROVED");
        assert_eq!(body["guide"]["author"], "AI");
    }
    assert_eq!(app.llm.call_count(), 3);

    let refused = app.request("POST", "/api/v1/generations", Some(&auth), Some(generation_body())).await;
    assert_eq!(refused.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(parse_body(refused).await["error"], "No tienes generaciones restantes.");
    assert_eq!(app.llm.call_count(), 3);

    let account = parse_body(app.request("GET", "/api/v1/account", Some(&auth), None).await).await;
    assert_eq!(account["remaining_generations"], 0);
}

#[tokio::test]
async fn test_exhausted_quota_never_reaches_the_model() {
    let app = TestApp::new().await;
    let auth = app.register("empty@example.com").await;
    let user = app.state.user_repo.find_by_email("empty@example.com").await.unwrap().unwrap();
    app.state.user_repo.update_plan(&user.id, Role::Basic, Quota::Limited(0)).await.unwrap();

    let response = app.request("POST", "/api/v1/generations", Some(&auth), Some(generation_body())).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_generation_input_is_validated() {
    let app = TestApp::new().await;

    let anonymous = app.request("POST", "/api/v1/generations", None, Some(generation_body())).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let auth = app.register("short@example.com").await;
    let short = app.request("POST", "/api/v1/generations", Some(&auth), Some(json!({
        "description": "  corta   ",
        "complexity": "SIMPLE",
        "priority": "LOW"
    }))).await;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(short).await["error"], "La descripción debe tener al menos 10 caracteres.");
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_model_failure_is_reported_and_nothing_is_charged() {
    let app = TestApp::new().await;
    let auth = app.register("fail@example.com").await;
    app.llm.set_failing(true);

    let response = app.request("POST", "/api/v1/generations", Some(&auth), Some(generation_body())).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let error = parse_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Error del backend: "));
    assert_eq!(app.llm.call_count(), 1);

    let account = parse_body(app.request("GET", "/api/v1/account", Some(&auth), None).await).await;
    assert_eq!(account["remaining_generations"], 3);

    let history = parse_body(app.request("GET", "/api/v1/history", Some(&auth), None).await).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generated_guide_is_published_and_recorded() {
    let app = TestApp::new().await;
    let auth = app.register("pub@example.com").await;

    let body = parse_body(app.request("POST", "/api/v1/generations", Some(&auth), Some(generation_body())).await).await;
    let guide = &body["guide"];
    assert_eq!(guide["title"], "Cambiar una bombilla");
    assert_eq!(guide["category"], "HOME");
    assert_eq!(guide["priority"], "LOW");
    assert_eq!(guide["steps"].as_array().unwrap().len(), 2);
    assert_eq!(guide["grounding_sources"][0]["url"], "https://example.com/fuente");

    let catalog = parse_body(app.request("GET", "/api/v1/guides", None, None).await).await;
    assert_eq!(catalog.as_array().unwrap().len(), 1);

    let history = parse_body(app.request("GET", "/api/v1/history", Some(&auth), None).await).await;
    assert_eq!(history[0]["guide"]["id"], guide["id"]);
}

#[tokio::test]
async fn test_unpublished_generation_stays_private() {
    let app = TestApp::new().await;
    let auth = app.register("private@example.com").await;

    let mut request = generation_body();
    request["publish"] = json!(false);
    let body = parse_body(app.request("POST", "/api/v1/generations", Some(&auth), Some(request)).await).await;
    assert_eq!(body["remaining_generations"], 2);

    let catalog = parse_body(app.request("GET", "/api/v1/guides", None, None).await).await;
    assert!(catalog.as_array().unwrap().is_empty());

    let history = parse_body(app.request("GET", "/api/v1/history", Some(&auth), None).await).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unpublished_generation_can_be_refined_by_its_owner() {
    let app = TestApp::new().await;
    let owner = app.register("private-refine@example.com").await;
    let stranger = app.register("nosy@example.com").await;

    let mut request = generation_body();
    request["publish"] = json!(false);
    let body = parse_body(app.request("POST", "/api/v1/generations", Some(&owner), Some(request)).await).await;
    let guide_id = body["guide"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/guides/{}/steps/1/refine", guide_id);

    let refined = app.request("POST", &uri, Some(&owner), None).await;
    assert_eq!(refined.status(), StatusCode::OK);
    assert_eq!(parse_body(refined).await["steps"][0]["description"], common::REFINED_TEXT);

    let history = parse_body(app.request("GET", "/api/v1/history", Some(&owner), None).await).await;
    assert_eq!(history[0]["guide"]["steps"][0]["description"], common::REFINED_TEXT);
    assert_eq!(history[0]["guide"]["steps"][1]["description"], "Desenrosca la bombilla y coloca la nueva.");

    // Still private: not in the catalog and unknown to anyone else.
    let public = app.request("GET", &format!("/api/v1/guides/{}", guide_id), None, None).await;
    assert_eq!(public.status(), StatusCode::NOT_FOUND);
    let other = app.request("POST", &uri, Some(&stranger), None).await;
    assert_eq!(other.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_images_require_a_media_plan() {
    let app = TestApp::new().await;
    let image = json!({ "base64": PNG_BASE64, "mime_type": "image/png", "name": "foto.png" });

    let basic = app.register("nomedia@example.com").await;
    let mut request = generation_body();
    request["image"] = image.clone();
    let refused = app.request("POST", "/api/v1/generations", Some(&basic), Some(request.clone())).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.llm.call_count(), 0);

    let pro = app.user_with_role("pro@example.com", Role::Pro).await;
    let accepted = app.request("POST", "/api/v1/generations", Some(&pro), Some(request)).await;
    assert_eq!(accepted.status(), StatusCode::CREATED);
    assert_eq!(parse_body(accepted).await["remaining_generations"], "UNLIMITED");

    let mut not_an_image = generation_body();
    not_an_image["image"] = json!({ "base64": PNG_BASE64, "mime_type": "application/pdf", "name": "doc.pdf" });
    let invalid = app.request("POST", "/api/v1/generations", Some(&pro), Some(not_an_image)).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_describe_media_falls_back_on_model_failure() {
    let app = TestApp::new().await;
    let image = json!({ "image": { "base64": PNG_BASE64, "mime_type": "image/png", "name": "foto.png" } });

    let basic = app.register("basic-media@example.com").await;
    let refused = app.request("POST", "/api/v1/ai/describe-media", Some(&basic), Some(image.clone())).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    let collaborator = app.user_with_role("collab-media@example.com", Role::Collaborator).await;
    let ok = parse_body(app.request("POST", "/api/v1/ai/describe-media", Some(&collaborator), Some(image.clone())).await).await;
    assert_eq!(ok["description"], common::REFINED_TEXT);

    app.llm.set_failing(true);
    let fallback = app.request("POST", "/api/v1/ai/describe-media", Some(&collaborator), Some(image)).await;
    assert_eq!(fallback.status(), StatusCode::OK);
    assert_eq!(
        parse_body(fallback).await["description"],
        "No se pudo analizar el archivo. Por favor, describe la tarea manualmente."
    );
}

#[tokio::test]
async fn test_assistant_chat_is_public_and_degrades_gracefully() {
    let app = TestApp::new().await;
    let chat = json!({
        "message": "¿Qué incluye el plan Pro?",
        "history": [
            {"role": "assistant", "content": "¡Hola! ¿En qué te ayudo?"},
            {"role": "user", "content": "Tengo dudas"},
            {"role": "model", "content": "Claro, dime."}
        ]
    });

    let ok = app.request("POST", "/api/v1/assistant/chat", None, Some(chat.clone())).await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(parse_body(ok).await["reply"], common::REFINED_TEXT);

    app.llm.set_failing(true);
    let fallback = parse_body(app.request("POST", "/api/v1/assistant/chat", None, Some(chat)).await).await;
    assert_eq!(fallback["reply"], "Lo siento, no pude procesar tu solicitud en este momento.");

    let empty = app.request("POST", "/api/v1/assistant/chat", None, Some(json!({"message": "  "}))).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}
