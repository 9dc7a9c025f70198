mod common;

use axum::http::StatusCode;
use common::{parse_body, AuthHeaders, TestApp};
use guide_backend::domain::models::user::Role;
use serde_json::json;

async fn pending_guide(app: &TestApp, collab: &AuthHeaders, title: &str) -> String {
    let response = app.request("POST", "/api/v1/guides", Some(collab), Some(json!({
        "title": title,
        "priority": "LOW",
        "category": "OTHER",
        "steps": [{"title": "Único paso", "description": "Hazlo con cuidado."}]
    }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_body(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_moderation_routes_are_admin_only() {
    let app = TestApp::new().await;
    let collab = app.user_with_role("collab@example.com", Role::Collaborator).await;
    let id = pending_guide(&app, &collab, "Intento").await;

    let queue = app.request("GET", "/api/v1/admin/guides", Some(&collab), None).await;
    assert_eq!(queue.status(), StatusCode::FORBIDDEN);

    let approve = app.request("POST", &format!("/api/v1/admin/guides/{}/approve", id), Some(&collab), None).await;
    assert_eq!(approve.status(), StatusCode::FORBIDDEN);

    let anonymous = app.request("GET", "/api/v1/admin/guides/stats", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_queue_and_stats_follow_decisions() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let collab = app.user_with_role("queue@example.com", Role::Collaborator).await;

    let first = pending_guide(&app, &collab, "Primera").await;
    let second = pending_guide(&app, &collab, "Segunda").await;
    pending_guide(&app, &collab, "Tercera").await;

    let queue = parse_body(app.request("GET", "/api/v1/admin/guides", Some(&admin), None).await).await;
    assert_eq!(queue.as_array().unwrap().len(), 3);

    app.request("POST", &format!("/api/v1/admin/guides/{}/approve", first), Some(&admin), None).await;
    let rejected = app.request(
        "POST",
        &format!("/api/v1/admin/guides/{}/reject", second),
        Some(&admin),
        Some(json!({"feedback": "  Faltan advertencias de seguridad. "})),
    ).await;
    assert_eq!(rejected.status(), StatusCode::OK);
    let body = parse_body(rejected).await;
    assert_eq!(body["status"], "REJECTED");
    assert_eq!(body["moderator_feedback"], "Faltan advertencias de seguridad.");

    let stats = parse_body(app.request("GET", "/api/v1/admin/guides/stats", Some(&admin), None).await).await;
    assert_eq!(stats, json!({"pending": 1, "approved": 1, "rejected": 1}));

    let rejected_queue = parse_body(app.request("GET", "/api/v1/admin/guides?status=REJECTED", Some(&admin), None).await).await;
    assert_eq!(rejected_queue.as_array().unwrap().len(), 1);
    assert_eq!(rejected_queue[0]["id"], second);

    // The author sees the rejection reason on their own list.
    let mine = parse_body(app.request("GET", "/api/v1/guides/mine", Some(&collab), None).await).await;
    let reviewed = mine.as_array().unwrap().iter().find(|g| g["id"] == second).unwrap();
    assert_eq!(reviewed["moderator_feedback"], "Faltan advertencias de seguridad.");
}

#[tokio::test]
async fn test_rejection_requires_feedback_and_approval_clears_it() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let collab = app.user_with_role("feedback@example.com", Role::Collaborator).await;
    let id = pending_guide(&app, &collab, "Revisar").await;

    let blank = app.request("POST", &format!("/api/v1/admin/guides/{}/reject", id), Some(&admin), Some(json!({"feedback": "   "}))).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(blank).await["error"], "El comentario de rechazo es obligatorio.");

    let missing = app.request("POST", &format!("/api/v1/admin/guides/{}/reject", id), Some(&admin), Some(json!({}))).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    app.request("POST", &format!("/api/v1/admin/guides/{}/reject", id), Some(&admin), Some(json!({"feedback": "Mejorar fotos"}))).await;
    let approved = parse_body(app.request("POST", &format!("/api/v1/admin/guides/{}/approve", id), Some(&admin), None).await).await;
    assert_eq!(approved["status"], "APPROVED");
    assert!(approved["moderator_feedback"].is_null());

    let unknown = app.request("POST", "/api/v1/admin/guides/nope/approve", Some(&admin), None).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_a_guide_removes_history_copies() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let user = app.register("history-owner@example.com").await;

    let generated = parse_body(app.request("POST", "/api/v1/generations", Some(&user), Some(json!({
        "description": "Desatascar el fregadero de la cocina"
    }))).await).await;
    let guide_id = generated["guide"]["id"].as_str().unwrap().to_string();

    let deleted = app.request("DELETE", &format!("/api/v1/admin/guides/{}", guide_id), Some(&admin), None).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app.request("GET", &format!("/api/v1/guides/{}", guide_id), None, None).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let history = parse_body(app.request("GET", "/api/v1/history", Some(&user), None).await).await;
    assert!(history.as_array().unwrap().is_empty());

    let again = app.request("DELETE", &format!("/api/v1/admin/guides/{}", guide_id), Some(&admin), None).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}
