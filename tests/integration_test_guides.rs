mod common;

use axum::http::StatusCode;
use common::{parse_body, AuthHeaders, TestApp, REFINED_TEXT};
use guide_backend::domain::models::user::{Quota, Role};
use serde_json::{json, Value};

fn draft(title: &str, category: &str) -> Value {
    json!({
        "title": title,
        "priority": "MEDIUM",
        "category": category,
        "safety_warnings": ["Usa guantes"],
        "tools": ["Llave inglesa"],
        "steps": [
            {"title": "Preparar", "description": "Cierra la llave de paso."},
            {"title": "Cambiar", "description": "Sustituye la junta.", "video_url": "https://video.example.com/junta"}
        ],
        "resources": [{"title": "Manual", "url": "https://example.com/manual"}]
    })
}

async fn contribute(app: &TestApp, auth: &AuthHeaders, title: &str, category: &str) -> Value {
    let response = app.request("POST", "/api/v1/guides", Some(auth), Some(draft(title, category))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_body(response).await
}

async fn approve(app: &TestApp, admin: &AuthHeaders, guide_id: &str) {
    let response = app.request("POST", &format!("/api/v1/admin/guides/{}/approve", guide_id), Some(admin), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_collaborator_contribution_waits_for_review() {
    let app = TestApp::new().await;
    let collab = app.user_with_role("collab@example.com", Role::Collaborator).await;

    let guide = contribute(&app, &collab, "Cambiar la junta del grifo", "HOME").await;
    assert_eq!(guide["status"], "PENDING");
    assert_eq!(guide["author"], "COLLABORATOR");
    assert_eq!(guide["author_email"], "collab@example.com");
    assert_eq!(guide["steps"][1]["step_number"], 2);
    assert_eq!(guide["steps"][1]["video_url"], "https://video.example.com/junta");

    let catalog = parse_body(app.request("GET", "/api/v1/guides", None, None).await).await;
    assert!(catalog.as_array().unwrap().is_empty());

    let mine = parse_body(app.request("GET", "/api/v1/guides/mine", Some(&collab), None).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["id"], guide["id"]);
}

#[tokio::test]
async fn test_contribution_is_refused_for_basic_users_and_bad_links() {
    let app = TestApp::new().await;
    let basic = app.register("basic@example.com").await;

    let refused = app.request("POST", "/api/v1/guides", Some(&basic), Some(draft("Algo", "HOME"))).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    let collab = app.user_with_role("links@example.com", Role::Collaborator).await;
    let mut bad = draft("Enlace roto", "CRAFTS");
    bad["resources"] = json!([{"title": "Roto", "url": "esto no es una url"}]);
    let invalid = app.request("POST", "/api/v1/guides", Some(&collab), Some(bad)).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(invalid).await["error"], "Por favor, introduce una URL válida.");

    let mut no_steps = draft("Sin pasos", "CRAFTS");
    no_steps["steps"] = json!([]);
    let empty = app.request("POST", "/api/v1/guides", Some(&collab), Some(no_steps)).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unapproved_guides_are_visible_to_author_and_admins_only() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let collab = app.user_with_role("author@example.com", Role::Collaborator).await;
    let stranger = app.register("stranger@example.com").await;

    let guide = contribute(&app, &collab, "Reparar persiana", "HOME").await;
    let uri = format!("/api/v1/guides/{}", guide["id"].as_str().unwrap());

    assert_eq!(app.request("GET", &uri, None, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.request("GET", &uri, Some(&stranger), None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.request("GET", &uri, Some(&collab), None).await.status(), StatusCode::OK);
    assert_eq!(app.request("GET", &uri, Some(&admin), None).await.status(), StatusCode::OK);

    approve(&app, &admin, guide["id"].as_str().unwrap()).await;
    assert_eq!(app.request("GET", &uri, None, None).await.status(), StatusCode::OK);

    let missing = app.request("GET", "/api/v1/guides/no-such-guide", None, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_listing_filters_by_category_and_title() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let collab = app.user_with_role("filters@example.com", Role::Collaborator).await;

    for (title, category) in [
        ("Cambiar aceite del coche", "AUTOMOTIVE"),
        ("Cambiar enchufe", "HOME"),
        ("Formatear portátil", "TECHNOLOGY"),
    ] {
        let guide = contribute(&app, &collab, title, category).await;
        approve(&app, &admin, guide["id"].as_str().unwrap()).await;
    }

    let all = parse_body(app.request("GET", "/api/v1/guides", None, None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let home = parse_body(app.request("GET", "/api/v1/guides?category=HOME", None, None).await).await;
    assert_eq!(home.as_array().unwrap().len(), 1);
    assert_eq!(home[0]["title"], "Cambiar enchufe");

    let search = parse_body(app.request("GET", "/api/v1/guides?q=cambiar", None, None).await).await;
    assert_eq!(search.as_array().unwrap().len(), 2);

    let both = parse_body(app.request("GET", "/api/v1/guides?category=AUTOMOTIVE&q=ACEITE", None, None).await).await;
    assert_eq!(both.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_refine_step_updates_guide_and_history_copy() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let stranger = app.register("other@example.com").await;

    let generated = parse_body(app.request("POST", "/api/v1/generations", Some(&owner), Some(json!({
        "description": "La bombilla del salón parpadea"
    }))).await).await;
    let guide_id = generated["guide"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/guides/{}/steps/1/refine", guide_id);

    let forbidden = app.request("POST", &uri, Some(&stranger), None).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let refined = app.request("POST", &uri, Some(&owner), None).await;
    assert_eq!(refined.status(), StatusCode::OK);
    let body = parse_body(refined).await;
    assert_eq!(body["steps"][0]["description"], REFINED_TEXT);
    assert_eq!(body["steps"][1]["description"], "Desenrosca la bombilla y coloca la nueva.");

    let history = parse_body(app.request("GET", "/api/v1/history", Some(&owner), None).await).await;
    assert_eq!(history[0]["guide"]["steps"][0]["description"], REFINED_TEXT);

    let public = parse_body(app.request("GET", &format!("/api/v1/guides/{}", guide_id), None, None).await).await;
    assert_eq!(public["steps"][0]["description"], REFINED_TEXT);

    let missing_step = app.request("POST", &format!("/api/v1/guides/{}/steps/9/refine", guide_id), Some(&owner), None).await;
    assert_eq!(missing_step.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refine_step_reports_model_failure() {
    let app = TestApp::new().await;
    let owner = app.register("refine-fail@example.com").await;

    let generated = parse_body(app.request("POST", "/api/v1/generations", Some(&owner), Some(json!({
        "description": "El grifo de la cocina gotea"
    }))).await).await;
    let guide_id = generated["guide"]["id"].as_str().unwrap().to_string();

    app.llm.set_failing(true);
    let response = app.request("POST", &format!("/api/v1/guides/{}/steps/2/refine", guide_id), Some(&owner), None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let guide = parse_body(app.request("GET", &format!("/api/v1/guides/{}", guide_id), None, None).await).await;
    assert_eq!(guide["steps"][1]["description"], "Desenrosca la bombilla y coloca la nueva.");
}

#[tokio::test]
async fn test_top_contributors_count_approved_guides() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ana = app.user_with_role("ana@example.com", Role::Collaborator).await;
    let bea = app.user_with_role("bea@example.com", Role::Collaborator).await;

    for title in ["Guía uno", "Guía dos"] {
        let guide = contribute(&app, &bea, title, "CRAFTS").await;
        approve(&app, &admin, guide["id"].as_str().unwrap()).await;
    }
    let guide = contribute(&app, &ana, "Guía tres", "CRAFTS").await;
    approve(&app, &admin, guide["id"].as_str().unwrap()).await;
    contribute(&app, &ana, "Pendiente", "CRAFTS").await;

    let ranking = parse_body(app.request("GET", "/api/v1/contributors/top", None, None).await).await;
    assert_eq!(ranking, json!([
        {"email": "bea@example.com", "count": 2},
        {"email": "ana@example.com", "count": 1}
    ]));
}

#[tokio::test]
async fn test_contribution_rights_follow_the_stored_role() {
    let app = TestApp::new().await;
    let auth = app.register("shifting@example.com").await;
    let user = app.state.user_repo.find_by_email("shifting@example.com").await.unwrap().unwrap();

    // Same access token throughout; only the stored role changes.
    app.state.user_repo.update_plan(&user.id, Role::Collaborator, Quota::Unlimited).await.unwrap();
    contribute(&app, &auth, "Purgar un radiador", "HOME").await;

    app.state.user_repo.update_plan(&user.id, Role::Basic, Quota::Limited(3)).await.unwrap();
    let refused = app.request("POST", "/api/v1/guides", Some(&auth), Some(draft("Desatascar el fregadero", "HOME"))).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(parse_body(refused).await["error"], "Solo los colaboradores pueden aportar guías.");
}
