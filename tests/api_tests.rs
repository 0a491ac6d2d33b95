//! HTTP-level tests exercising the full route/validation/model stack
//! against an in-memory database.

use actix_web::{test, web, App};
use serde_json::{json, Value};

use taskhub_server::api;
use taskhub_server::auth::AccessToken;
use taskhub_server::db::{migrations, DbPool};

fn test_pool() -> DbPool {
    let pool = DbPool::open_in_memory().unwrap();
    migrations::run_migrations(&pool).unwrap();
    pool
}

macro_rules! init_app {
    ($pool:expr, $token:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(AccessToken::new($token)))
                .configure(api::configure_health_routes)
                .service(web::scope("/api/users").configure(api::configure_user_routes))
                .service(web::scope("/api/projects").configure(api::configure_project_routes))
                .service(
                    web::scope("/api/test-cases").configure(api::configure_test_case_routes),
                ),
        )
        .await
    };
}

async fn post_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    uri: &str,
    body: Value,
) -> (u16, Value) {
    let req = test::TestRequest::post()
        .uri(uri)
        .set_json(body)
        .to_request();
    let res = test::call_service(app, req).await;
    let status = res.status().as_u16();
    (status, test::read_body_json(res).await)
}

async fn get_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    uri: &str,
) -> (u16, Value) {
    let req = test::TestRequest::get().uri(uri).to_request();
    let res = test::call_service(app, req).await;
    let status = res.status().as_u16();
    (status, test::read_body_json(res).await)
}

#[actix_web::test]
async fn health_reports_ok_with_timestamp() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());

    let (status, body) = get_json(&app, "/ready").await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");
}

#[actix_web::test]
async fn create_user_round_trip() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (status, body) = post_json(
        &app,
        "/api/users",
        json!({
            "username": "alice",
            "email": "Alice@Example.com",
            "password": "secret1",
            "role": "qa"
        }),
    )
    .await;

    assert_eq!(status, 201);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["data"]["username"], "alice");
    // Email is normalized on the way in
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("password_hash").is_none());

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = get_json(&app, &format!("/api/users/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["role"], "qa");
}

#[actix_web::test]
async fn duplicate_user_answers_conflict() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let input = json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "secret1"
    });
    let (status, _) = post_json(&app, "/api/users", input.clone()).await;
    assert_eq!(status, 201);

    let (status, body) = post_json(&app, "/api/users", input).await;
    assert_eq!(status, 409);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[actix_web::test]
async fn invalid_user_reports_all_violations() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (status, body) = post_json(
        &app,
        "/api/users",
        json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "123"
        }),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let errors = body["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[actix_web::test]
async fn missing_project_is_not_found_envelope() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (status, body) = get_json(
        &app,
        "/api/projects/5d3f0e83-9a50-4f5b-8f11-000000000000",
    )
    .await;

    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Project not found");
}

#[actix_web::test]
async fn ownerless_project_falls_back_to_system_user() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (status, body) = post_json(
        &app,
        "/api/projects",
        json!({"name": "Checkout", "description": "payments flow"}),
    )
    .await;

    assert_eq!(status, 201);
    assert_eq!(body["data"]["owner_username"], "system");
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["test_cases_count"], 0);
}

#[actix_web::test]
async fn test_case_requires_existing_project() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (status, body) = post_json(
        &app,
        "/api/test-cases",
        json!({
            "title": "Login works",
            "project_id": "5d3f0e83-9a50-4f5b-8f11-000000000000"
        }),
    )
    .await;

    assert_eq!(status, 404);
    assert_eq!(body["error"], "Project not found");
}

#[actix_web::test]
async fn test_case_missing_project_id_is_a_violation() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (status, body) = post_json(&app, "/api/test-cases", json!({"title": "Login works"})).await;

    assert_eq!(status, 400);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == "project_id"));
}

#[actix_web::test]
async fn test_case_lifecycle_and_stats() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (_, project) = post_json(&app, "/api/projects", json!({"name": "Login"})).await;
    let project_id = project["data"]["id"].as_str().unwrap().to_string();

    let (_, assignee) = post_json(
        &app,
        "/api/users",
        json!({"username": "tester", "email": "tester@example.com", "password": "secret1"}),
    )
    .await;
    let assignee_id = assignee["data"]["id"].as_str().unwrap().to_string();

    // Two drafts (high, low) and one passed (low)
    let (status, created) = post_json(
        &app,
        "/api/test-cases",
        json!({
            "title": "Login form renders",
            "project_id": project_id,
            "priority": "high",
            "assigned_to": assignee_id,
            "steps": [{"step": "Open login page", "expected": "Form shown"}]
        }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["data"]["project_name"], "Login");
    assert_eq!(created["data"]["assigned_to_username"], "tester");
    assert_eq!(
        created["data"]["steps"],
        json!([{"step": "Open login page", "expected": "Form shown"}])
    );
    let case_id = created["data"]["id"].as_str().unwrap().to_string();

    for (priority, case_status) in [("low", "draft"), ("low", "passed")] {
        let (status, _) = post_json(
            &app,
            "/api/test-cases",
            json!({
                "title": "More coverage",
                "project_id": project_id,
                "priority": priority,
                "status": case_status
            }),
        )
        .await;
        assert_eq!(status, 201);
    }

    let (status, stats) = get_json(
        &app,
        &format!("/api/test-cases/project/{}/stats", project_id),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(stats["data"]["total"], 3);
    assert_eq!(stats["data"]["by_status"]["draft"], 2);
    assert_eq!(stats["data"]["by_status"]["passed"], 1);
    assert_eq!(stats["data"]["by_priority"]["high"], 1);
    assert_eq!(stats["data"]["by_priority"]["low"], 2);

    // Conjunctive filters
    let (_, filtered) = get_json(
        &app,
        &format!(
            "/api/test-cases?project_id={}&status=draft&priority=high",
            project_id
        ),
    )
    .await;
    assert_eq!(filtered["data"].as_array().unwrap().len(), 1);

    // Explicit null unassigns; omitted fields stay untouched
    let req = test::TestRequest::put()
        .uri(&format!("/api/test-cases/{}", case_id))
        .set_json(json!({"assigned_to": null, "status": "approved"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 200);
    let updated: Value = test::read_body_json(res).await;
    assert_eq!(updated["data"]["assigned_to"], Value::Null);
    assert_eq!(updated["data"]["status"], "approved");
    assert_eq!(updated["data"]["title"], "Login form renders");

    // Delete and confirm 404
    let req = test::TestRequest::delete()
        .uri(&format!("/api/test-cases/{}", case_id))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 200);

    let (status, _) = get_json(&app, &format!("/api/test-cases/{}", case_id)).await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn user_routes_are_gated_when_token_configured() {
    let pool = test_pool();
    let app = init_app!(pool, Some("tk_sandbox".to_string()));

    // Creation stays open
    let (status, body) = post_json(
        &app,
        "/api/users",
        json!({"username": "alice", "email": "alice@example.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, 201);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Listing without the header is rejected with the envelope
    let (status, body) = get_json(&app, "/api/users").await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);

    // Wrong token is rejected too
    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(("X-API-Key", "tk_wrong"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 401);

    // Correct token goes through
    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", id))
        .insert_header(("X-API-Key", "tk_sandbox"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 200);
}

#[actix_web::test]
async fn update_user_detects_conflicts() {
    let pool = test_pool();
    let app = init_app!(pool, None);

    let (_, first) = post_json(
        &app,
        "/api/users",
        json!({"username": "alice", "email": "alice@example.com", "password": "secret1"}),
    )
    .await;
    let (_, second) = post_json(
        &app,
        "/api/users",
        json!({"username": "bob", "email": "bob@example.com", "password": "secret1"}),
    )
    .await;
    let bob_id = second["data"]["id"].as_str().unwrap().to_string();
    let alice_email = first["data"]["email"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{}", bob_id))
        .set_json(json!({"email": alice_email}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 409);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "Email already in use");
}
