//! Test case API handlers.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::db::{projects, test_cases as db, users, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::test_case::{
    CreateTestCaseInput, TestCaseFilters, UpdateTestCaseInput, DEFAULT_CASE_STATUS,
    DEFAULT_PRIORITY,
};
use crate::models::{ApiResponse, TestCase, TestCaseStats};
use crate::validation;

fn lookup_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Test case".to_string()))
}

/// List test cases, optionally filtered. Query filters are equality-only
/// and are passed through to the query layer unmodified.
#[utoipa::path(
    get,
    path = "/api/test-cases",
    tag = "Test Cases",
    params(
        ("project_id" = Option<String>, Query, description = "Filter by project"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("priority" = Option<String>, Query, description = "Filter by priority"),
        ("assigned_to" = Option<String>, Query, description = "Filter by assignee")
    ),
    responses((status = 200, description = "List of test cases"))
)]
pub async fn list_test_cases(
    pool: web::Data<DbPool>,
    query: web::Query<TestCaseFilters>,
) -> AppResult<HttpResponse> {
    let conn = pool.connection();
    let cases = db::list_test_cases(&conn, &query)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(cases)))
}

/// Get a test case by ID.
#[utoipa::path(
    get,
    path = "/api/test-cases/{id}",
    tag = "Test Cases",
    params(("id" = String, Path, description = "Test case ID")),
    responses(
        (status = 200, description = "Test case details"),
        (status = 404, description = "Test case not found")
    )
)]
pub async fn get_test_case(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    let conn = pool.connection();
    let case = db::get_test_case_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("Test case".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(case)))
}

/// List the test cases of one project.
#[utoipa::path(
    get,
    path = "/api/test-cases/project/{project_id}",
    tag = "Test Cases",
    params(("project_id" = String, Path, description = "Project ID")),
    responses((status = 200, description = "Test cases in the project"))
)]
pub async fn list_by_project(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let conn = pool.connection();
    let cases = match Uuid::parse_str(&path) {
        Ok(project_id) => db::list_test_cases_by_project(&conn, project_id)?,
        Err(_) => Vec::new(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(cases)))
}

/// List the test cases assigned to a user, highest priority first.
#[utoipa::path(
    get,
    path = "/api/test-cases/assigned/{user_id}",
    tag = "Test Cases",
    params(("user_id" = String, Path, description = "Assignee user ID")),
    responses((status = 200, description = "Test cases assigned to the user"))
)]
pub async fn list_by_assignee(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let conn = pool.connection();
    let cases = match Uuid::parse_str(&path) {
        Ok(user_id) => db::list_test_cases_by_assignee(&conn, user_id)?,
        Err(_) => Vec::new(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(cases)))
}

/// Tally a project's test cases by status and by priority.
#[utoipa::path(
    get,
    path = "/api/test-cases/project/{project_id}/stats",
    tag = "Test Cases",
    params(("project_id" = String, Path, description = "Project ID")),
    responses((status = 200, description = "Test case statistics", body = TestCaseStats))
)]
pub async fn project_stats(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let conn = pool.connection();
    let cases = match Uuid::parse_str(&path) {
        Ok(project_id) => db::list_test_cases_by_project(&conn, project_id)?,
        Err(_) => Vec::new(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(TestCaseStats::tally(&cases))))
}

/// Create a new test case. The referenced project must exist; the creator
/// defaults to the sentinel system user when not supplied.
#[utoipa::path(
    post,
    path = "/api/test-cases",
    tag = "Test Cases",
    request_body = CreateTestCaseInput,
    responses(
        (status = 201, description = "Test case created"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn create_test_case(
    pool: web::Data<DbPool>,
    input: web::Json<CreateTestCaseInput>,
) -> AppResult<HttpResponse> {
    validation::validate_create_test_case(&input)?;

    // Validated as a well-formed UUID above
    let project_id = input
        .project_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

    let conn = pool.connection();
    projects::get_project_by_id(&conn, project_id)?
        .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

    let created_by = match input.created_by.as_deref() {
        Some(raw) => Uuid::parse_str(raw)
            .map_err(|_| AppError::NotFound("User".to_string()))?,
        None => users::find_or_create_system_user(&conn)?.id,
    };

    let assigned_to = input
        .assigned_to
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok());

    let now = Utc::now();
    let case = TestCase {
        id: Uuid::new_v4(),
        title: input.title.as_deref().unwrap_or_default().trim().to_string(),
        description: input.description.clone(),
        project_id,
        project_name: None,
        priority: input
            .priority
            .clone()
            .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
        status: input
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_CASE_STATUS.to_string()),
        steps: input.steps.clone().unwrap_or_default(),
        expected_result: input.expected_result.clone(),
        created_by,
        created_by_username: None,
        assigned_to,
        assigned_to_username: None,
        created_at: now,
        updated_at: now,
    };
    db::insert_test_case(&conn, &case)?;

    let created = db::get_test_case_by_id(&conn, case.id)?.ok_or_else(|| {
        AppError::Database("Failed to fetch newly created test case".to_string())
    })?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        created,
        "Test case created successfully",
    )))
}

/// Update a test case. Absent fields are left unchanged; explicit null
/// clears `description` and `expected_result`, and null or `""` unassigns
/// `assigned_to`.
#[utoipa::path(
    put,
    path = "/api/test-cases/{id}",
    tag = "Test Cases",
    params(("id" = String, Path, description = "Test case ID")),
    request_body = UpdateTestCaseInput,
    responses(
        (status = 200, description = "Test case updated"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Test case not found")
    )
)]
pub async fn update_test_case(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    input: web::Json<UpdateTestCaseInput>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    validation::validate_update_test_case(&input)?;

    let conn = pool.connection();
    let mut case = db::get_test_case_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("Test case".to_string()))?;

    if let Some(title) = input.title.as_deref() {
        case.title = title.trim().to_string();
    }
    if let Some(description) = &input.description {
        case.description = description.clone();
    }
    if let Some(priority) = input.priority.as_deref() {
        case.priority = priority.to_string();
    }
    if let Some(status) = input.status.as_deref() {
        case.status = status.to_string();
    }
    if let Some(steps) = &input.steps {
        case.steps = steps.clone();
    }
    if let Some(expected_result) = &input.expected_result {
        case.expected_result = expected_result.clone();
    }
    if let Some(assigned_to) = &input.assigned_to {
        // Validated as a UUID, null, or "" (unassign) above
        case.assigned_to = assigned_to
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| Uuid::parse_str(raw).ok());
    }
    case.updated_at = Utc::now();

    db::update_test_case(&conn, &case)?;

    let updated = db::get_test_case_by_id(&conn, id)?
        .ok_or_else(|| AppError::Database("Failed to fetch updated test case".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        updated,
        "Test case updated successfully",
    )))
}

/// Delete a test case.
#[utoipa::path(
    delete,
    path = "/api/test-cases/{id}",
    tag = "Test Cases",
    params(("id" = String, Path, description = "Test case ID")),
    responses(
        (status = 200, description = "Test case deleted"),
        (status = 404, description = "Test case not found")
    )
)]
pub async fn delete_test_case(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    let conn = pool.connection();
    db::get_test_case_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("Test case".to_string()))?;

    db::delete_test_case(&conn, id)?;

    Ok(HttpResponse::Ok().json(ApiResponse::message_only("Test case deleted successfully")))
}

/// Configure test case routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_test_cases))
            .route(web::post().to(create_test_case)),
    )
    .service(
        web::resource("/project/{project_id}/stats").route(web::get().to(project_stats)),
    )
    .service(web::resource("/project/{project_id}").route(web::get().to(list_by_project)))
    .service(web::resource("/assigned/{user_id}").route(web::get().to(list_by_assignee)))
    .service(
        web::resource("/{id}")
            .route(web::get().to(get_test_case))
            .route(web::put().to(update_test_case))
            .route(web::delete().to(delete_test_case)),
    );
}
