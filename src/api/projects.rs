//! Project API handlers.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::db::{projects as db, users, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::project::{CreateProjectInput, UpdateProjectInput, DEFAULT_PROJECT_STATUS};
use crate::models::{ApiResponse, Project};
use crate::validation;

fn lookup_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Project".to_string()))
}

/// List all projects with test case counts.
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    responses((status = 200, description = "List of projects"))
)]
pub async fn list_projects(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let conn = pool.connection();
    let projects = db::list_projects(&conn)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(projects)))
}

/// Get a project by ID.
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project details"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    let conn = pool.connection();
    let project = db::get_project_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(project)))
}

/// List the projects owned by a user.
#[utoipa::path(
    get,
    path = "/api/projects/owner/{owner_id}",
    tag = "Projects",
    params(("owner_id" = String, Path, description = "Owner user ID")),
    responses((status = 200, description = "Projects owned by the user"))
)]
pub async fn list_projects_by_owner(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let conn = pool.connection();
    let projects = match Uuid::parse_str(&path) {
        Ok(owner_id) => db::list_projects_by_owner(&conn, owner_id)?,
        Err(_) => Vec::new(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(projects)))
}

/// Create a new project. When no owner is supplied the sentinel system
/// user is used; if that account cannot be resolved the project is stored
/// without an owner.
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = CreateProjectInput,
    responses(
        (status = 201, description = "Project created"),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_project(
    pool: web::Data<DbPool>,
    input: web::Json<CreateProjectInput>,
) -> AppResult<HttpResponse> {
    validation::validate_create_project(&input)?;

    let conn = pool.connection();

    let owner_id = match input.owner_id {
        Some(owner_id) => Some(owner_id),
        None => match users::find_or_create_system_user(&conn) {
            Ok(system) => Some(system.id),
            Err(e) => {
                warn!("Could not resolve system user, creating ownerless project: {}", e);
                None
            }
        },
    };

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        name: input.name.as_deref().unwrap_or_default().trim().to_string(),
        description: input.description.clone(),
        owner_id,
        owner_username: None,
        status: DEFAULT_PROJECT_STATUS.to_string(),
        test_cases_count: 0,
        created_at: now,
        updated_at: now,
    };
    db::insert_project(&conn, &project)?;

    let created = db::get_project_by_id(&conn, project.id)?.ok_or_else(|| {
        AppError::Database("Failed to fetch newly created project".to_string())
    })?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        created,
        "Project created successfully",
    )))
}

/// Update a project. Absent fields are left unchanged; an explicit null
/// description clears it.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ID")),
    request_body = UpdateProjectInput,
    responses(
        (status = 200, description = "Project updated"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn update_project(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    input: web::Json<UpdateProjectInput>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    validation::validate_update_project(&input)?;

    let conn = pool.connection();
    let mut project = db::get_project_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

    if let Some(name) = input.name.as_deref() {
        project.name = name.trim().to_string();
    }
    if let Some(description) = &input.description {
        project.description = description.clone();
    }
    if let Some(status) = input.status.as_deref() {
        project.status = status.to_string();
    }
    project.updated_at = Utc::now();

    db::update_project(&conn, &project)?;

    let updated = db::get_project_by_id(&conn, id)?
        .ok_or_else(|| AppError::Database("Failed to fetch updated project".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        updated,
        "Project updated successfully",
    )))
}

/// Delete a project. Its test cases are removed by the schema-level cascade.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn delete_project(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    let conn = pool.connection();
    db::get_project_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

    db::delete_project(&conn, id)?;

    Ok(HttpResponse::Ok().json(ApiResponse::message_only("Project deleted successfully")))
}

/// Configure project routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_projects))
            .route(web::post().to(create_project)),
    )
    .service(web::resource("/owner/{owner_id}").route(web::get().to(list_projects_by_owner)))
    .service(
        web::resource("/{id}")
            .route(web::get().to(get_project))
            .route(web::put().to(update_project))
            .route(web::delete().to(delete_project)),
    );
}
