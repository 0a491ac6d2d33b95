//! User API handlers.
//!
//! Listing, detail, update, and delete require the API token; creation is
//! open so a fresh sandbox can register its first account.

use actix_web::{web, HttpResponse};

use crate::auth::RequireAuth;
use crate::db::{users as db, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::user::{CreateUserInput, UpdateUserInput};
use crate::models::{ApiResponse, User, UserResponse};
use crate::validation;

fn lookup_id(raw: &str) -> AppResult<uuid::Uuid> {
    uuid::Uuid::parse_str(raw).map_err(|_| AppError::NotFound("User".to_string()))
}

/// List all users.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "List of users"),
        (status = 401, description = "Missing or invalid API token")
    ),
    security(("api_token" = []))
)]
pub async fn list_users(_auth: RequireAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let conn = pool.connection();
    let users = db::list_users(&conn)?;

    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
}

/// Get a user by ID.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details"),
        (status = 404, description = "User not found"),
        (status = 401, description = "Missing or invalid API token")
    ),
    security(("api_token" = []))
)]
pub async fn get_user(
    _auth: RequireAuth,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    let conn = pool.connection();
    let user = db::get_user_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserResponse::from(user))))
}

/// Create a new user.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserInput,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn create_user(
    pool: web::Data<DbPool>,
    input: web::Json<CreateUserInput>,
) -> AppResult<HttpResponse> {
    validation::validate_create_user(&input)?;

    let username = input.username.as_deref().unwrap_or_default().trim().to_string();
    let email = validation::normalize_email(input.email.as_deref().unwrap_or_default());
    let password = input.password.as_deref().unwrap_or_default();

    let conn = pool.connection();

    let existing = match db::get_user_by_email(&conn, &email)? {
        Some(user) => Some(user),
        None => db::get_user_by_username(&conn, &username)?,
    };
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this email or username already exists".to_string(),
        ));
    }

    let user = User::new(&username, &email, password, input.role.as_deref())?;
    db::insert_user(&conn, &user)?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        UserResponse::from(user),
        "User created successfully",
    )))
}

/// Update a user. Absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserInput,
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already in use"),
        (status = 401, description = "Missing or invalid API token")
    ),
    security(("api_token" = []))
)]
pub async fn update_user(
    _auth: RequireAuth,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    input: web::Json<UpdateUserInput>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    validation::validate_update_user(&input)?;

    let conn = pool.connection();
    let mut user = db::get_user_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    // Check for collisions with other rows before applying the patch
    if let Some(email) = input.email.as_deref() {
        let email = validation::normalize_email(email);
        if email != user.email && db::get_user_by_email(&conn, &email)?.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        user.email = email;
    }
    if let Some(username) = input.username.as_deref() {
        let username = username.trim().to_string();
        if username != user.username && db::get_user_by_username(&conn, &username)?.is_some() {
            return Err(AppError::Conflict("Username already in use".to_string()));
        }
        user.username = username;
    }
    if let Some(role) = input.role.as_deref() {
        user.role = role.to_string();
    }
    user.updated_at = chrono::Utc::now();

    db::update_user(&conn, &user)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        UserResponse::from(user),
        "User updated successfully",
    )))
}

/// Delete a user. Owned projects and created test cases are removed by the
/// schema-level cascade; assignments elsewhere are set to null.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 401, description = "Missing or invalid API token")
    ),
    security(("api_token" = []))
)]
pub async fn delete_user(
    _auth: RequireAuth,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = lookup_id(&path)?;

    let conn = pool.connection();
    db::get_user_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    db::delete_user(&conn, id)?;

    Ok(HttpResponse::Ok().json(ApiResponse::message_only("User deleted successfully")))
}

/// Configure user routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_users))
            .route(web::post().to(create_user)),
    )
    .service(
        web::resource("/{id}")
            .route(web::get().to(get_user))
            .route(web::put().to(update_user))
            .route(web::delete().to(delete_user)),
    );
}
