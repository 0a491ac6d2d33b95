//! User model and request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Accepted values for the `role` field.
pub const USER_ROLES: &[&str] = &["user", "admin", "qa"];

/// Role assigned when a create request does not carry one.
pub const DEFAULT_ROLE: &str = "user";

/// User stored in the database. The password hash never leaves the model
/// layer; responses go through [`UserResponse`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new user record, hashing the plaintext password.
    pub fn new(username: &str, email: &str, password: &str, role: Option<&str>) -> AppResult<Self> {
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Database(format!("Failed to hash password: {}", e)))?;
        let now = Utc::now();

        Ok(User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: role.unwrap_or(DEFAULT_ROLE).to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Check a candidate password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}

/// User representation returned to clients (no password hash).
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Body of `POST /api/users`. Every field is optional at the type level so
/// missing required fields surface as itemized validation errors rather
/// than deserialization failures.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Body of `PUT /api/users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}
