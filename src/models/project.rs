//! Project model and request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::double_option;

/// Accepted values for the project `status` field.
pub const PROJECT_STATUSES: &[&str] = &["active", "archived", "completed"];

/// Status assigned when a create request does not carry one.
pub const DEFAULT_PROJECT_STATUS: &str = "active";

/// Project as read from the database, including display fields hydrated
/// by joins: `owner_username` and the computed `test_cases_count`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub owner_username: Option<String>,
    pub status: String,
    pub test_cases_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/projects`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Explicit owner; when absent the sentinel system user is used.
    pub owner_id: Option<Uuid>,
}

/// Body of `PUT /api/projects/{id}`. Absent fields are left unchanged;
/// an explicit `null` description clears it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}
