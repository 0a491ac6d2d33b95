//! Data models and shared API types.

pub mod project;
pub mod test_case;
pub mod user;

pub use project::{Project, PROJECT_STATUSES};
pub use test_case::{TestCase, TestCaseStats, TestStep, CASE_STATUSES, PRIORITIES};
pub use user::{User, UserResponse, USER_ROLES};

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// A single violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Name of the offending input field.
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Uniform response envelope returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying data.
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
            message: None,
        }
    }

    /// Successful response carrying data and a status message.
    pub fn ok_with_message(data: T, message: &str) -> Self {
        ApiResponse {
            message: Some(message.to_string()),
            ..ApiResponse::ok(data)
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Successful response with only a status message (e.g. after a delete).
    pub fn message_only(message: &str) -> Self {
        ApiResponse {
            success: true,
            data: None,
            error: None,
            errors: None,
            message: Some(message.to_string()),
        }
    }

    /// Failure response with a single error message.
    pub fn failure(error: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error.to_string()),
            errors: None,
            message: None,
        }
    }

    /// Failure response carrying the full list of validation violations.
    pub fn invalid(errors: Vec<FieldError>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: None,
            errors: Some(errors),
            message: None,
        }
    }
}

/// Deserializer for patch fields that must distinguish "absent" from
/// explicit `null`: an absent field stays `None` (via `#[serde(default)]`),
/// `null` becomes `Some(None)`, and a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
