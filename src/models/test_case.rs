//! Test case model, steps, filters, and statistics types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::double_option;

/// Accepted values for the test case `priority` field.
pub const PRIORITIES: &[&str] = &["low", "medium", "high", "critical"];

/// Accepted values for the test case `status` field.
pub const CASE_STATUSES: &[&str] = &[
    "draft",
    "review",
    "approved",
    "in_progress",
    "passed",
    "failed",
    "blocked",
];

/// Priority assigned when a create request does not carry one.
pub const DEFAULT_PRIORITY: &str = "medium";

/// Status assigned when a create request does not carry one.
pub const DEFAULT_CASE_STATUS: &str = "draft";

/// One step of a test case. Stored as part of a JSON text blob in the
/// `steps` column and parsed back on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TestStep {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// Test case as read from the database, including display fields hydrated
/// by joins: project name plus creator and assignee usernames.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestCase {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub project_name: Option<String>,
    pub priority: String,
    pub status: String,
    pub steps: Vec<TestStep>,
    pub expected_result: Option<String>,
    pub created_by: Uuid,
    pub created_by_username: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/test-cases`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTestCaseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub steps: Option<Vec<TestStep>>,
    pub expected_result: Option<String>,
    /// Creator; when absent the sentinel system user is used.
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
}

/// Body of `PUT /api/test-cases/{id}`. Absent fields are left unchanged;
/// explicit `null` clears `description` and `expected_result`, and `null`
/// or `""` unassigns `assigned_to`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTestCaseInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub steps: Option<Vec<TestStep>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub expected_result: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub assigned_to: Option<Option<String>>,
}

/// Equality filters for listing test cases; ANDed together.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct TestCaseFilters {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
}

/// Per-project test case tally, computed on demand and never persisted.
#[derive(Debug, Serialize, ToSchema)]
pub struct TestCaseStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
}

impl TestCaseStats {
    /// Tally a set of test cases by status and by priority.
    pub fn tally(cases: &[TestCase]) -> Self {
        let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_priority: BTreeMap<String, usize> = BTreeMap::new();

        for case in cases {
            *by_status.entry(case.status.clone()).or_insert(0) += 1;
            *by_priority.entry(case.priority.clone()).or_insert(0) += 1;
        }

        TestCaseStats {
            total: cases.len(),
            by_status,
            by_priority,
        }
    }
}
