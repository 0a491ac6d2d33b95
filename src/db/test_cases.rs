//! Database queries for test cases.
//!
//! Reads hydrate `project_name`, `created_by_username`, and
//! `assigned_to_username` via joins. The `steps` column holds a JSON text
//! blob that is parsed back into a structured list on every read.

use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::test_case::TestCaseFilters;
use crate::models::{TestCase, TestStep};

use super::parse_timestamp;

const CASE_SELECT: &str = "SELECT tc.id, tc.title, tc.description, tc.project_id, tc.priority,
            tc.status, tc.steps, tc.expected_result, tc.created_by, tc.assigned_to,
            tc.created_at, tc.updated_at,
            u1.username AS created_by_username,
            u2.username AS assigned_to_username,
            p.name AS project_name
     FROM test_cases tc
     LEFT JOIN users u1 ON tc.created_by = u1.id
     LEFT JOIN users u2 ON tc.assigned_to = u2.id
     LEFT JOIN projects p ON tc.project_id = p.id";

struct TestCaseRow {
    id: String,
    title: String,
    description: Option<String>,
    project_id: String,
    priority: String,
    status: String,
    steps: Option<String>,
    expected_result: Option<String>,
    created_by: String,
    assigned_to: Option<String>,
    created_at: String,
    updated_at: String,
    created_by_username: Option<String>,
    assigned_to_username: Option<String>,
    project_name: Option<String>,
}

fn read_case_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestCaseRow> {
    Ok(TestCaseRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        project_id: row.get(3)?,
        priority: row.get(4)?,
        status: row.get(5)?,
        steps: row.get(6)?,
        expected_result: row.get(7)?,
        created_by: row.get(8)?,
        assigned_to: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        created_by_username: row.get(12)?,
        assigned_to_username: row.get(13)?,
        project_name: row.get(14)?,
    })
}

fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| AppError::Database(format!("Invalid {} '{}': {}", what, raw, e)))
}

fn row_to_test_case(row: TestCaseRow) -> AppResult<TestCase> {
    let steps: Vec<TestStep> = match row.steps.as_deref() {
        Some(blob) if !blob.is_empty() => serde_json::from_str(blob)
            .map_err(|e| AppError::Database(format!("Invalid steps blob: {}", e)))?,
        _ => Vec::new(),
    };

    let assigned_to = match row.assigned_to {
        Some(raw) => Some(parse_id(&raw, "assignee id")?),
        None => None,
    };

    Ok(TestCase {
        id: parse_id(&row.id, "test case id")?,
        title: row.title,
        description: row.description,
        project_id: parse_id(&row.project_id, "project id")?,
        project_name: row.project_name,
        priority: row.priority,
        status: row.status,
        steps,
        expected_result: row.expected_result,
        created_by: parse_id(&row.created_by, "creator id")?,
        created_by_username: row.created_by_username,
        assigned_to,
        assigned_to_username: row.assigned_to_username,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

/// Insert a new test case. Steps are serialized to the JSON text blob; an
/// empty list serializes as `[]`.
pub fn insert_test_case(conn: &Connection, case: &TestCase) -> AppResult<()> {
    let steps_blob = serde_json::to_string(&case.steps)?;

    conn.execute(
        "INSERT INTO test_cases (id, title, description, project_id, priority, status, steps,
                                 expected_result, created_by, assigned_to, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            case.id.to_string(),
            case.title.as_str(),
            case.description.as_deref(),
            case.project_id.to_string(),
            case.priority.as_str(),
            case.status.as_str(),
            steps_blob,
            case.expected_result.as_deref(),
            case.created_by.to_string(),
            case.assigned_to.map(|id| id.to_string()),
            case.created_at.to_rfc3339(),
            case.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to insert test case: {}", e)))?;

    Ok(())
}

/// Get a test case by ID with hydrated display fields.
pub fn get_test_case_by_id(conn: &Connection, id: Uuid) -> AppResult<Option<TestCase>> {
    let sql = format!("{} WHERE tc.id = ?1", CASE_SELECT);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let result = stmt.query_row(params![id.to_string()], read_case_row);

    match result {
        Ok(row) => Ok(Some(row_to_test_case(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}

/// List test cases matching the given equality filters, newest first.
/// Filters are ANDed together; an empty filter set lists everything.
pub fn list_test_cases(conn: &Connection, filters: &TestCaseFilters) -> AppResult<Vec<TestCase>> {
    let mut sql = format!("{} WHERE 1=1", CASE_SELECT);
    let mut values: Vec<String> = Vec::new();

    if let Some(project_id) = filters.project_id.as_deref() {
        values.push(project_id.to_string());
        sql.push_str(&format!(" AND tc.project_id = ?{}", values.len()));
    }
    if let Some(status) = filters.status.as_deref() {
        values.push(status.to_string());
        sql.push_str(&format!(" AND tc.status = ?{}", values.len()));
    }
    if let Some(priority) = filters.priority.as_deref() {
        values.push(priority.to_string());
        sql.push_str(&format!(" AND tc.priority = ?{}", values.len()));
    }
    if let Some(assigned_to) = filters.assigned_to.as_deref() {
        values.push(assigned_to.to_string());
        sql.push_str(&format!(" AND tc.assigned_to = ?{}", values.len()));
    }

    sql.push_str(" ORDER BY tc.created_at DESC");

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = stmt
        .query_map(params_from_iter(values.iter()), read_case_row)
        .map_err(|e| AppError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))?;

    rows.into_iter().map(row_to_test_case).collect()
}

/// List the test cases of one project, newest first.
pub fn list_test_cases_by_project(conn: &Connection, project_id: Uuid) -> AppResult<Vec<TestCase>> {
    let sql = format!(
        "{} WHERE tc.project_id = ?1 ORDER BY tc.created_at DESC",
        CASE_SELECT
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = stmt
        .query_map(params![project_id.to_string()], read_case_row)
        .map_err(|e| AppError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))?;

    rows.into_iter().map(row_to_test_case).collect()
}

/// List the test cases assigned to a user, ordered by priority first.
pub fn list_test_cases_by_assignee(conn: &Connection, user_id: Uuid) -> AppResult<Vec<TestCase>> {
    let sql = format!(
        "{} WHERE tc.assigned_to = ?1 ORDER BY tc.priority DESC, tc.created_at DESC",
        CASE_SELECT
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = stmt
        .query_map(params![user_id.to_string()], read_case_row)
        .map_err(|e| AppError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))?;

    rows.into_iter().map(row_to_test_case).collect()
}

/// Write the mutable fields of a test case back to its row.
pub fn update_test_case(conn: &Connection, case: &TestCase) -> AppResult<()> {
    let steps_blob = serde_json::to_string(&case.steps)?;

    conn.execute(
        "UPDATE test_cases SET title = ?1, description = ?2, priority = ?3, status = ?4,
                steps = ?5, expected_result = ?6, assigned_to = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            case.title.as_str(),
            case.description.as_deref(),
            case.priority.as_str(),
            case.status.as_str(),
            steps_blob,
            case.expected_result.as_deref(),
            case.assigned_to.map(|id| id.to_string()),
            case.updated_at.to_rfc3339(),
            case.id.to_string(),
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to update test case: {}", e)))?;

    Ok(())
}

/// Delete a test case.
pub fn delete_test_case(conn: &Connection, id: Uuid) -> AppResult<()> {
    conn.execute(
        "DELETE FROM test_cases WHERE id = ?1",
        params![id.to_string()],
    )
    .map_err(|e| AppError::Database(format!("Failed to delete test case: {}", e)))?;

    Ok(())
}
