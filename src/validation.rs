//! Field-level validation rules for request bodies.
//!
//! Rules are enforced per entity and per operation (create vs update).
//! Every violated rule is collected so the client can display all problems
//! at once; nothing fails fast.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::project::{CreateProjectInput, UpdateProjectInput, PROJECT_STATUSES};
use crate::models::test_case::{CreateTestCaseInput, UpdateTestCaseInput, CASE_STATUSES, PRIORITIES};
use crate::models::user::{CreateUserInput, UpdateUserInput, USER_ROLES};
use crate::models::{FieldError, TestStep};

/// Normalize an email for storage: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_username(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    let mut parts = s.splitn(2, '@');
    let (local, domain) = match (parts.next(), parts.next()) {
        (Some(l), Some(d)) => (l, d),
        _ => return false,
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn is_valid_uuid(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

fn into_result(errors: Vec<FieldError>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn check_username(errors: &mut Vec<FieldError>, username: &str) {
    let username = username.trim();
    if username.len() < 3 || username.len() > 50 {
        errors.push(FieldError::new(
            "username",
            "Username must be between 3 and 50 characters",
        ));
    }
    if !is_valid_username(username) {
        errors.push(FieldError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
}

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }
}

fn check_role(errors: &mut Vec<FieldError>, role: &str) {
    if !USER_ROLES.contains(&role) {
        errors.push(FieldError::new("role", "Role must be user, admin, or qa"));
    }
}

fn check_steps(errors: &mut Vec<FieldError>, steps: &[TestStep]) {
    for step in steps {
        if step.step.is_empty() || step.step.len() > 500 {
            errors.push(FieldError::new(
                "steps",
                "Each step must be between 1 and 500 characters",
            ));
            break;
        }
    }
}

/// Rules for `POST /api/users`.
pub fn validate_create_user(input: &CreateUserInput) -> AppResult<()> {
    let mut errors = Vec::new();

    match input.username.as_deref() {
        Some(username) => check_username(&mut errors, username),
        None => errors.push(FieldError::new("username", "Username is required")),
    }

    match input.email.as_deref() {
        Some(email) => check_email(&mut errors, email),
        None => errors.push(FieldError::new("email", "Email is required")),
    }

    match input.password.as_deref() {
        Some(password) if password.len() >= 6 => {}
        Some(_) => errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        )),
        None => errors.push(FieldError::new("password", "Password is required")),
    }

    if let Some(role) = input.role.as_deref() {
        check_role(&mut errors, role);
    }

    into_result(errors)
}

/// Rules for `PUT /api/users/{id}` — every field optional.
pub fn validate_update_user(input: &UpdateUserInput) -> AppResult<()> {
    let mut errors = Vec::new();

    if let Some(username) = input.username.as_deref() {
        check_username(&mut errors, username);
    }
    if let Some(email) = input.email.as_deref() {
        check_email(&mut errors, email);
    }
    if let Some(role) = input.role.as_deref() {
        check_role(&mut errors, role);
    }

    into_result(errors)
}

fn check_project_name(errors: &mut Vec<FieldError>, name: &str) {
    let name = name.trim();
    if name.is_empty() || name.len() > 100 {
        errors.push(FieldError::new(
            "name",
            "Project name is required and must be less than 100 characters",
        ));
    }
}

fn check_project_description(errors: &mut Vec<FieldError>, description: &str) {
    if description.len() > 500 {
        errors.push(FieldError::new(
            "description",
            "Description must be less than 500 characters",
        ));
    }
}

/// Rules for `POST /api/projects`.
pub fn validate_create_project(input: &CreateProjectInput) -> AppResult<()> {
    let mut errors = Vec::new();

    match input.name.as_deref() {
        Some(name) => check_project_name(&mut errors, name),
        None => errors.push(FieldError::new("name", "Project name is required")),
    }

    if let Some(description) = input.description.as_deref() {
        check_project_description(&mut errors, description);
    }

    into_result(errors)
}

/// Rules for `PUT /api/projects/{id}` — every field optional.
pub fn validate_update_project(input: &UpdateProjectInput) -> AppResult<()> {
    let mut errors = Vec::new();

    if let Some(name) = input.name.as_deref() {
        check_project_name(&mut errors, name);
    }
    if let Some(Some(description)) = &input.description {
        check_project_description(&mut errors, description);
    }
    if let Some(status) = input.status.as_deref() {
        if !PROJECT_STATUSES.contains(&status) {
            errors.push(FieldError::new(
                "status",
                "Status must be active, archived, or completed",
            ));
        }
    }

    into_result(errors)
}

fn check_title(errors: &mut Vec<FieldError>, title: &str) {
    let title = title.trim();
    if title.is_empty() || title.len() > 200 {
        errors.push(FieldError::new(
            "title",
            "Test case title is required and must be less than 200 characters",
        ));
    }
}

fn check_case_description(errors: &mut Vec<FieldError>, description: &str) {
    if description.len() > 1000 {
        errors.push(FieldError::new(
            "description",
            "Description must be less than 1000 characters",
        ));
    }
}

fn check_expected_result(errors: &mut Vec<FieldError>, expected_result: &str) {
    if expected_result.len() > 1000 {
        errors.push(FieldError::new(
            "expected_result",
            "Expected result must be less than 1000 characters",
        ));
    }
}

fn check_priority(errors: &mut Vec<FieldError>, priority: &str) {
    if !PRIORITIES.contains(&priority) {
        errors.push(FieldError::new(
            "priority",
            "Priority must be low, medium, high, or critical",
        ));
    }
}

fn check_case_status(errors: &mut Vec<FieldError>, status: &str) {
    if !CASE_STATUSES.contains(&status) {
        errors.push(FieldError::new("status", "Invalid status value"));
    }
}

/// Rules for `POST /api/test-cases`.
pub fn validate_create_test_case(input: &CreateTestCaseInput) -> AppResult<()> {
    let mut errors = Vec::new();

    match input.title.as_deref() {
        Some(title) => check_title(&mut errors, title),
        None => errors.push(FieldError::new("title", "Test case title is required")),
    }

    if let Some(description) = input.description.as_deref() {
        check_case_description(&mut errors, description);
    }

    match input.project_id.as_deref() {
        Some(id) if is_valid_uuid(id) => {}
        _ => errors.push(FieldError::new("project_id", "Valid project ID is required")),
    }

    if let Some(priority) = input.priority.as_deref() {
        check_priority(&mut errors, priority);
    }
    if let Some(status) = input.status.as_deref() {
        check_case_status(&mut errors, status);
    }
    if let Some(steps) = input.steps.as_deref() {
        check_steps(&mut errors, steps);
    }
    if let Some(expected_result) = input.expected_result.as_deref() {
        check_expected_result(&mut errors, expected_result);
    }
    if let Some(created_by) = input.created_by.as_deref() {
        if !is_valid_uuid(created_by) {
            errors.push(FieldError::new(
                "created_by",
                "Creator user ID must be a valid UUID",
            ));
        }
    }
    if let Some(assigned_to) = input.assigned_to.as_deref() {
        if !is_valid_uuid(assigned_to) {
            errors.push(FieldError::new(
                "assigned_to",
                "Assigned user ID must be a valid UUID",
            ));
        }
    }

    into_result(errors)
}

/// Rules for `PUT /api/test-cases/{id}` — every field optional. An explicit
/// `null` or empty `assigned_to` is accepted and means "unassign".
pub fn validate_update_test_case(input: &UpdateTestCaseInput) -> AppResult<()> {
    let mut errors = Vec::new();

    if let Some(title) = input.title.as_deref() {
        check_title(&mut errors, title);
    }
    if let Some(Some(description)) = &input.description {
        check_case_description(&mut errors, description);
    }
    if let Some(priority) = input.priority.as_deref() {
        check_priority(&mut errors, priority);
    }
    if let Some(status) = input.status.as_deref() {
        check_case_status(&mut errors, status);
    }
    if let Some(steps) = input.steps.as_deref() {
        check_steps(&mut errors, steps);
    }
    if let Some(Some(expected_result)) = &input.expected_result {
        check_expected_result(&mut errors, expected_result);
    }
    if let Some(Some(assigned_to)) = &input.assigned_to {
        if !assigned_to.is_empty() && !is_valid_uuid(assigned_to) {
            errors.push(FieldError::new(
                "assigned_to",
                "Assigned user ID must be a valid UUID or null",
            ));
        }
    }

    into_result(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(result: AppResult<()>) -> Vec<FieldError> {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other.err()),
        }
    }

    fn user_input(username: &str, email: &str, password: &str) -> CreateUserInput {
        CreateUserInput {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: None,
        }
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(validate_create_user(&user_input("alice_1", "alice@example.com", "secret1")).is_ok());
    }

    #[test]
    fn test_short_username_rejected() {
        let errors = violations(validate_create_user(&user_input(
            "ab",
            "alice@example.com",
            "secret1",
        )));
        assert!(errors.iter().any(|e| e.field == "username"
            && e.message.contains("between 3 and 50")));
    }

    #[test]
    fn test_username_charset_rejected() {
        let errors = violations(validate_create_user(&user_input(
            "bad name!",
            "alice@example.com",
            "secret1",
        )));
        assert!(errors.iter().any(|e| e.field == "username"));
    }

    #[test]
    fn test_all_violations_collected() {
        let input = CreateUserInput {
            username: Some("ab".to_string()),
            email: Some("not-an-email".to_string()),
            password: Some("123".to_string()),
            role: Some("root".to_string()),
        };
        let errors = violations(validate_create_user(&input));
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"role"));
    }

    #[test]
    fn test_missing_required_user_fields() {
        let input = CreateUserInput {
            username: None,
            email: None,
            password: None,
            role: None,
        };
        let errors = violations(validate_create_user(&input));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_update_user_fields_optional() {
        let input = UpdateUserInput {
            username: None,
            email: None,
            role: None,
        };
        assert!(validate_update_user(&input).is_ok());
    }

    #[test]
    fn test_project_name_required() {
        let input = CreateProjectInput {
            name: None,
            description: None,
            owner_id: None,
        };
        let errors = violations(validate_create_project(&input));
        assert!(errors.iter().any(|e| e.field == "name"));
    }

    #[test]
    fn test_project_status_membership() {
        let input = UpdateProjectInput {
            name: None,
            description: None,
            status: Some("paused".to_string()),
        };
        let errors = violations(validate_update_project(&input));
        assert!(errors.iter().any(|e| e.field == "status"));
    }

    #[test]
    fn test_missing_project_id_rejected() {
        let input = CreateTestCaseInput {
            title: Some("Login works".to_string()),
            description: None,
            project_id: None,
            priority: None,
            status: None,
            steps: None,
            expected_result: None,
            created_by: None,
            assigned_to: None,
        };
        let errors = violations(validate_create_test_case(&input));
        assert!(errors.iter().any(|e| e.field == "project_id"));
    }

    #[test]
    fn test_step_length_rule() {
        let input = CreateTestCaseInput {
            title: Some("Login works".to_string()),
            description: None,
            project_id: Some(uuid::Uuid::new_v4().to_string()),
            priority: None,
            status: None,
            steps: Some(vec![TestStep {
                step: String::new(),
                expected: None,
            }]),
            expected_result: None,
            created_by: None,
            assigned_to: None,
        };
        let errors = violations(validate_create_test_case(&input));
        assert!(errors.iter().any(|e| e.field == "steps"));
    }

    #[test]
    fn test_unassign_accepts_null_and_empty() {
        let mut input = UpdateTestCaseInput {
            title: None,
            description: None,
            priority: None,
            status: None,
            steps: None,
            expected_result: None,
            assigned_to: Some(None),
        };
        assert!(validate_update_test_case(&input).is_ok());

        input.assigned_to = Some(Some(String::new()));
        assert!(validate_update_test_case(&input).is_ok());

        input.assigned_to = Some(Some("not-a-uuid".to_string()));
        assert!(validate_update_test_case(&input).is_err());
    }

    #[test]
    fn test_invalid_priority_rejected() {
        let input = UpdateTestCaseInput {
            title: None,
            description: None,
            priority: Some("urgent".to_string()),
            status: None,
            steps: None,
            expected_result: None,
            assigned_to: None,
        };
        let errors = violations(validate_update_test_case(&input));
        assert!(errors.iter().any(|e| e.field == "priority"));
    }
}
