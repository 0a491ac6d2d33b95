//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TaskHub QA Sandbox API",
        version = "0.1.0",
        description = "REST API for managing users, projects, and test cases in a QA sandbox"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // User endpoints
        api::users::list_users,
        api::users::get_user,
        api::users::create_user,
        api::users::update_user,
        api::users::delete_user,
        // Project endpoints
        api::projects::list_projects,
        api::projects::get_project,
        api::projects::list_projects_by_owner,
        api::projects::create_project,
        api::projects::update_project,
        api::projects::delete_project,
        // Test case endpoints
        api::test_cases::list_test_cases,
        api::test_cases::get_test_case,
        api::test_cases::list_by_project,
        api::test_cases::list_by_assignee,
        api::test_cases::project_stats,
        api::test_cases::create_test_case,
        api::test_cases::update_test_case,
        api::test_cases::delete_test_case,
    ),
    components(
        schemas(
            // Common
            models::FieldError,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Users
            models::UserResponse,
            models::user::CreateUserInput,
            models::user::UpdateUserInput,
            // Projects
            models::Project,
            models::project::CreateProjectInput,
            models::project::UpdateProjectInput,
            // Test cases
            models::TestCase,
            models::TestStep,
            models::TestCaseStats,
            models::test_case::CreateTestCaseInput,
            models::test_case::UpdateTestCaseInput,
            models::test_case::TestCaseFilters,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Users", description = "User management"),
        (name = "Projects", description = "Project management"),
        (name = "Test Cases", description = "Test case management and statistics")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the API token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_token",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::config::API_TOKEN_HEADER,
                        ),
                    ),
                ),
            );
        }
    }
}
