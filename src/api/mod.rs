//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod projects;
pub mod test_cases;
pub mod users;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use projects::configure_routes as configure_project_routes;
pub use test_cases::configure_routes as configure_test_case_routes;
pub use users::configure_routes as configure_user_routes;
