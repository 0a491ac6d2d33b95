//! TaskHub QA Sandbox server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{http::header, web, App, HttpServer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use taskhub_server::api;
use taskhub_server::auth::AccessToken;
use taskhub_server::config::Config;
use taskhub_server::db::{self, DbPool};
use taskhub_server::middleware::RequestLogger;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL must be set explicitly");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  TaskHub QA Sandbox");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Initialize database (synchronous)
    let pool = DbPool::new(&config).expect("Failed to initialize database");
    info!("Database connection established");

    // Run migrations
    db::migrations::run_migrations(&pool).expect("Failed to run migrations");
    info!("Database migrations complete");

    // Prepare shared state
    let bind_address = config.bind_address();
    let access_token = AccessToken::new(config.api_token.clone());
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    if access_token.is_open() {
        warn!("No TASKHUB_API_TOKEN configured - user routes are unprotected");
    }
    if let Some(ref dir) = static_dir {
        info!("Static file serving enabled from {:?}", dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    "X-API-Key".parse().unwrap(),
                ])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    "X-API-Key".parse().unwrap(),
                ])
                .max_age(3600)
        };

        let mut app = App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            // Add request logging middleware
            .wrap(RequestLogger)
            // Add shared state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(access_token.clone()))
            // Health probes at the root
            .configure(api::configure_health_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/api-docs/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            )
            // API routes
            .service(web::scope("/api/users").configure(api::configure_user_routes))
            .service(web::scope("/api/projects").configure(api::configure_project_routes))
            .service(web::scope("/api/test-cases").configure(api::configure_test_case_routes));

        // Serve the static frontend when a directory is configured
        if let Some(ref dir) = static_dir {
            app = app.service(
                Files::new("/", dir.clone())
                    .index_file("index.html")
                    .prefer_utf8(true),
            );
        }

        app
    });

    // Set worker count
    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
