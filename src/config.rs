//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// HTTP header name for API token authentication.
pub const API_TOKEN_HEADER: &str = "X-API-Key";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_DATABASE_URL: &str = "file:data/taskhub.db";
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 3000;
    pub const DEV_STATIC_DIR: &str = "frontend";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL in `file:path` form (embedded SQLite)
    pub database_url: String,
    /// Directory for the static frontend (defaults to `frontend` in development)
    pub static_dir: Option<PathBuf>,
    /// API token gating the protected user routes (optional; open when unset)
    pub api_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `TASKHUB_HOST`: Server host (default: 127.0.0.1)
    /// - `TASKHUB_PORT`: Server port (default: 3000)
    /// - `DATABASE_URL`: SQLite location as `file:path` (required in production)
    /// - `TASKHUB_API_TOKEN`: Token for the protected user routes (optional)
    /// - `TASKHUB_STATIC_DIR`: Static frontend directory (default `frontend` in development)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Parse environment - required
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        // Load values with defaults
        let host = env::var("TASKHUB_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("TASKHUB_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("TASKHUB_PORT must be a valid port number"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DEV_DATABASE_URL.to_string());

        let api_token = env::var("TASKHUB_API_TOKEN").ok();

        let static_dir = env::var("TASKHUB_STATIC_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                if environment.is_development() {
                    Some(PathBuf::from(defaults::DEV_STATIC_DIR))
                } else {
                    None
                }
            });

        let config = Config {
            environment,
            host,
            port,
            database_url,
            static_dir,
            api_token,
        };

        // Validate production configuration
        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url == defaults::DEV_DATABASE_URL {
            errors.push(format!(
                "DATABASE_URL is using development default '{}'. Set an explicit database path.",
                defaults::DEV_DATABASE_URL
            ));
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
