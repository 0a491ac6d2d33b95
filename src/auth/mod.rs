//! Authentication for the protected user routes.
//!
//! There is no session protocol: a single optional API token gates the
//! user listing/detail/update/delete endpoints. When no token is
//! configured the deployment runs open (the development default).

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::API_TOKEN_HEADER;
use crate::error::AppError;

/// Wrapper type for the configured API token.
/// Uses `SecretString` so the value cannot be logged accidentally.
#[derive(Clone)]
pub struct AccessToken(Option<SecretString>);

impl AccessToken {
    /// Create a new AccessToken from an optional string.
    pub fn new(token: Option<String>) -> Self {
        Self(token.map(SecretString::from))
    }

    /// True when no token is configured and every caller is accepted.
    pub fn is_open(&self) -> bool {
        self.0.is_none()
    }

    /// Securely compare the provided token with the configured one.
    ///
    /// `ConstantTimeEq` compares both buffers in full regardless of where
    /// they first differ, and returns false for unequal lengths without an
    /// early exit.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.0 {
            Some(secret) => {
                let expected = secret.expose_secret();
                expected.as_bytes().ct_eq(provided.as_bytes()).into()
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "AccessToken([REDACTED])"),
            None => write!(f, "AccessToken(None)"),
        }
    }
}

/// Extractor that enforces the API token on protected handlers.
///
/// ```ignore
/// async fn protected_handler(_auth: RequireAuth) -> impl Responder { ... }
/// ```
pub struct RequireAuth;

impl FromRequest for RequireAuth {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = match req.app_data::<web::Data<AccessToken>>() {
            Some(token) => token,
            None => {
                return ready(Err(AppError::Unauthorized(
                    "Internal configuration error".to_string(),
                )));
            }
        };

        if token.is_open() {
            return ready(Ok(RequireAuth));
        }

        let provided = req
            .headers()
            .get(API_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        match provided {
            Some(value) if token.verify(value) => ready(Ok(RequireAuth)),
            Some(_) => ready(Err(AppError::Unauthorized(
                "Invalid API token".to_string(),
            ))),
            None => ready(Err(AppError::Unauthorized(
                "Missing API token".to_string(),
            ))),
        }
    }
}
