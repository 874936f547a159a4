//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the single error type returned by the credential
//! and token service, the repositories and the use-case services.
//!
//! The variants follow the taxonomy callers act on: configuration problems are fatal at
//! startup, the token variants and `Unauthorized` all mean "unauthenticated", and
//! `NotFound`, `Conflict`, `BadRequest` and `ValidationError` are client errors. None of
//! them is retryable.
//!
//! `AppError` implements `actix_web::error::ResponseError` so an HTTP layer can return it
//! directly, and provides `From` conversions for `sqlx::Error`,
//! `validator::ValidationErrors`, `jsonwebtoken::errors::Error` and
//! `bcrypt::BcryptError` for use with the `?` operator.

use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or invalid configuration, e.g. an empty signing secret.
    /// Fatal at startup (HTTP 500 if it ever reaches a request).
    Configuration(String),
    /// The token's expiry timestamp is not in the future (HTTP 401).
    ExpiredToken,
    /// The token's signature does not verify under the server secret (HTTP 401).
    InvalidSignature,
    /// The token could not be parsed or lacks required claims (HTTP 401).
    MalformedToken(String),
    /// Authentication failed or is missing, e.g. wrong credentials (HTTP 401).
    Unauthorized(String),
    /// The request is well-formed but not allowed in the current state (HTTP 400).
    BadRequest(String),
    /// The requested record does not exist (HTTP 404).
    NotFound(String),
    /// The write would violate a uniqueness rule (HTTP 409).
    Conflict(String),
    /// Input failed validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
    /// An error from the persistence store (HTTP 500).
    DatabaseError(String),
    /// Any other unexpected server-side failure (HTTP 500).
    InternalServerError(String),
}

impl AppError {
    /// Returns `true` for every variant a caller should surface as "unauthenticated".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AppError::ExpiredToken
                | AppError::InvalidSignature
                | AppError::MalformedToken(_)
                | AppError::Unauthorized(_)
        )
    }

    /// Returns `true` for errors caused by the caller's input or the current state of data.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::BadRequest(_)
                | AppError::NotFound(_)
                | AppError::Conflict(_)
                | AppError::ValidationError(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Configuration(msg) => write!(f, "Configuration Error: {}", msg),
            AppError::ExpiredToken => write!(f, "Unauthorized: token has expired"),
            AppError::InvalidSignature => write!(f, "Unauthorized: invalid token signature"),
            AppError::MalformedToken(msg) => write!(f, "Unauthorized: malformed token: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Unauthenticated responses carry a `WWW-Authenticate: Bearer` challenge. Server-side
/// failures are reported with a generic message so store details do not leak.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ExpiredToken
            | AppError::InvalidSignature
            | AppError::MalformedToken(_)
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            AppError::ExpiredToken => "Token has expired".to_string(),
            AppError::InvalidSignature | AppError::MalformedToken(_) => {
                "Could not validate credentials".to_string()
            }
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg) => msg.clone(),
            AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => "Internal server error".to_string(),
        };

        let mut builder = HttpResponse::build(status);
        if self.is_unauthenticated() {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "error": message }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` and foreign-key violations become `NotFound`, unique violations become
/// `Conflict`, everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(format!(
                    "Record already exists ({})",
                    db_err.constraint().unwrap_or("unique constraint")
                ))
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Referenced record not found".into())
            }
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into the matching token variant.
///
/// Anything that is neither an expiry nor a signature failure means the token could not be
/// understood, so it is reported as malformed.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        match error.kind() {
            JwtErrorKind::ExpiredSignature => AppError::ExpiredToken,
            JwtErrorKind::InvalidSignature => AppError::InvalidSignature,
            _ => AppError::MalformedToken(error.to_string()),
        }
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
