//! Typed error handling for schema-guard
//!
//! Every failure the middlewares hand to the host framework is a
//! [`GuardError`], which knows its HTTP status, its machine-readable code and
//! how to render itself as a JSON error body.
//!
//! # Error Categories
//!
//! - [`BadRequestError`]: a request did not conform to its route schema
//! - [`SchemaConversionError`]: an ORM model could not be turned into a schema
//! - [`EngineError`]: the validation engine failed for a reason other than bad data
//! - [`RequestError`]: the request could not be read (malformed JSON, oversized body)
//! - [`ConfigError`]: validator configuration could not be loaded
//!
//! # Example
//!
//! ```rust,ignore
//! match validator.handle(&mut data).await {
//!     Ok(()) => { /* data holds the sanitized sections */ }
//!     Err(GuardError::BadRequest(err)) => {
//!         println!("invalid fields: {:?}", err.fields);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use crate::core::validation::EngineError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for schema-guard
#[derive(Debug)]
pub enum GuardError {
    /// Request data rejected by its schema
    BadRequest(BadRequestError),

    /// Model metadata could not be converted into a schema
    Conversion(SchemaConversionError),

    /// Validation engine failure that is not about the data itself
    Engine(EngineError),

    /// The request could not be read
    Request(RequestError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::BadRequest(e) => write!(f, "{}", e),
            GuardError::Conversion(e) => write!(f, "{}", e),
            GuardError::Engine(e) => write!(f, "{}", e),
            GuardError::Request(e) => write!(f, "{}", e),
            GuardError::Config(e) => write!(f, "{}", e),
            GuardError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardError::BadRequest(e) => Some(e),
            GuardError::Conversion(e) => Some(e),
            GuardError::Engine(e) => Some(e),
            GuardError::Request(e) => Some(e),
            GuardError::Config(e) => Some(e),
            GuardError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GuardError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GuardError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GuardError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GuardError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GuardError::Request(e) => e.status_code(),
            GuardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GuardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GuardError::BadRequest(_) => "BAD_REQUEST",
            GuardError::Conversion(_) => "SCHEMA_CONVERSION_ERROR",
            GuardError::Engine(_) => "VALIDATION_ENGINE_ERROR",
            GuardError::Request(e) => e.error_code(),
            GuardError::Config(_) => "CONFIG_ERROR",
            GuardError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this is a client-facing validation rejection
    pub fn is_bad_request(&self) -> bool {
        matches!(self, GuardError::BadRequest(_))
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            GuardError::BadRequest(BadRequestError { fields, .. }) => {
                Some(serde_json::json!({ "fields": fields }))
            }
            GuardError::Conversion(SchemaConversionError::UnsupportedColumn {
                model,
                column,
                ..
            }) => Some(serde_json::json!({ "model": model, "column": column })),
            _ => None,
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Bad Request
// =============================================================================

/// Client-facing validation rejection
///
/// `message` joins every issue message with `". "`; `fields` lists the
/// offending paths once each, in the order they were first reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadRequestError {
    pub message: String,
    pub fields: Vec<String>,
}

impl BadRequestError {
    pub fn new(message: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            message: message.into(),
            fields,
        }
    }
}

impl fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BadRequestError {}

impl From<BadRequestError> for GuardError {
    fn from(err: BadRequestError) -> Self {
        GuardError::BadRequest(err)
    }
}

// =============================================================================
// Schema Conversion Errors
// =============================================================================

/// Errors raised while turning model metadata into a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaConversionError {
    /// The model declares no columns at all
    EmptyModel { model: String },

    /// A column type has no schema counterpart
    UnsupportedColumn {
        model: String,
        column: String,
        column_type: String,
    },
}

impl fmt::Display for SchemaConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaConversionError::EmptyModel { model } => {
                write!(f, "Model '{}' declares no columns to convert", model)
            }
            SchemaConversionError::UnsupportedColumn {
                model,
                column,
                column_type,
            } => {
                write!(
                    f,
                    "Cannot convert column '{}.{}' of type {}",
                    model, column, column_type
                )
            }
        }
    }
}

impl std::error::Error for SchemaConversionError {}

impl From<SchemaConversionError> for GuardError {
    fn from(err: SchemaConversionError) -> Self {
        GuardError::Conversion(err)
    }
}

// =============================================================================
// Engine Errors
// =============================================================================

impl From<EngineError> for GuardError {
    fn from(err: EngineError) -> Self {
        GuardError::Engine(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors raised while reading the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The body is not valid JSON
    InvalidBody { message: String },

    /// The query string could not be decoded
    InvalidQuery { message: String },

    /// Path parameters could not be decoded
    InvalidParams { message: String },

    /// The body exceeds the configured limit
    BodyTooLarge { limit: usize },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
            RequestError::InvalidQuery { message } => {
                write!(f, "Invalid query string: {}", message)
            }
            RequestError::InvalidParams { message } => {
                write!(f, "Invalid path parameters: {}", message)
            }
            RequestError::BodyTooLarge { limit } => {
                write!(f, "Request body exceeds {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            RequestError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidBody { .. } => "INVALID_BODY",
            RequestError::InvalidQuery { .. } => "INVALID_QUERY",
            RequestError::InvalidParams { .. } => "INVALID_PARAMS",
            RequestError::BodyTooLarge { .. } => "BODY_TOO_LARGE",
        }
    }
}

impl From<RequestError> for GuardError {
    fn from(err: RequestError) -> Self {
        GuardError::Request(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors raised while loading a [`ValidatorConfig`](crate::config::ValidatorConfig)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read
    Unreadable { path: String, message: String },

    /// The YAML does not describe a validator configuration
    Malformed {
        /// Set when the YAML came from a file
        path: Option<String>,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn malformed(path: Option<&str>, err: serde_yaml::Error) -> Self {
        ConfigError::Malformed {
            path: path.map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Unreadable { path, message } => {
                write!(f, "Cannot read validator config '{}': {}", path, message)
            }
            ConfigError::Malformed {
                path: Some(path),
                message,
            } => write!(f, "Invalid validator config in '{}': {}", path, message),
            ConfigError::Malformed {
                path: None,
                message,
            } => write!(f, "Invalid validator config: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for GuardError {
    fn from(err: ConfigError) -> Self {
        GuardError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        GuardError::Request(RequestError::InvalidBody {
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for schema-guard operations
pub type GuardResult<T> = Result<T, GuardError>;

// =============================================================================
// Tests
// =============================================================================
