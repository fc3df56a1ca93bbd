//! Axum extractor for validated request data
//!
//! `validate_request` stores the sanitized sections as a request extension;
//! `Validated` hands them to the handler.

use crate::core::error::GuardError;
use crate::middleware::request::RequestData;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Sanitized query, path parameters and body of the current request
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_user(Validated(data): Validated) -> Locals {
///     let name = data.body["name"].as_str().unwrap_or_default();
///     // data.body is already validated and stripped
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Validated(pub RequestData);

impl Validated {
    /// Get the inner request data
    pub fn into_inner(self) -> RequestData {
        self.0
    }
}

impl std::ops::Deref for Validated {
    type Target = RequestData;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Validated
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestData>()
            .cloned()
            .map(Validated)
            .ok_or_else(|| {
                GuardError::Internal(
                    "Validated used on a route without request validation".to_string(),
                )
            })
    }
}
