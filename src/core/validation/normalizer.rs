//! Turns engine errors into the errors the host framework understands

use super::engine::{EngineError, ValidationFailure};
use crate::core::error::{BadRequestError, GuardError};

/// Separator between the messages of a multi-issue failure
pub const MESSAGE_SEPARATOR: &str = ". ";

/// Map an engine error onto a [`GuardError`]
///
/// Validation failures become a [`BadRequestError`]; anything else is handed
/// through as [`GuardError::Engine`], untouched.
pub fn normalize_error(err: EngineError) -> GuardError {
    tracing::debug!(error = %err, "request validation error");

    match err {
        EngineError::Invalid(failure) => GuardError::BadRequest(bad_request(&failure)),
        other @ EngineError::Fault { .. } => GuardError::Engine(other),
    }
}

/// Build the client-facing error for a failure
pub fn bad_request(failure: &ValidationFailure) -> BadRequestError {
    let message = failure
        .details
        .iter()
        .map(|detail| detail.message.as_str())
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR);

    let mut fields: Vec<String> = Vec::with_capacity(failure.details.len());
    for detail in &failure.details {
        if !fields.contains(&detail.path) {
            fields.push(detail.path.clone());
        }
    }

    BadRequestError::new(message, fields)
}
