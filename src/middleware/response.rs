//! Response-side validation of handler output

use super::descriptor::{SchemaDescriptor, SchemaSource};
use crate::config::ValidatorConfig;
use crate::core::error::{GuardError, GuardResult};
use crate::core::options::{Section, ValidationOptions};
use crate::core::schema::Schema;
use crate::core::validation::{EngineError, RuleEngine, ValidationEngine};
use crate::model::{ModelDefinition, ResponseData, convert_source};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// What the response validator decided to emit
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    /// `None` emits an empty body
    pub body: Option<Value>,
    /// False when the data failed validation and was emitted unchanged
    pub conforms: bool,
}

impl Reply {
    fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
            conforms: true,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// Sanitizes handler output against the declared response body
///
/// Validation failures never reach the client: they are logged and the
/// original data is emitted instead.
pub struct ResponseValidator {
    descriptor: SchemaDescriptor,
    schema: Option<Schema>,
    options: ValidationOptions,
    engine: Arc<dyn ValidationEngine>,
}

impl ResponseValidator {
    pub fn new(descriptor: SchemaDescriptor) -> GuardResult<Self> {
        Self::with_engine(descriptor, Arc::new(RuleEngine::new()))
    }

    pub fn with_engine(
        descriptor: SchemaDescriptor,
        engine: Arc<dyn ValidationEngine>,
    ) -> GuardResult<Self> {
        Self::with_config(descriptor, ValidatorConfig::default(), engine)
    }

    pub fn with_config(
        descriptor: SchemaDescriptor,
        config: ValidatorConfig,
        engine: Arc<dyn ValidationEngine>,
    ) -> GuardResult<Self> {
        if !descriptor.is_empty() && descriptor.body.is_none() {
            warn!(
                status = descriptor.status.map(|s| s.as_u16()),
                "response descriptor declares no body schema; responses will be emitted empty"
            );
        }

        let schema = descriptor
            .body
            .as_ref()
            .map(|source| convert_source(source, &descriptor.convert))
            .transpose()?;

        let options = config.options_for(Section::Response, descriptor.options.get(Section::Response));

        Ok(Self {
            descriptor,
            schema,
            options,
            engine,
        })
    }

    /// The compiled response body schema
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Declared status, or 200
    pub fn status(&self) -> StatusCode {
        self.descriptor.status.unwrap_or(StatusCode::OK)
    }

    pub fn description(&self) -> Option<&str> {
        self.descriptor.description.as_deref()
    }

    /// The body source as declared, before conversion
    pub fn source(&self) -> Option<&SchemaSource> {
        self.descriptor.body.as_ref()
    }

    /// The model the body was declared from, if any
    pub fn model(&self) -> Option<&ModelDefinition> {
        match self.descriptor.body.as_ref()? {
            SchemaSource::Model(model) | SchemaSource::ModelList(model) => Some(model.as_ref()),
            _ => None,
        }
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate and shape what the handler produced
    pub async fn handle(&self, data: ResponseData) -> GuardResult<Reply> {
        let plain = data.to_plain_data();

        if self.descriptor.is_empty() {
            return Ok(Reply::json(self.status(), plain));
        }

        let Some(schema) = self.schema.as_ref() else {
            return Ok(Reply {
                status: self.status(),
                body: None,
                conforms: true,
            });
        };

        match self.engine.validate(plain.clone(), schema, &self.options).await {
            Ok(sanitized) => Ok(Reply::json(self.status(), sanitized)),
            Err(EngineError::Invalid(failure)) => {
                warn!(
                    error = %failure,
                    description = self.description().unwrap_or_default(),
                    "response failed validation, emitting original data"
                );
                Ok(Reply {
                    status: self.status(),
                    body: Some(plain),
                    conforms: false,
                })
            }
            Err(err) => {
                error!(error = %err, "response validation engine failed");
                Err(GuardError::Engine(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_status_defaults_to_ok() {
        let validator = ResponseValidator::new(
            SchemaDescriptor::new().body(Schema::keys([("id", Schema::integer())])),
        )
        .unwrap();
        assert_eq!(validator.status(), StatusCode::OK);

        let reply = validator.handle(json!({ "id": 1, "secret": "x" }).into()).await.unwrap();
        assert_eq!(reply.body, Some(json!({ "id": 1 })));
        assert!(reply.conforms);
    }

    #[tokio::test]
    async fn test_descriptor_without_body_emits_empty() {
        let validator = ResponseValidator::new(
            SchemaDescriptor::new().status(StatusCode::NO_CONTENT),
        )
        .unwrap();

        let reply = validator.handle(json!({ "id": 1 }).into()).await.unwrap();
        assert_eq!(reply.status, StatusCode::NO_CONTENT);
        assert_eq!(reply.body, None);
    }

    #[tokio::test]
    async fn test_non_conforming_data_is_emitted_unchanged() {
        let validator = ResponseValidator::new(
            SchemaDescriptor::new().body(Schema::keys([("id", Schema::integer().required())])),
        )
        .unwrap();

        let reply = validator.handle(json!({ "name": "x" }).into()).await.unwrap();
        assert_eq!(reply.body, Some(json!({ "name": "x" })));
        assert!(!reply.conforms);
    }

    #[test]
    fn test_response_options_are_always_permissive() {
        let validator = ResponseValidator::new(
            SchemaDescriptor::new()
                .body(Schema::object())
                .options(
                    Section::Response,
                    crate::core::options::OptionsOverride::new()
                        .allow_unknown(false)
                        .strip_unknown(false),
                ),
        )
        .unwrap();
        assert!(validator.options().allow_unknown);
        assert!(validator.options().strip_unknown);
    }
}
