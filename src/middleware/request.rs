//! Request-side validation of query, path parameters and body

use super::descriptor::{CompiledSchemas, SchemaDescriptor, normalize};
use crate::config::ValidatorConfig;
use crate::core::error::{GuardError, GuardResult, RequestError};
use crate::core::options::Section;
use crate::core::validation::{RuleEngine, ValidationEngine, normalize_error};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Query key carrying the authentication token; never validated
pub const TOKEN_FIELD: &str = "token";

/// The validatable parts of a request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    pub query: Value,
    pub params: Value,
    pub body: Value,
}

impl Default for RequestData {
    fn default() -> Self {
        Self {
            query: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            body: Value::Null,
        }
    }
}

impl RequestData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn section(&self, section: Section) -> &Value {
        match section {
            Section::Query => &self.query,
            Section::Params => &self.params,
            Section::Body | Section::Response => &self.body,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Value {
        match section {
            Section::Query => &mut self.query,
            Section::Params => &mut self.params,
            Section::Body | Section::Response => &mut self.body,
        }
    }

    pub fn query_as<T: DeserializeOwned>(&self) -> GuardResult<T> {
        Self::decode(Section::Query, &self.query)
    }

    pub fn params_as<T: DeserializeOwned>(&self) -> GuardResult<T> {
        Self::decode(Section::Params, &self.params)
    }

    pub fn body_as<T: DeserializeOwned>(&self) -> GuardResult<T> {
        Self::decode(Section::Body, &self.body)
    }

    fn decode<T: DeserializeOwned>(section: Section, value: &Value) -> GuardResult<T> {
        T::deserialize(value).map_err(|e| {
            let message = e.to_string();
            GuardError::Request(match section {
                Section::Query => RequestError::InvalidQuery { message },
                Section::Params => RequestError::InvalidParams { message },
                Section::Body | Section::Response => RequestError::InvalidBody { message },
            })
        })
    }
}

/// Validates the declared request sections and sanitizes them in place
///
/// # Example
///
/// ```rust,ignore
/// let validator = RequestValidator::new(
///     SchemaDescriptor::new().query(Schema::keys([("num", Schema::number().required())])),
/// )?;
///
/// let mut data = RequestData::new().with_query(json!({ "num": "10", "extra": 1 }));
/// validator.handle(&mut data).await?;
/// assert_eq!(data.query, json!({ "num": 10 }));
/// ```
pub struct RequestValidator {
    descriptor: SchemaDescriptor,
    schemas: CompiledSchemas,
    config: ValidatorConfig,
    engine: Arc<dyn ValidationEngine>,
}

impl RequestValidator {
    /// Validator using the bundled engine and default configuration
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
        let schemas = CompiledSchemas::compile(&descriptor)?;
        Ok(Self {
            descriptor,
            schemas,
            config,
            engine,
        })
    }

    /// The descriptor this validator was built from
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Whether a section has a schema
    pub fn declares(&self, section: Section) -> bool {
        self.schemas.get(section).is_some()
    }

    /// Validate every declared section concurrently
    ///
    /// All validations run to completion; the first failure in section order
    /// (query, params, body) is reported. `request` is only modified when
    /// every section passed.
    pub async fn handle(&self, request: &mut RequestData) -> GuardResult<()> {
        let pending: Vec<_> = Section::REQUEST
            .iter()
            .filter_map(|section| {
                let (schema, options) =
                    normalize(&self.descriptor, &self.schemas, &self.config, *section);
                schema.map(|schema| (*section, schema, options))
            })
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        let mut token = None;
        let mut validations = Vec::with_capacity(pending.len());
        for (section, schema, options) in &pending {
            let mut input = request.section(*section).clone();
            if *section == Section::Query {
                if let Value::Object(map) = &mut input {
                    token = map.remove(TOKEN_FIELD);
                }
            }
            validations.push(self.engine.validate(input, schema, options));
        }

        let results = join_all(validations).await;

        let mut sanitized = Vec::with_capacity(results.len());
        for ((section, _, _), result) in pending.iter().zip(results) {
            match result {
                Ok(value) => sanitized.push((*section, value)),
                Err(err) => return Err(normalize_error(err)),
            }
        }

        for (section, mut value) in sanitized {
            if section == Section::Query {
                if let (Some(token), Value::Object(map)) = (token.take(), &mut value) {
                    map.insert(TOKEN_FIELD.to_string(), token);
                }
            }
            *request.section_mut(section) = value;
        }

        Ok(())
    }
}
