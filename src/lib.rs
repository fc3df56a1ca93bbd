//! # schema-guard
//!
//! Request and response schema validation middleware for axum route handlers.
//!
//! ## Features
//!
//! - **Request Validation**: Query, path parameters and JSON body validated concurrently
//! - **Response Validation**: Handler output sanitized before it reaches the client
//! - **Model Schemas**: Response schemas derived from ORM model metadata
//! - **Pluggable Engine**: Any [`ValidationEngine`](core::validation::ValidationEngine) can be injected
//! - **Uniform Errors**: Failures become a `400 Bad Request` with every message and field
//! - **Configuration-Based**: Application-wide option defaults via YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schema_guard::prelude::*;
//!
//! async fn list_users(Validated(data): Validated) -> Locals {
//!     let page = data.query["page"].as_i64().unwrap_or(1);
//!     Locals::from(json!({ "page": page, "users": [] }))
//! }
//!
//! let app: Router = Router::new().route(
//!     "/users",
//!     guard(
//!         get(list_users),
//!         SchemaDescriptor::new().query(Schema::keys([("page", Schema::integer().min(1.0))])),
//!         SchemaDescriptor::new().body(Schema::keys([
//!             ("page", Schema::integer()),
//!             ("users", Schema::array()),
//!         ])),
//!     )?,
//! );
//! ```

pub mod config;
pub mod core;
pub mod middleware;
pub mod model;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Schemas and options ===
    pub use crate::core::{
        error::{BadRequestError, GuardError, GuardResult, SchemaConversionError},
        options::{OptionsOverride, Section, ValidationOptions},
        schema::{Constraint, Schema, SchemaKind},
    };

    // === Validation ===
    pub use crate::core::validation::{
        EngineError, RuleEngine, Validated, ValidationDetail, ValidationEngine, ValidationFailure,
        normalize_error,
    };

    // === Middleware ===
    pub use crate::middleware::{
        Locals, Reply, RequestData, RequestValidator, ResponseValidator, SchemaDescriptor,
        SchemaSource, guard, guard_with, validate_request, validate_response,
    };

    // === Models ===
    pub use crate::model::{
        Column, ColumnType, ConvertOptions, Model, ModelDefinition, ModelInstance, Record,
        ResponseData, convert_model,
    };

    // === Config ===
    pub use crate::config::ValidatorConfig;

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{
        Router,
        http::StatusCode,
        routing::{delete, get, post, put},
    };
}
