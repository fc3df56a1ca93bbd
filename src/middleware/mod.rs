//! Route-level validation middleware
//!
//! - [`descriptor`]: what a route declares, and how a section is normalized
//! - [`request`]: validation of query, path parameters and body
//! - [`response`]: validation of handler output
//! - [`layer`]: the axum middleware functions and [`guard`]

pub mod descriptor;
pub mod layer;
pub mod request;
pub mod response;

pub use descriptor::{CompiledSchemas, SchemaDescriptor, SchemaSource, normalize};
pub use layer::{Locals, guard, guard_with, validate_request, validate_response};
pub use request::{RequestData, RequestValidator, TOKEN_FIELD};
pub use response::{Reply, ResponseValidator};
