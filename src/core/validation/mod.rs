//! Validation engine, rule checks and error normalization
//!
//! The engine is a collaborator of every middleware: the bundled
//! [`RuleEngine`] interprets [`Schema`](crate::core::schema::Schema) rule
//! trees, and any other [`ValidationEngine`] can be injected in its place.

pub mod engine;
pub mod extractor;
pub mod normalizer;
pub mod rules;

pub use engine::{
    EngineError, RuleEngine, ValidationDetail, ValidationEngine, ValidationFailure,
};
pub use extractor::Validated;
pub use normalizer::{bad_request, normalize_error};
