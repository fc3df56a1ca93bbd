//! Core module containing the schema model, options and validation engine

pub mod error;
pub mod options;
pub mod schema;
pub mod validation;

pub use error::{BadRequestError, GuardError, GuardResult, SchemaConversionError};
pub use options::{OptionsOverride, Section, SectionOptions, ValidationOptions};
pub use schema::{Constraint, Schema, SchemaKind};
