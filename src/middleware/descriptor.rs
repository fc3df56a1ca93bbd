//! Route schema descriptors and their normalization

use crate::config::ValidatorConfig;
use crate::core::error::SchemaConversionError;
use crate::core::options::{OptionsOverride, Section, SectionOptions, ValidationOptions};
use crate::core::schema::Schema;
use crate::model::{ConvertOptions, Model, ModelDefinition, convert_source};
use axum::http::StatusCode;
use indexmap::IndexMap;
use std::sync::Arc;

/// What a section of a descriptor may hold
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// A rule tree, used as-is
    Schema(Schema),
    /// A map of keys, each of which may itself hold a model reference
    Fields(IndexMap<String, SchemaSource>),
    /// One row of a model
    Model(Arc<ModelDefinition>),
    /// A list of rows of a model
    ModelList(Arc<ModelDefinition>),
}

impl SchemaSource {
    pub fn fields<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaSource)>,
    {
        SchemaSource::Fields(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn model<M: Model>() -> Self {
        SchemaSource::Model(Arc::new(M::definition()))
    }

    pub fn model_list<M: Model>() -> Self {
        SchemaSource::ModelList(Arc::new(M::definition()))
    }

    /// Whether this source is a direct model reference
    pub fn is_model(&self) -> bool {
        matches!(self, SchemaSource::Model(_) | SchemaSource::ModelList(_))
    }
}

impl From<Schema> for SchemaSource {
    fn from(schema: Schema) -> Self {
        SchemaSource::Schema(schema)
    }
}

impl From<ModelDefinition> for SchemaSource {
    fn from(model: ModelDefinition) -> Self {
        SchemaSource::Model(Arc::new(model))
    }
}

impl From<Arc<ModelDefinition>> for SchemaSource {
    fn from(model: Arc<ModelDefinition>) -> Self {
        SchemaSource::Model(model)
    }
}

/// Everything a route declares about its exchange
///
/// ```rust,ignore
/// let descriptor = SchemaDescriptor::new()
///     .query(Schema::keys([("num", Schema::number().required())]))
///     .options(Section::Query, OptionsOverride::new().allow_unknown(false));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaDescriptor {
    pub query: Option<SchemaSource>,
    pub params: Option<SchemaSource>,
    /// Request body for request validators, response body for response validators
    pub body: Option<SchemaSource>,
    pub options: SectionOptions,
    pub status: Option<StatusCode>,
    pub description: Option<String>,
    pub convert: ConvertOptions,
}

impl SchemaDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, source: impl Into<SchemaSource>) -> Self {
        self.query = Some(source.into());
        self
    }

    pub fn params(mut self, source: impl Into<SchemaSource>) -> Self {
        self.params = Some(source.into());
        self
    }

    pub fn body(mut self, source: impl Into<SchemaSource>) -> Self {
        self.body = Some(source.into());
        self
    }

    pub fn options(mut self, section: Section, overrides: OptionsOverride) -> Self {
        self.options.set(section, overrides);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn omit_associations(mut self, omit: bool) -> Self {
        self.convert.omit_associations = omit;
        self
    }

    /// The source declared for a section; the response section reads `body`
    pub fn source(&self, section: Section) -> Option<&SchemaSource> {
        match section {
            Section::Query => self.query.as_ref(),
            Section::Params => self.params.as_ref(),
            Section::Body | Section::Response => self.body.as_ref(),
        }
    }

    /// True when nothing at all was declared
    pub fn is_empty(&self) -> bool {
        self.query.is_none()
            && self.params.is_none()
            && self.body.is_none()
            && self.options.is_empty()
            && self.status.is_none()
            && self.description.is_none()
    }
}

/// The schemas of a descriptor, with model references converted
#[derive(Debug, Clone, Default)]
pub struct CompiledSchemas {
    query: Option<Schema>,
    params: Option<Schema>,
    body: Option<Schema>,
}

impl CompiledSchemas {
    pub fn compile(descriptor: &SchemaDescriptor) -> Result<Self, SchemaConversionError> {
        let compile = |source: Option<&SchemaSource>| {
            source
                .map(|source| convert_source(source, &descriptor.convert))
                .transpose()
        };

        Ok(Self {
            query: compile(descriptor.query.as_ref())?,
            params: compile(descriptor.params.as_ref())?,
            body: compile(descriptor.body.as_ref())?,
        })
    }

    pub fn get(&self, section: Section) -> Option<&Schema> {
        match section {
            Section::Query => self.query.as_ref(),
            Section::Params => self.params.as_ref(),
            Section::Body | Section::Response => self.body.as_ref(),
        }
    }
}

/// Extract the schema and the effective options of one section
///
/// A `None` schema means the section was not declared and must not be
/// validated at all.
pub fn normalize<'a>(
    descriptor: &SchemaDescriptor,
    schemas: &'a CompiledSchemas,
    config: &ValidatorConfig,
    section: Section,
) -> (Option<&'a Schema>, ValidationOptions) {
    let options = config.options_for(section, descriptor.options.get(section));
    (schemas.get(section), options)
}
