//! ORM model metadata and instances
//!
//! An ORM plugs into schema-guard through two seams:
//!
//! - [`ModelDefinition`]: the declared columns and associations of a model,
//!   from which a response [`Schema`](crate::core::schema::Schema) is derived
//! - [`ModelInstance`]: a loaded row that can project itself to plain JSON
//!
//! Models that are known at compile time implement [`Model`].

pub mod convert;
pub mod plain;

pub use convert::{ConvertOptions, convert_model, convert_source};
pub use plain::{Record, ResponseData};

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Name of the primary key added to models that do not declare one
pub const IMPLICIT_PRIMARY_KEY: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Column types, as an ORM declares them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// VARCHAR with an optional length
    String(Option<u64>),
    Text,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Boolean,
    /// Timestamp with time zone
    Date,
    /// Calendar date without time
    DateOnly,
    Uuid,
    Enum(Vec<String>),
    Json,
    Array(Box<ColumnType>),
    /// A database type with no schema counterpart (e.g. `GEOMETRY`)
    Unsupported(String),
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String(Some(len)) => write!(f, "STRING({})", len),
            ColumnType::String(None) => write!(f, "STRING"),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::BigInt => write!(f, "BIGINT"),
            ColumnType::Float => write!(f, "FLOAT"),
            ColumnType::Double => write!(f, "DOUBLE"),
            ColumnType::Decimal => write!(f, "DECIMAL"),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
            ColumnType::Date => write!(f, "DATE"),
            ColumnType::DateOnly => write!(f, "DATEONLY"),
            ColumnType::Uuid => write!(f, "UUID"),
            ColumnType::Enum(values) => write!(f, "ENUM({})", values.join(", ")),
            ColumnType::Json => write!(f, "JSON"),
            ColumnType::Array(inner) => write!(f, "ARRAY({})", inner),
            ColumnType::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// One declared column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub column_type: ColumnType,
    pub allow_null: bool,
    pub primary_key: bool,
    /// Name of the model this column points at (foreign key)
    pub references: Option<String>,
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            allow_null: true,
            primary_key: false,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_null = false;
        self
    }

    pub fn references(mut self, model: impl Into<String>) -> Self {
        self.references = Some(model.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

impl AssociationKind {
    /// Whether the association yields a list of target rows
    pub fn is_many(&self) -> bool {
        matches!(self, AssociationKind::HasMany | AssociationKind::BelongsToMany)
    }
}

/// A relation to another model
#[derive(Debug, Clone)]
pub struct Association {
    /// Key under which included rows appear (e.g. `"owner"`, `"cars"`)
    pub name: String,
    pub kind: AssociationKind,
    pub target: Arc<ModelDefinition>,
}

/// Declared shape of a model
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    name: String,
    columns: IndexMap<String, Column>,
    associations: Vec<Association>,
    timestamps: bool,
}

impl ModelDefinition {
    /// A model with timestamps enabled and no columns yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            associations: Vec::new(),
            timestamps: true,
        }
    }

    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    /// Shorthand for a nullable column of the given type
    pub fn attribute(self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.column(name, Column::new(column_type))
    }

    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    pub fn belongs_to(self, name: impl Into<String>, target: Arc<ModelDefinition>) -> Self {
        self.associate(name, AssociationKind::BelongsTo, target)
    }

    pub fn has_one(self, name: impl Into<String>, target: Arc<ModelDefinition>) -> Self {
        self.associate(name, AssociationKind::HasOne, target)
    }

    pub fn has_many(self, name: impl Into<String>, target: Arc<ModelDefinition>) -> Self {
        self.associate(name, AssociationKind::HasMany, target)
    }

    pub fn belongs_to_many(self, name: impl Into<String>, target: Arc<ModelDefinition>) -> Self {
        self.associate(name, AssociationKind::BelongsToMany, target)
    }

    fn associate(
        mut self,
        name: impl Into<String>,
        kind: AssociationKind,
        target: Arc<ModelDefinition>,
    ) -> Self {
        self.associations.push(Association {
            name: name.into(),
            kind,
            target,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns as declared, without the implicit ones
    pub fn declared_columns(&self) -> &IndexMap<String, Column> {
        &self.columns
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn has_timestamps(&self) -> bool {
        self.timestamps
    }

    /// Every column a row carries: implicit primary key first, declared
    /// columns, then timestamps
    pub fn attributes(&self) -> IndexMap<String, Column> {
        let mut attributes = IndexMap::new();

        if !self.columns.values().any(|c| c.primary_key) {
            attributes.insert(
                IMPLICIT_PRIMARY_KEY.to_string(),
                Column::new(ColumnType::Integer).primary_key(),
            );
        }

        for (name, column) in &self.columns {
            attributes.insert(name.clone(), column.clone());
        }

        if self.timestamps {
            for name in [CREATED_AT, UPDATED_AT] {
                attributes
                    .entry(name.to_string())
                    .or_insert_with(|| Column::new(ColumnType::Date).not_null());
            }
        }

        attributes
    }
}

/// A model type known at compile time
pub trait Model: Send + Sync + 'static {
    fn definition() -> ModelDefinition;
}

/// A loaded row that can be emitted as plain JSON
pub trait ModelInstance: fmt::Debug + Send + Sync {
    /// Name of the model the row belongs to
    fn model_name(&self) -> &str;

    /// Plain-data projection of the row
    fn to_plain(&self) -> Value;
}
