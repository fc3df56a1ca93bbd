//! Derive schemas from model metadata

use super::{Column, ColumnType, ModelDefinition};
use crate::core::error::SchemaConversionError;
use crate::core::schema::Schema;
use crate::middleware::descriptor::SchemaSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Leave associations and foreign-key columns out of the schema
    pub omit_associations: bool,
}

/// Compile a schema source, converting every model reference it holds
pub fn convert_source(
    source: &SchemaSource,
    options: &ConvertOptions,
) -> Result<Schema, SchemaConversionError> {
    match source {
        SchemaSource::Schema(schema) => Ok(schema.clone()),
        SchemaSource::Fields(fields) => {
            let keys = fields
                .iter()
                .map(|(name, child)| Ok((name.clone(), convert_source(child, options)?)))
                .collect::<Result<Vec<_>, SchemaConversionError>>()?;
            Ok(Schema::keys(keys))
        }
        SchemaSource::Model(model) => convert_model(model, options),
        SchemaSource::ModelList(model) => Ok(Schema::array_of(convert_model(model, options)?)),
    }
}

/// Object schema matching one row of `model`
///
/// No key is required: rows may be loaded with a subset of their columns.
pub fn convert_model(
    model: &ModelDefinition,
    options: &ConvertOptions,
) -> Result<Schema, SchemaConversionError> {
    if model.declared_columns().is_empty() {
        return Err(SchemaConversionError::EmptyModel {
            model: model.name().to_string(),
        });
    }

    let mut schema = Schema::object().description(model.name());

    for (name, column) in model.attributes() {
        if options.omit_associations && column.references.is_some() {
            continue;
        }
        schema = schema.key(name.clone(), column_schema(model, &name, &column)?);
    }

    if !options.omit_associations {
        for association in model.associations() {
            let target = convert_model(&association.target, options)?;
            let child = if association.kind.is_many() {
                Schema::array_of(target)
            } else {
                target.nullable()
            };
            schema = schema.key(association.name.clone(), child);
        }
    }

    Ok(schema)
}

fn column_schema(
    model: &ModelDefinition,
    name: &str,
    column: &Column,
) -> Result<Schema, SchemaConversionError> {
    let schema = type_schema(&column.column_type).ok_or_else(|| {
        SchemaConversionError::UnsupportedColumn {
            model: model.name().to_string(),
            column: name.to_string(),
            column_type: column.column_type.to_string(),
        }
    })?;

    Ok(if column.allow_null {
        schema.nullable()
    } else {
        schema
    })
}

fn type_schema(column_type: &ColumnType) -> Option<Schema> {
    let schema = match column_type {
        ColumnType::String(Some(len)) => Schema::string().max_length(*len),
        ColumnType::String(None) | ColumnType::Text => Schema::string(),
        ColumnType::Integer | ColumnType::BigInt => Schema::integer(),
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal => Schema::number(),
        ColumnType::Boolean => Schema::boolean(),
        ColumnType::Date | ColumnType::DateOnly => Schema::date(),
        ColumnType::Uuid => Schema::string().uuid(),
        ColumnType::Enum(values) => Schema::string().valid(values.iter().cloned()),
        ColumnType::Json => Schema::any(),
        ColumnType::Array(inner) => Schema::array_of(type_schema(inner)?),
        ColumnType::Unsupported(_) => return None,
    };
    Some(schema)
}
