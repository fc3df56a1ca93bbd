//! The validation engine seam and its bundled rule-tree implementation

use super::rules;
use crate::core::options::ValidationOptions;
use crate::core::schema::{Schema, SchemaKind};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;

/// One itemized validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetail {
    /// Dotted path of the offending value (`address.city`, `items.0.name`)
    pub path: String,
    pub message: String,
}

/// A value did not conform to its schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub details: Vec<ValidationDetail>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.details.iter().map(|d| d.message.as_str()).collect();
        write!(f, "{}", messages.join(". "))
    }
}

impl std::error::Error for ValidationFailure {}

/// Errors returned by a [`ValidationEngine`]
///
/// The variant tells callers how to treat the failure: `Invalid` is about the
/// data, `Fault` is about the engine or the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The value does not conform to the schema
    Invalid(ValidationFailure),

    /// The engine could not evaluate the schema
    Fault { message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Invalid(failure) => write!(f, "Validation failed: {}", failure),
            EngineError::Fault { message } => write!(f, "Validation engine fault: {}", message),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Invalid(failure) => Some(failure),
            EngineError::Fault { .. } => None,
        }
    }
}

/// Validates a value against a schema and returns the sanitized value
///
/// Middlewares receive their engine as a collaborator, so tests and
/// applications can substitute their own implementation.
#[async_trait]
pub trait ValidationEngine: Send + Sync {
    async fn validate(
        &self,
        value: Value,
        schema: &Schema,
        options: &ValidationOptions,
    ) -> Result<Value, EngineError>;
}

/// The bundled engine, interpreting [`Schema`] rule trees
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous entry point used by the async trait implementation
    pub fn run(
        &self,
        value: Value,
        schema: &Schema,
        options: &ValidationOptions,
    ) -> Result<Value, EngineError> {
        let mut walk = Walk {
            options,
            details: Vec::new(),
        };
        let mut path = Vec::new();
        let sanitized = walk.visit(Some(value), schema, &mut path)?;

        if walk.details.is_empty() {
            Ok(sanitized.unwrap_or(Value::Null))
        } else {
            Err(EngineError::Invalid(ValidationFailure {
                details: walk.details,
            }))
        }
    }
}

#[async_trait]
impl ValidationEngine for RuleEngine {
    async fn validate(
        &self,
        value: Value,
        schema: &Schema,
        options: &ValidationOptions,
    ) -> Result<Value, EngineError> {
        self.run(value, schema, options)
    }
}

struct Walk<'a> {
    options: &'a ValidationOptions,
    details: Vec<ValidationDetail>,
}

impl Walk<'_> {
    fn done(&self) -> bool {
        self.options.abort_early && !self.details.is_empty()
    }

    fn report(&mut self, path: &[String], message: String) {
        self.details.push(ValidationDetail {
            path: path.join("."),
            message,
        });
    }

    /// Returns the sanitized value, `None` when the value is absent
    fn visit(
        &mut self,
        value: Option<Value>,
        schema: &Schema,
        path: &mut Vec<String>,
    ) -> Result<Option<Value>, EngineError> {
        let label = label(path);

        let Some(value) = value else {
            if schema.is_required() {
                self.report(path, format!("\"{}\" is required", label));
            }
            return Ok(None);
        };

        if value.is_null() {
            if !schema.is_nullable() && !matches!(schema.kind(), SchemaKind::Any) {
                self.report(path, type_message(&label, schema.kind()));
            }
            return Ok(Some(value));
        }

        let value = match self.coerce(value, schema.kind()) {
            Ok(value) => value,
            Err(original) => {
                self.report(path, type_message(&label, schema.kind()));
                return Ok(Some(original));
            }
        };

        if !schema.allowed().is_empty() && !schema.allowed().contains(&value) {
            let allowed: Vec<String> = schema.allowed().iter().map(Value::to_string).collect();
            self.report(
                path,
                format!("\"{}\" must be one of [{}]", label, allowed.join(", ")),
            );
            return Ok(Some(value));
        }

        for constraint in schema.constraints() {
            if !rules::applies_to(constraint, schema.kind()) {
                return Err(EngineError::Fault {
                    message: format!(
                        "rule `{}` cannot apply to a {} schema at '{}'",
                        constraint.name(),
                        schema.kind().name(),
                        path.join(".")
                    ),
                });
            }
            if let Err(message) = rules::check(constraint, &label, &value) {
                self.report(path, message);
                if self.done() {
                    return Ok(Some(value));
                }
            }
        }

        match (schema.kind(), value) {
            (SchemaKind::Object(Some(keys)), Value::Object(map)) => {
                self.visit_object(map, keys, path).map(|v| Some(Value::Object(v)))
            }
            (SchemaKind::Array(Some(items)), Value::Array(values)) => {
                self.visit_array(values, items, path).map(|v| Some(Value::Array(v)))
            }
            (_, value) => Ok(Some(value)),
        }
    }

    fn visit_object(
        &mut self,
        mut input: Map<String, Value>,
        keys: &indexmap::IndexMap<String, Schema>,
        path: &mut Vec<String>,
    ) -> Result<Map<String, Value>, EngineError> {
        let mut output = Map::new();

        for (name, child) in keys {
            if self.done() {
                break;
            }
            path.push(name.clone());
            let sanitized = self.visit(input.remove(name), child, path)?;
            path.pop();
            if let Some(sanitized) = sanitized {
                output.insert(name.clone(), sanitized);
            }
        }

        // Whatever is left was not declared
        for (name, value) in input {
            if self.options.strip_unknown {
                continue;
            }
            if self.options.allow_unknown {
                output.insert(name, value);
                continue;
            }
            if self.done() {
                break;
            }
            path.push(name);
            let message = format!("\"{}\" is not allowed", label(path));
            self.report(path, message);
            path.pop();
        }

        Ok(output)
    }

    fn visit_array(
        &mut self,
        input: Vec<Value>,
        items: &Schema,
        path: &mut Vec<String>,
    ) -> Result<Vec<Value>, EngineError> {
        let mut output = Vec::with_capacity(input.len());
        for (index, value) in input.into_iter().enumerate() {
            if self.done() {
                break;
            }
            path.push(index.to_string());
            let sanitized = self.visit(Some(value), items, path)?;
            path.pop();
            output.push(sanitized.unwrap_or(Value::Null));
        }
        Ok(output)
    }

    /// Type-check `value`, casting strings when `convert` is on
    ///
    /// Gives the value back untouched as the error when it does not match.
    fn coerce(&self, value: Value, kind: &SchemaKind) -> Result<Value, Value> {
        let convert = self.options.convert;
        match (kind, value) {
            (SchemaKind::Any, value) => Ok(value),
            (SchemaKind::String, value @ Value::String(_)) => Ok(value),
            (SchemaKind::Number, value @ Value::Number(_)) => Ok(value),
            (SchemaKind::Number, Value::String(s)) if convert => parse_number(&s)
                .map(Value::Number)
                .ok_or(Value::String(s)),
            (SchemaKind::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    Ok(Value::Number(n))
                } else {
                    match n.as_f64().and_then(whole_i64) {
                        Some(i) if convert => Ok(Value::Number(Number::from(i))),
                        _ => Err(Value::Number(n)),
                    }
                }
            }
            (SchemaKind::Integer, Value::String(s)) if convert => parse_integer(&s)
                .map(Value::Number)
                .ok_or(Value::String(s)),
            (SchemaKind::Boolean, value @ Value::Bool(_)) => Ok(value),
            (SchemaKind::Boolean, Value::String(s)) if convert => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(Value::String(s)),
                }
            }
            (SchemaKind::Date, Value::String(s)) => {
                if is_date(&s) {
                    Ok(Value::String(s))
                } else {
                    Err(Value::String(s))
                }
            }
            (SchemaKind::Date, value @ Value::Number(_)) => Ok(value),
            (SchemaKind::Object(_), value @ Value::Object(_)) => Ok(value),
            (SchemaKind::Array(_), value @ Value::Array(_)) => Ok(value),
            (_, value) => Err(value),
        }
    }
}

fn label(path: &[String]) -> String {
    path.last().cloned().unwrap_or_else(|| "value".to_string())
}

fn type_message(label: &str, kind: &SchemaKind) -> String {
    let expected = match kind {
        SchemaKind::Any => "defined",
        SchemaKind::String => "a string",
        SchemaKind::Number => "a number",
        SchemaKind::Integer => "an integer",
        SchemaKind::Boolean => "a boolean",
        SchemaKind::Date => "a valid date",
        SchemaKind::Object(_) => "an object",
        SchemaKind::Array(_) => "an array",
    };
    format!("\"{}\" must be {}", label, expected)
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn parse_integer(s: &str) -> Option<Number> {
    let s = s.trim();
    s.parse::<i64>()
        .map(Number::from)
        .or_else(|_| s.parse::<u64>().map(Number::from))
        .ok()
}

/// Whole floats inside the i64 range; `as` would saturate outside it
fn whole_i64(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn is_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
