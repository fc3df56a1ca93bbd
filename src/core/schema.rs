//! Declarative rule trees interpreted by a [`ValidationEngine`]
//!
//! A [`Schema`] describes the expected shape of one value. Schemas are built
//! fluently and are immutable once handed to a middleware:
//!
//! ```rust,ignore
//! let query = Schema::keys([
//!     ("num", Schema::number().required()),
//!     ("email", Schema::string().email()),
//! ]);
//! ```
//!
//! [`ValidationEngine`]: crate::core::validation::ValidationEngine

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value, json};

/// The type a schema expects
#[derive(Debug, Clone)]
pub enum SchemaKind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Date,
    /// `None` accepts any object; `Some` declares the known keys
    Object(Option<IndexMap<String, Schema>>),
    /// `None` accepts any items
    Array(Option<Box<Schema>>),
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Any => "any",
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Date => "date",
            SchemaKind::Object(_) => "object",
            SchemaKind::Array(_) => "array",
        }
    }
}

/// A rule applied after the type check succeeded
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Lower bound for numbers
    Min(f64),
    /// Upper bound for numbers
    Max(f64),
    /// Minimum length of strings (in characters) and arrays
    MinLength(u64),
    /// Maximum length of strings (in characters) and arrays
    MaxLength(u64),
    Email,
    Url,
    Uuid,
    Pattern(Regex),
}

impl Constraint {
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Min(_) => "min",
            Constraint::Max(_) => "max",
            Constraint::MinLength(_) => "min_length",
            Constraint::MaxLength(_) => "max_length",
            Constraint::Email => "email",
            Constraint::Url => "url",
            Constraint::Uuid => "uuid",
            Constraint::Pattern(_) => "pattern",
        }
    }

    fn describe(&self) -> Value {
        match self {
            Constraint::Min(limit) => json!({ "name": "min", "limit": limit }),
            Constraint::Max(limit) => json!({ "name": "max", "limit": limit }),
            Constraint::MinLength(limit) => json!({ "name": "min_length", "limit": limit }),
            Constraint::MaxLength(limit) => json!({ "name": "max_length", "limit": limit }),
            Constraint::Pattern(regex) => json!({ "name": "pattern", "regex": regex.as_str() }),
            other => json!({ "name": other.name() }),
        }
    }
}

/// A node of a rule tree
#[derive(Debug, Clone)]
pub struct Schema {
    kind: SchemaKind,
    required: bool,
    nullable: bool,
    constraints: Vec<Constraint>,
    valid: Vec<Value>,
    description: Option<String>,
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
            constraints: Vec::new(),
            valid: Vec::new(),
            description: None,
        }
    }

    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn date() -> Self {
        Self::of(SchemaKind::Date)
    }

    /// An object accepting any keys
    pub fn object() -> Self {
        Self::of(SchemaKind::Object(None))
    }

    /// An object with declared keys
    pub fn keys<K, I>(keys: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        let keys = keys.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::of(SchemaKind::Object(Some(keys)))
    }

    /// An array accepting any items
    pub fn array() -> Self {
        Self::of(SchemaKind::Array(None))
    }

    /// An array whose items must all match `items`
    pub fn array_of(items: Schema) -> Self {
        Self::of(SchemaKind::Array(Some(Box::new(items))))
    }

    /// Declare (or replace) one key; turns an open object into a keyed one
    pub fn key(mut self, name: impl Into<String>, schema: Schema) -> Self {
        match &mut self.kind {
            SchemaKind::Object(Some(keys)) => {
                keys.insert(name.into(), schema);
            }
            _ => {
                let mut keys = IndexMap::new();
                keys.insert(name.into(), schema);
                self.kind = SchemaKind::Object(Some(keys));
            }
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Accept `null` in addition to the declared type
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn min(self, limit: f64) -> Self {
        self.constrain(Constraint::Min(limit))
    }

    pub fn max(self, limit: f64) -> Self {
        self.constrain(Constraint::Max(limit))
    }

    pub fn min_length(self, limit: u64) -> Self {
        self.constrain(Constraint::MinLength(limit))
    }

    pub fn max_length(self, limit: u64) -> Self {
        self.constrain(Constraint::MaxLength(limit))
    }

    pub fn email(self) -> Self {
        self.constrain(Constraint::Email)
    }

    pub fn url(self) -> Self {
        self.constrain(Constraint::Url)
    }

    pub fn uuid(self) -> Self {
        self.constrain(Constraint::Uuid)
    }

    pub fn pattern(self, regex: Regex) -> Self {
        self.constrain(Constraint::Pattern(regex))
    }

    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Restrict the value to a fixed set of literals
    pub fn valid<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.valid.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn allowed(&self) -> &[Value] {
        &self.valid
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared keys, if this is a keyed object schema
    pub fn object_keys(&self) -> Option<&IndexMap<String, Schema>> {
        match &self.kind {
            SchemaKind::Object(keys) => keys.as_ref(),
            _ => None,
        }
    }

    /// Item schema, if this is an array schema with declared items
    pub fn items(&self) -> Option<&Schema> {
        match &self.kind {
            SchemaKind::Array(items) => items.as_deref(),
            _ => None,
        }
    }

    /// A JSON description of the rule tree, for documentation generators
    pub fn describe(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), json!(self.kind.name()));
        if self.required {
            out.insert("required".into(), json!(true));
        }
        if self.nullable {
            out.insert("nullable".into(), json!(true));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if !self.constraints.is_empty() {
            let rules = self.constraints.iter().map(Constraint::describe).collect();
            out.insert("rules".into(), Value::Array(rules));
        }
        if !self.valid.is_empty() {
            out.insert("valid".into(), Value::Array(self.valid.clone()));
        }
        match &self.kind {
            SchemaKind::Object(Some(keys)) => {
                let children = keys
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.describe()))
                    .collect();
                out.insert("keys".into(), Value::Object(children));
            }
            SchemaKind::Array(Some(items)) => {
                out.insert("items".into(), items.describe());
            }
            _ => {}
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_preserve_declaration_order() {
        let schema = Schema::keys([
            ("zeta", Schema::string()),
            ("alpha", Schema::number()),
        ]);
        let names: Vec<&str> = schema
            .object_keys()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_key_turns_open_object_into_keyed_object() {
        let schema = Schema::object().key("id", Schema::integer());
        assert!(schema.object_keys().unwrap().contains_key("id"));
    }

    #[test]
    fn test_flags() {
        let schema = Schema::string().required().nullable();
        assert!(schema.is_required());
        assert!(schema.is_nullable());
        assert!(!schema.optional().is_required());
    }

    #[test]
    fn test_describe_nested() {
        let schema = Schema::keys([
            ("name", Schema::string().max_length(123).required()),
            ("tags", Schema::array_of(Schema::string())),
        ]);

        assert_eq!(
            schema.describe(),
            json!({
                "type": "object",
                "keys": {
                    "name": {
                        "type": "string",
                        "required": true,
                        "rules": [{ "name": "max_length", "limit": 123 }]
                    },
                    "tags": { "type": "array", "items": { "type": "string" } }
                }
            })
        );
    }

    #[test]
    fn test_valid_literals() {
        let schema = Schema::string().valid(["draft", "published"]);
        assert_eq!(schema.allowed(), &[json!("draft"), json!("published")]);
    }
}
