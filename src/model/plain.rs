//! Handler-populated response data and its projection to plain JSON

use super::{ModelDefinition, ModelInstance};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Data a handler hands to the response validator
///
/// It may mix plain JSON with model instances, at any depth.
#[derive(Debug, Clone)]
pub enum ResponseData {
    Value(Value),
    Instance(Arc<dyn ModelInstance>),
    List(Vec<ResponseData>),
    Object(IndexMap<String, ResponseData>),
}

impl ResponseData {
    pub fn instance(instance: impl ModelInstance + 'static) -> Self {
        ResponseData::Instance(Arc::new(instance))
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResponseData>,
    {
        ResponseData::List(items.into_iter().map(Into::into).collect())
    }

    /// Serialize any value into plain response data
    pub fn serialize<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(ResponseData::Value)
    }

    /// Project instances to plain data, recursively
    ///
    /// Lists map element-wise, objects normalize their values, instances use
    /// their own projection and plain JSON passes through.
    pub fn to_plain_data(&self) -> Value {
        match self {
            ResponseData::Value(value) => value.clone(),
            ResponseData::Instance(instance) => instance.to_plain(),
            ResponseData::List(items) => {
                Value::Array(items.iter().map(ResponseData::to_plain_data).collect())
            }
            ResponseData::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_plain_data()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for ResponseData {
    fn from(value: Value) -> Self {
        ResponseData::Value(value)
    }
}

impl From<Arc<dyn ModelInstance>> for ResponseData {
    fn from(instance: Arc<dyn ModelInstance>) -> Self {
        ResponseData::Instance(instance)
    }
}

impl From<Vec<ResponseData>> for ResponseData {
    fn from(items: Vec<ResponseData>) -> Self {
        ResponseData::List(items)
    }
}

impl From<Record> for ResponseData {
    fn from(record: Record) -> Self {
        ResponseData::instance(record)
    }
}

/// A dynamically loaded row of a [`ModelDefinition`]
#[derive(Debug, Clone)]
pub struct Record {
    model: Arc<ModelDefinition>,
    values: Map<String, Value>,
}

impl Record {
    pub fn new(model: Arc<ModelDefinition>) -> Self {
        Self {
            model,
            values: Map::new(),
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn model(&self) -> &ModelDefinition {
        &self.model
    }
}

impl ModelInstance for Record {
    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn to_plain(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnType;
    use serde_json::json;

    fn user() -> Arc<ModelDefinition> {
        Arc::new(ModelDefinition::new("user").attribute("name", ColumnType::Text))
    }

    #[test]
    fn test_plain_json_passes_through() {
        let data = ResponseData::from(json!({ "body": "test" }));
        assert_eq!(data.to_plain_data(), json!({ "body": "test" }));
    }

    #[test]
    fn test_instance_uses_its_projection() {
        let data = ResponseData::from(Record::new(user()).set("id", 1).set("name", "hello"));
        assert_eq!(data.to_plain_data(), json!({ "id": 1, "name": "hello" }));
    }

    #[test]
    fn test_lists_map_element_wise() {
        let data = ResponseData::list([
            Record::new(user()).set("id", 1),
            Record::new(user()).set("id", 2),
        ]);
        assert_eq!(data.to_plain_data(), json!([{ "id": 1 }, { "id": 2 }]));
    }

    #[test]
    fn test_nested_instances_inside_objects() {
        let mut entries = IndexMap::new();
        entries.insert(
            "owner".to_string(),
            ResponseData::from(Record::new(user()).set("name", "ada")),
        );
        entries.insert("total".to_string(), ResponseData::from(json!(3)));

        let data = ResponseData::Object(entries);
        assert_eq!(
            data.to_plain_data(),
            json!({ "owner": { "name": "ada" }, "total": 3 })
        );
    }

    #[test]
    fn test_serialize_helper() {
        #[derive(Serialize)]
        struct Page {
            total: u32,
        }
        let data = ResponseData::serialize(&Page { total: 4 }).unwrap();
        assert_eq!(data.to_plain_data(), json!({ "total": 4 }));
    }

    #[test]
    fn test_record_accessors() {
        let record = Record::new(user()).set("name", "ada");
        assert_eq!(record.model_name(), "user");
        assert_eq!(record.get("name"), Some(&json!("ada")));
        assert_eq!(record.model().name(), "user");
    }
}
