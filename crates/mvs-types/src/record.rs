//! Remote persistence request shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record of a remote upsert: the store's name, its model type and its
/// whole state slice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpsertRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub properties: Value,
}

impl UpsertRecord {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, properties: Value) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            properties,
        }
    }
}

/// A filtered list query against one model class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Not part of the request body; selects the endpoint.
    #[serde(skip)]
    pub model_class: String,
    pub filters: Map<String, Value>,
}

impl QueryRequest {
    pub fn new(model_class: impl Into<String>, filters: Map<String, Value>) -> Self {
        Self {
            model_class: model_class.into(),
            filters,
        }
    }

    /// Returns `true` if every filter equals the record's same-named property.
    pub fn matches(&self, record: &Value) -> bool {
        self.filters
            .iter()
            .all(|(k, v)| record.get(k).is_some_and(|r| r == v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upsert_record_wire_shape() {
        let r = UpsertRecord::new("list", "TaskList", json!({"title": "x"}));
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"name": "list", "type": "TaskList", "properties": {"title": "x"}})
        );
    }

    #[test]
    fn query_body_has_only_filters() {
        let mut filters = Map::new();
        filters.insert("title".into(), json!("groceries"));
        let q = QueryRequest::new("TaskList", filters);
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"filters": {"title": "groceries"}})
        );
    }

    #[test]
    fn query_matching() {
        let mut filters = Map::new();
        filters.insert("title".into(), json!("a"));
        let q = QueryRequest::new("T", filters);
        assert!(q.matches(&json!({"title": "a", "other": 1})));
        assert!(!q.matches(&json!({"title": "b"})));
        assert!(!q.matches(&json!({})));
        assert!(QueryRequest::new("T", Map::new()).matches(&json!({})));
    }
}
