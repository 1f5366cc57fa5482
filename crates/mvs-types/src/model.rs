//! Model descriptors and property mappings.
//!
//! A [`ModelDescriptor`] is declared once per component type. It names the
//! schema used to derive default state, the ordered list of [`Mapping`]s that
//! bind store values to component properties, the schemas it composes, and
//! the property names used to filter remote loads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Where a mapped property takes its value from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingSource {
    /// Copy the store value under this key unchanged.
    Key(String),
    /// Evaluate this expression against the owning store's state.
    Expression(String),
}

/// Binds a state value, direct or derived, to a component property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMapping", into = "RawMapping")]
pub struct Mapping {
    /// The component property that receives the value.
    pub target: String,
    /// The value's origin.
    pub source: MappingSource,
}

impl Mapping {
    /// A direct-copy mapping: `target` receives `state[key]`.
    pub fn key(target: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: MappingSource::Key(key.into()),
        }
    }

    /// A derived mapping: `target` receives the value of `expression`.
    pub fn expression(target: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: MappingSource::Expression(expression.into()),
        }
    }

    /// The source key of a direct-copy mapping.
    pub fn source_key(&self) -> Option<&str> {
        match &self.source {
            MappingSource::Key(k) => Some(k),
            MappingSource::Expression(_) => None,
        }
    }

    /// The expression text of a derived mapping.
    pub fn expression_text(&self) -> Option<&str> {
        match &self.source {
            MappingSource::Key(_) => None,
            MappingSource::Expression(e) => Some(e),
        }
    }
}

/// Wire shape of a mapping: `{ "property", "value"? , "expression"? }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawMapping {
    property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
}

impl TryFrom<RawMapping> for Mapping {
    type Error = TypeError;

    fn try_from(raw: RawMapping) -> Result<Self, Self::Error> {
        match (raw.value, raw.expression) {
            (Some(key), None) => Ok(Mapping::key(raw.property, key)),
            (None, Some(expr)) => Ok(Mapping::expression(raw.property, expr)),
            (Some(_), Some(_)) => Err(TypeError::InvalidMapping {
                target: raw.property,
                reason: "both value and expression are set".into(),
            }),
            (None, None) => Err(TypeError::InvalidMapping {
                target: raw.property,
                reason: "one of value or expression is required".into(),
            }),
        }
    }
}

impl From<Mapping> for RawMapping {
    fn from(m: Mapping) -> Self {
        let (value, expression) = match m.source {
            MappingSource::Key(k) => (Some(k), None),
            MappingSource::Expression(e) => (None, Some(e)),
        };
        RawMapping {
            property: m.target,
            value,
            expression,
        }
    }
}

// ---------------------------------------------------------------------------
// ModelClass
// ---------------------------------------------------------------------------

/// The schema a model derives its defaults from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelClass {
    /// A schema identifier, resolved through a schema resolver.
    Id(String),
    /// A schema document given inline.
    Inline(Value),
}

impl ModelClass {
    /// The type name sent with remote upserts.
    ///
    /// Inline schemas use their `title` when present.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ModelClass::Id(id) => Some(id),
            ModelClass::Inline(schema) => schema.get("title").and_then(Value::as_str),
        }
    }
}

impl From<&str> for ModelClass {
    fn from(id: &str) -> Self {
        ModelClass::Id(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// ModelDescriptor
// ---------------------------------------------------------------------------

/// Per-component-type model declaration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_class: Option<ModelClass>,
    /// Ordered; insertion order is the tie-break priority.
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub ref_schemas: Vec<String>,
    /// Element properties sent as remote query filters. `None` means the
    /// store never queries; an empty list queries without filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<String>>,
}

impl ModelDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: impl Into<ModelClass>) -> Self {
        self.model_class = Some(class.into());
        self
    }

    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn with_ref_schema(mut self, id: impl Into<String>) -> Self {
        self.ref_schemas.push(id.into());
        self
    }

    pub fn with_filter(mut self, property: impl Into<String>) -> Self {
        self.filters.get_or_insert_with(Vec::new).push(property.into());
        self
    }

    /// Replace the filter list. An empty list still enables remote loading.
    pub fn with_filters<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = Some(properties.into_iter().map(Into::into).collect());
        self
    }
}

// ---------------------------------------------------------------------------
// StorageModes
// ---------------------------------------------------------------------------

/// Which persistence channels back a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageModes {
    pub local: bool,
    pub server: bool,
}

impl StorageModes {
    pub const NONE: StorageModes = StorageModes {
        local: false,
        server: false,
    };
    pub const LOCAL: StorageModes = StorageModes {
        local: true,
        server: false,
    };
    pub const SERVER: StorageModes = StorageModes {
        local: false,
        server: true,
    };

    /// Returns `true` if any channel is enabled.
    pub fn any(&self) -> bool {
        self.local || self.server
    }

    /// Parse an attribute value such as `"local"`, `"local server"` or
    /// `"local,server"`.
    pub fn parse(attr: &str) -> Result<Self, TypeError> {
        let mut modes = StorageModes::NONE;
        for token in attr
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            match token {
                "local" => modes.local = true,
                "server" => modes.server = true,
                other => return Err(TypeError::UnknownStorageMode(other.to_string())),
            }
        }
        Ok(modes)
    }
}

impl FromStr for StorageModes {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StorageModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.local {
            parts.push("local");
        }
        if self.server {
            parts.push("server");
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mapping_from_wire_shape() {
        let m: Mapping = serde_json::from_value(json!({"property": "title", "value": "title"})).unwrap();
        assert_eq!(m, Mapping::key("title", "title"));

        let e: Mapping =
            serde_json::from_value(json!({"property": "sum", "expression": "a + b"})).unwrap();
        assert_eq!(e.expression_text(), Some("a + b"));
        assert_eq!(e.source_key(), None);
    }

    #[test]
    fn mapping_requires_exactly_one_source() {
        let both = serde_json::from_value::<Mapping>(
            json!({"property": "x", "value": "a", "expression": "a"}),
        );
        assert!(both.is_err());
        let neither = serde_json::from_value::<Mapping>(json!({"property": "x"}));
        assert!(neither.is_err());
    }

    #[test]
    fn mapping_serializes_back() {
        let v = serde_json::to_value(Mapping::expression("sum", "a + b")).unwrap();
        assert_eq!(v, json!({"property": "sum", "expression": "a + b"}));
    }

    #[test]
    fn descriptor_from_json() {
        let d: ModelDescriptor = serde_json::from_value(json!({
            "modelClass": "TaskList",
            "refSchemas": ["TaskItem"],
            "mappings": [{"property": "title", "value": "title"}],
            "filters": ["title"]
        }))
        .unwrap();
        assert_eq!(d.model_class, Some(ModelClass::Id("TaskList".into())));
        assert_eq!(d.ref_schemas, vec!["TaskItem"]);
        assert_eq!(d.mappings.len(), 1);
        assert_eq!(d.filters, Some(vec!["title".to_string()]));
    }

    #[test]
    fn declared_empty_filters_differ_from_none() {
        let declared: ModelDescriptor = serde_json::from_value(json!({"filters": []})).unwrap();
        assert_eq!(declared.filters, Some(Vec::new()));
        assert_eq!(declared, ModelDescriptor::new().with_filters(Vec::<String>::new()));

        let absent: ModelDescriptor = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.filters, None);
        assert!(serde_json::to_value(&absent).unwrap().get("filters").is_none());
    }

    #[test]
    fn inline_model_class_type_name() {
        let class = ModelClass::Inline(json!({"title": "Counter", "type": "object"}));
        assert_eq!(class.type_name(), Some("Counter"));
        assert_eq!(ModelClass::Inline(json!({})).type_name(), None);
    }

    #[test]
    fn storage_modes_parse() {
        assert_eq!(StorageModes::parse("local").unwrap(), StorageModes::LOCAL);
        let both = StorageModes::parse("local server").unwrap();
        assert!(both.local && both.server);
        assert_eq!(StorageModes::parse("server,local").unwrap(), both);
        assert_eq!(StorageModes::parse("").unwrap(), StorageModes::NONE);
        assert!(StorageModes::parse("cloud").is_err());
        assert_eq!(both.to_string(), "local server");
    }
}
