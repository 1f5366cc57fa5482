//! Default-state derivation from schema documents.
//!
//! A schema looks like
//!
//! ```json
//! { "type": "object",
//!   "allOf": [{ "$ref": "Base" }],
//!   "properties": { "title": { "type": "string" }, "owner": { "$ref": "Person" } } }
//! ```
//!
//! `allOf` entries are applied first, in declaration order, then the schema's
//! own properties. A property with a `$ref` gets a nested object built from
//! the referenced schema; any other property gets the default for its `type`.
//! Existing values are left alone unless the caller forces a reset.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::traits::SchemaResolver;

/// Nesting limit for `$ref`/`allOf` chains, which may be cyclic.
pub const MAX_DEPTH: usize = 32;

/// Strip a `$ref` down to the schema id: `"./model/TaskItem.json"` and
/// `"#/definitions/TaskItem"` both become `"TaskItem"`.
pub fn normalize_ref(reference: &str) -> &str {
    let tail = reference
        .rsplit(['/', '#'])
        .next()
        .unwrap_or(reference);
    tail.strip_suffix(".json").unwrap_or(tail)
}

/// The default value for a property schema's `type`.
pub fn type_default(property: &Value) -> Value {
    let ty = match property.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types.first().and_then(Value::as_str),
        _ => None,
    };
    match ty {
        Some("object") => Value::Object(Map::new()),
        Some("array") => Value::Array(Vec::new()),
        Some("string") => Value::String(String::new()),
        Some("number") => Value::from(0.0),
        Some("integer") => Value::from(0),
        Some("boolean") => Value::Bool(false),
        _ => Value::Null,
    }
}

/// Looks up referenced schemas: the model's preloaded `refSchemas` first,
/// then the resolver.
pub struct SchemaLookup<'a> {
    preloaded: HashMap<String, Value>,
    resolver: &'a dyn SchemaResolver,
}

impl<'a> SchemaLookup<'a> {
    /// Preload `ref_schemas` through `resolver`. Ids that cannot be resolved
    /// are skipped.
    pub fn new(resolver: &'a dyn SchemaResolver, ref_schemas: &[String]) -> Self {
        let mut preloaded = HashMap::new();
        for id in ref_schemas {
            let id = normalize_ref(id);
            match resolver.resolve(id) {
                Ok(Some(schema)) => {
                    preloaded.insert(id.to_string(), schema);
                }
                Ok(None) => debug!(id = %id, "referenced schema not found"),
                Err(e) => warn!(id = %id, error = %e, "failed to resolve referenced schema"),
            }
        }
        Self {
            preloaded,
            resolver,
        }
    }

    pub fn lookup(&self, reference: &str) -> Option<Value> {
        let id = normalize_ref(reference);
        if let Some(schema) = self.preloaded.get(id) {
            return Some(schema.clone());
        }
        match self.resolver.resolve(id) {
            Ok(found) => found,
            Err(e) => {
                warn!(id = %id, error = %e, "failed to resolve schema reference");
                None
            }
        }
    }
}

/// Fill `state` with defaults from `schema`.
///
/// Returns the top-level keys whose value was (re)written, so the caller can
/// layer externally supplied initial values over exactly those defaults.
pub fn apply_defaults(
    state: &mut Map<String, Value>,
    schema: &Value,
    lookup: &SchemaLookup<'_>,
    force: bool,
) -> Vec<String> {
    let mut applied = Vec::new();
    apply_object(state, schema, lookup, force, 0, &mut applied);
    applied
}

/// A fresh default object for `schema`.
pub fn default_object(schema: &Value, lookup: &SchemaLookup<'_>) -> Value {
    let mut state = Map::new();
    apply_defaults(&mut state, schema, lookup, false);
    Value::Object(state)
}

fn apply_object(
    state: &mut Map<String, Value>,
    schema: &Value,
    lookup: &SchemaLookup<'_>,
    force: bool,
    depth: usize,
    applied: &mut Vec<String>,
) {
    if depth > MAX_DEPTH {
        warn!(depth, "schema nesting too deep, defaults truncated");
        return;
    }
    if let Some(ty) = schema.get("type").and_then(Value::as_str) {
        if ty != "object" {
            debug!(ty = %ty, "schema is not an object, no defaults");
            return;
        }
    }

    if let Some(entries) = schema.get("allOf").and_then(Value::as_array) {
        for entry in entries {
            match entry.get("$ref").and_then(Value::as_str) {
                Some(reference) => match lookup.lookup(reference) {
                    Some(sub) => apply_object(state, &sub, lookup, force, depth + 1, applied),
                    None => debug!(reference = %reference, "allOf reference not found"),
                },
                None => apply_object(state, entry, lookup, force, depth + 1, applied),
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    for (key, property) in properties {
        let present = state.contains_key(key);

        if let Some(reference) = property.get("$ref").and_then(Value::as_str) {
            let sub = lookup.lookup(reference);
            if sub.is_none() {
                debug!(key = %key, reference = %reference, "property reference not found");
            }
            let fill_existing = !force && matches!(state.get(key), Some(Value::Object(_)));
            if fill_existing {
                // Fill an existing nested object without touching its values.
                if let (Some(Value::Object(existing)), Some(sub)) = (state.get_mut(key), &sub) {
                    let mut nested = Vec::new();
                    apply_object(existing, sub, lookup, false, depth + 1, &mut nested);
                }
            } else if force || !present {
                let mut nested = Map::new();
                if let Some(sub) = &sub {
                    let mut ignored = Vec::new();
                    apply_object(&mut nested, sub, lookup, force, depth + 1, &mut ignored);
                }
                state.insert(key.clone(), Value::Object(nested));
                push_unique(applied, key);
            }
            continue;
        }

        if force || !present {
            state.insert(key.clone(), type_default(property));
            push_unique(applied, key);
        }
    }
}

fn push_unique(applied: &mut Vec<String>, key: &str) {
    if !applied.iter().any(|k| k == key) {
        applied.push(key.to_string());
    }
}
