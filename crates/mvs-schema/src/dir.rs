//! Directory-backed schema resolver: one `<id>.json` file per model class.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::traits::SchemaResolver;

/// Reads schemas from `<dir>/<id>.json`.
#[derive(Clone, Debug)]
pub struct DirSchemaResolver {
    dir: PathBuf,
}

impl DirSchemaResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> SchemaResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(SchemaError::InvalidId { id: id.to_string() });
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

fn parse(id: &str, text: &str) -> SchemaResult<Option<Value>> {
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| SchemaError::Malformed {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl SchemaResolver for DirSchemaResolver {
    fn resolve(&self, id: &str) -> SchemaResult<Option<Value>> {
        let path = self.path_for(id)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => parse(id, &text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(id = %id, path = %path.display(), "schema file not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_async(&self, id: &str) -> SchemaResult<Option<Value>> {
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => parse(id, &text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver_with(files: &[(&str, &str)]) -> (tempfile::TempDir, DirSchemaResolver) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let resolver = DirSchemaResolver::new(dir.path());
        (dir, resolver)
    }

    #[test]
    fn reads_schema_files() {
        let (_dir, resolver) = resolver_with(&[("TaskItem.json", r#"{"type":"object"}"#)]);
        assert_eq!(resolver.resolve("TaskItem").unwrap(), Some(json!({"type": "object"})));
        assert_eq!(resolver.resolve("Missing").unwrap(), None);
    }

    #[test]
    fn rejects_path_like_ids() {
        let (_dir, resolver) = resolver_with(&[]);
        assert!(matches!(resolver.resolve("../x"), Err(SchemaError::InvalidId { .. })));
        assert!(matches!(resolver.resolve(""), Err(SchemaError::InvalidId { .. })));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let (_dir, resolver) = resolver_with(&[("Bad.json", "{not json")]);
        assert!(matches!(resolver.resolve("Bad"), Err(SchemaError::Malformed { .. })));
    }

    #[tokio::test]
    async fn async_reads() {
        let (_dir, resolver) = resolver_with(&[("TaskList.json", r#"{"title":"TaskList"}"#)]);
        assert_eq!(
            resolver.resolve_async("TaskList").await.unwrap(),
            Some(json!({"title": "TaskList"}))
        );
        assert_eq!(resolver.resolve_async("Nope").await.unwrap(), None);
    }
}
