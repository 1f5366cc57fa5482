use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// Repository used when no configuration names one.
pub const DEFAULT_REPOSITORY: &str = "default";
/// Conventional relative location of the REST API.
pub const DEFAULT_API_BASE: &str = "../../../api/rest";

/// Store-wide configuration shared by every node of a tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Repository identifier used in remote persistence URLs.
    pub repository: String,
    /// Base URL of the REST API.
    pub api_base: String,
    /// Directory holding `<modelClass>.json` schema documents.
    pub schema_dir: PathBuf,
    /// Directory holding local snapshots, one `<root name>.json` each.
    pub local_dir: PathBuf,
    /// Timeout applied to each remote request.
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            schema_dir: PathBuf::from("model"),
            local_dir: PathBuf::from(".mvstore"),
            request_timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, TypeError> {
        toml::from_str(s).map_err(|e| TypeError::Config(e.to_string()))
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TypeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TypeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Resolve the repository from an external configuration object of shape
    /// `{ "MEVEO": { "REPOSITORY": "..." } }`, falling back to `"default"`.
    pub fn repository_from(external: &Value) -> String {
        external
            .get("MEVEO")
            .and_then(|m| m.get("REPOSITORY"))
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REPOSITORY)
            .to_string()
    }

    /// Apply an external configuration object on top of this config.
    pub fn with_external(mut self, external: &Value) -> Self {
        self.repository = Self::repository_from(external);
        self
    }

    /// Endpoint of the filtered list query for `model_class`.
    pub fn list_url(&self, model_class: &str) -> String {
        format!(
            "{}/{}/persistence/{}/list",
            self.api_base.trim_end_matches('/'),
            self.repository,
            model_class
        )
    }

    /// Endpoint of the upsert request.
    pub fn persistence_url(&self) -> String {
        format!(
            "{}/{}/persistence",
            self.api_base.trim_end_matches('/'),
            self.repository
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.repository, "default");
        assert_eq!(c.api_base, "../../../api/rest");
        assert_eq!(c.request_timeout_secs, 30);
    }

    #[test]
    fn urls() {
        let c = StoreConfig {
            api_base: "https://example.org/api/rest/".into(),
            repository: "demo".into(),
            ..Default::default()
        };
        assert_eq!(
            c.list_url("TaskList"),
            "https://example.org/api/rest/demo/persistence/TaskList/list"
        );
        assert_eq!(c.persistence_url(), "https://example.org/api/rest/demo/persistence");
    }

    #[test]
    fn repository_from_external_object() {
        let ext = json!({"MEVEO": {"REPOSITORY": "tasks"}});
        assert_eq!(StoreConfig::repository_from(&ext), "tasks");
        assert_eq!(StoreConfig::repository_from(&json!({})), "default");
        assert_eq!(StoreConfig::repository_from(&json!({"MEVEO": {}})), "default");
        assert_eq!(StoreConfig::default().with_external(&ext).repository, "tasks");
    }

    #[test]
    fn partial_toml() {
        let c = StoreConfig::from_toml_str("repository = \"acme\"\n").unwrap();
        assert_eq!(c.repository, "acme");
        assert_eq!(c.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = StoreConfig::from_toml_str("repository = ").unwrap_err();
        assert!(matches!(err, TypeError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "api_base = \"http://localhost:8080/api/rest\"").unwrap();
        let c = StoreConfig::load(f.path()).unwrap();
        assert_eq!(c.api_base, "http://localhost:8080/api/rest");
        assert!(StoreConfig::load("/definitely/not/here.toml").is_err());
    }
}
