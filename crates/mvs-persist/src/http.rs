//! HTTP transport for the remote persistence endpoint.

use std::time::Duration;

use async_trait::async_trait;
use mvs_types::{QueryRequest, StoreConfig, UpsertRecord};
use serde_json::Value;
use tracing::debug;

use crate::error::{PersistError, PersistResult};
use crate::traits::RemoteTransport;

/// Talks JSON over HTTP:
///
/// - `POST {api}/{repository}/persistence/{class}/list` with `{ "filters": … }`
/// - `POST {api}/{repository}/persistence` with `[{ name, type, properties }]`
pub struct HttpTransport {
    client: reqwest::Client,
    config: StoreConfig,
}

impl HttpTransport {
    pub fn new(config: StoreConfig) -> PersistResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PersistError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, url: &str, body: &B) -> PersistResult<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| PersistError::Transport(format!("HTTP request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PersistError::Status { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn list(&self, query: &QueryRequest) -> PersistResult<Vec<Value>> {
        let url = self.config.list_url(&query.model_class);
        debug!(url = %url, filters = query.filters.len(), "remote list");
        let body: Value = self
            .post(&url, query)
            .await?
            .json()
            .await
            .map_err(|e| PersistError::Transport(format!("failed to parse JSON response: {e}")))?;
        Ok(match body {
            Value::Array(records) => records,
            Value::Null => Vec::new(),
            other => vec![other],
        })
    }

    async fn upsert(&self, records: &[UpsertRecord]) -> PersistResult<()> {
        let url = self.config.persistence_url();
        debug!(url = %url, records = records.len(), "remote upsert");
        self.post(&url, records).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn config(api_base: &str) -> StoreConfig {
        StoreConfig {
            api_base: api_base.to_string(),
            request_timeout_secs: 2,
            ..StoreConfig::default()
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let transport = HttpTransport::new(config("http://127.0.0.1:1/api")).unwrap();
        let q = QueryRequest::new("TaskList", Map::new());
        assert!(matches!(transport.list(&q).await, Err(PersistError::Transport(_))));
    }

    #[tokio::test]
    async fn relative_default_base_fails_cleanly() {
        let transport = HttpTransport::new(StoreConfig::default()).unwrap();
        let r = UpsertRecord::new("list", "TaskList", serde_json::json!({}));
        assert!(matches!(transport.upsert(&[r]).await, Err(PersistError::Transport(_))));
    }
}
