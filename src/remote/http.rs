use serde_json::Value;
use std::time::Duration;

use super::{RemoteError, RemoteStore};
use crate::store::{Collection, AUDIT_LOG_CAP};

/// REST client for the studiodesk server binary.
pub struct HttpRemoteStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/api/{}", self.base_url, collection.remote_name())
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }
}

#[async_trait::async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>, RemoteError> {
        let mut request = self
            .client
            .get(self.collection_url(collection))
            .bearer_auth(&self.api_key);
        // audit history is unbounded remotely; only the newest page matters
        if collection == Collection::AuditLog {
            request = request.query(&[("limit", AUDIT_LOG_CAP)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    async fn upsert(
        &self,
        collection: Collection,
        id: &str,
        doc: &Value,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(self.document_url(collection, id))
            .bearer_auth(&self.api_key)
            .json(doc)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() && response.status().as_u16() != 404 {
            return Err(RemoteError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Probes the server's health endpoint; used by the connectivity monitor.
pub async fn check_server(base_url: &str) -> bool {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();
    match client
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}
