use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Off-chain JSON documents referenced by metadata URIs.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// `Ok(None)` when the server answered with a non-success status.
    async fn fetch_json(&self, uri: &str) -> Result<Option<Value>>;
}

#[derive(Debug, Clone)]
pub struct HttpDocumentFetcher {
    client: Client,
}

impl HttpDocumentFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch_json(&self, uri: &str) -> Result<Option<Value>> {
        let response = self.client.get(uri).send().await?;

        if !response.status().is_success() {
            debug!("Metadata document {} answered {}", uri, response.status());
            return Ok(None);
        }

        Ok(Some(response.json::<Value>().await?))
    }
}

#[derive(Clone)]
pub struct ImageResolver {
    documents: Arc<dyn DocumentFetcher>,
    extensions: Vec<String>,
}

impl ImageResolver {
    pub fn new(documents: Arc<dyn DocumentFetcher>, extensions: Vec<String>) -> Self {
        Self { documents, extensions }
    }

    pub fn is_image_uri(&self, uri: &str) -> bool {
        self.extensions.iter().any(|ext| uri.ends_with(ext.as_str()))
    }

    /// The image URL for a metadata URI. Never fails: an unreachable or
    /// unexpected document yields an empty string.
    pub async fn resolve(&self, uri: &str) -> String {
        if self.is_image_uri(uri) {
            return uri.to_string();
        }

        match self.documents.fetch_json(uri).await {
            Ok(Some(document)) => document
                .get("image")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Ok(None) => String::new(),
            Err(e) => {
                warn!("Failed to resolve image from {}: {}", uri, e);
                String::new()
            }
        }
    }
}
