//! Fetch manifests from a static HTTP host

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::ShardFetcher;
use crate::builder::ROOT_FILE;
use crate::model::{GlobalRoot, Shard, ShardId};
use crate::{Error, Result};

/// Reads `{base}/root.json` and `{base}/{shard}.json`
pub struct HttpShardFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpShardFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(base_url, client))
    }

    /// Use a preconfigured client (proxies, TLS roots, headers)
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        HttpShardFetcher {
            base_url: base_url.into(),
            client,
        }
    }

    /// Build the full URL for a manifest file
    fn url(&self, file: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file)
    }

    /// GET and decode; `Ok(None)` on 404
    async fn get_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let url = self.url(file);
        debug!(url = %url, "fetching manifest");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!("GET {} failed: {} {}", url, status, text)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

#[async_trait]
impl ShardFetcher for HttpShardFetcher {
    async fn fetch_root(&self) -> Result<GlobalRoot> {
        self.get_json(ROOT_FILE)
            .await?
            .ok_or_else(|| Error::Construction(format!("no root manifest at {}", self.url(ROOT_FILE))))
    }

    async fn fetch_shard(&self, id: &ShardId) -> Result<Shard> {
        self.get_json(&id.file_name())
            .await?
            .ok_or_else(|| Error::ShardNotFound(id.to_string()))
    }
}
