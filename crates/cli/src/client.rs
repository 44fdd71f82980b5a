//! HTTP access to the snapshot endpoints served by the capacity agent

use anyhow::{Context, Result};
use async_trait::async_trait;
use capacity_lib::{
    health::components,
    source::{parse_snapshot, INTEGRATIONS_FILE, STORAGE_FILE, TENANTS_FILE},
    IntegrationsSnapshot, SnapshotSource, SourceError, StorageSnapshot, TenantsSnapshot,
};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// API client for the capacity agent
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        // Keep any path prefix when joining relative paths
        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET a path and return the raw body
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.base_url.join(path).context("Invalid path")?;
        debug!(url = %url, "Fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        let bytes = response.bytes().await.context("Failed to read response")?;
        Ok(bytes.to_vec())
    }
}

/// Snapshot source backed by the agent's raw snapshot endpoints
pub struct HttpSource {
    client: ApiClient,
}

impl HttpSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        name: &'static str,
        file: &str,
    ) -> Result<T, SourceError> {
        let bytes = self
            .client
            .get_bytes(&format!("api/{file}"))
            .await
            .map_err(|err| SourceError::Fetch {
                name,
                message: format!("{err:#}"),
            })?;
        parse_snapshot(name, &bytes)
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn tenants(&self) -> Result<TenantsSnapshot, SourceError> {
        self.fetch(components::TENANTS, TENANTS_FILE).await
    }

    async fn integrations(&self) -> Result<IntegrationsSnapshot, SourceError> {
        self.fetch(components::INTEGRATIONS, INTEGRATIONS_FILE).await
    }

    async fn storage(&self) -> Result<StorageSnapshot, SourceError> {
        self.fetch(components::STORAGE, STORAGE_FILE).await
    }
}
