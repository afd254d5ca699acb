//! HTTP registry client.
//!
//! Layout served by a registry:
//! - `GET <url>/components/<name>.json` - the component manifest
//! - `GET <url>/components/<name>/<path>` - a file of that component

use super::{ComponentFetcher, ComponentManifest};
use crate::constants::{ENV_HTTP_TIMEOUT_SECS, default_http_timeout};
use crate::core::OcxError;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

/// [`ComponentFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: reqwest::Client,
}

impl HttpRegistryClient {
    /// Builds a client using the default timeout, or `OCX_HTTP_TIMEOUT_SECS`
    /// when set to a positive integer.
    pub fn new() -> Result<Self> {
        let timeout = std::env::var(ENV_HTTP_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or_else(default_http_timeout, Duration::from_secs);
        Self::with_timeout(timeout)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ocx/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await.map_err(|e| OcxError::RegistryRequest {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcxError::RegistryRequest {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            }
            .into());
        }
        Ok(response)
    }
}

fn component_url(registry_url: &str, name: &str) -> String {
    format!("{}/components/{name}.json", registry_url.trim_end_matches('/'))
}

fn file_url(registry_url: &str, component: &str, path: &str) -> String {
    format!(
        "{}/components/{component}/{}",
        registry_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl ComponentFetcher for HttpRegistryClient {
    async fn fetch_component(&self, registry_url: &str, name: &str) -> Result<ComponentManifest> {
        let url = component_url(registry_url, name);
        let response = self.get(&url).await?;
        response
            .json::<ComponentManifest>()
            .await
            .with_context(|| format!("Invalid component manifest at {url}"))
    }

    async fn fetch_file(&self, registry_url: &str, component: &str, path: &str) -> Result<Vec<u8>> {
        let url = file_url(registry_url, component, path);
        let response = self.get(&url).await?;
        let bytes =
            response.bytes().await.with_context(|| format!("Failed to download {url}"))?;
        Ok(bytes.to_vec())
    }
}
