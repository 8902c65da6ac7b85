//! One timed probe call per sample; failures become `None`.

use anyhow::Context;
use async_trait::async_trait;
use std::time::{Duration, Instant};

use super::sample::{ProbeTarget, Sample};
use crate::models::{BackendId, ProbeResponse};

/// Source of samples for the trial orchestrator
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Take one sample. Never fails: an unavailable sample is `None`.
    async fn sample(&self, target: &ProbeTarget) -> Option<Sample>;
}

/// Samples probe endpoints over HTTP
pub struct HttpSampler {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSampler {
    /// Create a new sampler
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, target: &ProbeTarget) -> String {
        format!("{}{}", self.base_url, target.path())
    }

    /// Backends registered on the probe server
    pub async fn list_backends(&self) -> anyhow::Result<Vec<BackendId>> {
        #[derive(serde::Deserialize)]
        struct BackendsResponse {
            backends: Vec<BackendId>,
        }

        let url = format!("{}/api/backends", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("Listing backends returned status: {}", response.status());
        }
        let body: BackendsResponse = response.json().await?;
        Ok(body.backends)
    }

    /// Issue the request and decode the body, timing the whole exchange
    async fn try_sample(&self, url: &str) -> anyhow::Result<Sample> {
        let start = Instant::now();

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Probe returned status: {}", response.status());
        }
        let body: ProbeResponse = response.json().await?;

        let elapsed = start.elapsed().as_millis() as u64;
        Ok(Sample::from_response(body, elapsed))
    }
}

#[async_trait]
impl SampleSource for HttpSampler {
    async fn sample(&self, target: &ProbeTarget) -> Option<Sample> {
        let url = self.url_for(target);
        match self.try_sample(&url).await {
            Ok(sample) => {
                tracing::debug!(
                    url = %url,
                    server_ms = sample.server_query_duration_ms,
                    e2e_ms = sample.end_to_end_ms,
                    cold = sample.is_cold_start,
                    "Sample taken"
                );
                Some(sample)
            }
            Err(e) => {
                // No retry: the trial keeps a gap for this scope
                tracing::warn!(url = %url, "Sample failed: {:#}", e);
                None
            }
        }
    }
}
