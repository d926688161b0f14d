//! HTTP client for Ollama servers

use crate::{
    endpoint::Endpoint,
    selector::{LivenessProbe, PROBE_CEILING},
    summary::{GenerationBackend, GenerationRequest},
    Error, Result,
};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Talks to Ollama's `/api/version` and `/api/generate`
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct OllamaClient {
    http_client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder().user_agent("git2wp/0.1").build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl LivenessProbe for OllamaClient {
    async fn check(&self, endpoint: &Endpoint) -> Result<Duration> {
        let url = endpoint.url("/api/version");
        debug!("Probing {}", url);

        let down = |reason: String| Error::ProbeUnreachable {
            endpoint: endpoint.name.clone(),
            reason,
        };

        let start = Instant::now();
        let response = self
            .http_client
            .get(&url)
            .timeout(PROBE_CEILING)
            .send()
            .await
            .map_err(|e| down(e.to_string()))?;
        let latency = start.elapsed();

        if response.status() != StatusCode::OK {
            return Err(down(format!("HTTP {}", response.status())));
        }

        Ok(latency)
    }
}

#[async_trait]
impl GenerationBackend for OllamaClient {
    async fn generate(&self, endpoint: &Endpoint, request: &GenerationRequest) -> Result<String> {
        let url = endpoint.url("/api/generate");
        debug!("Requesting summary from {} with model {}", url, endpoint.model);

        let failed = |reason: String| Error::GenerationFailed {
            endpoint: endpoint.name.clone(),
            reason,
        };

        let body = GenerateBody {
            model: &endpoint.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
        };

        let response = self
            .http_client
            .post(&url)
            .timeout(endpoint.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(failed(format!("HTTP {}: {}", status, text)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("unreadable response: {}", e)))?;

        if parsed.response.trim().is_empty() {
            return Err(failed("empty response".to_string()));
        }

        Ok(parsed.response)
    }
}
