//! Generation endpoints resolved from configuration

use crate::BackendConfig;
use log::warn;
use std::time::Duration;

/// Timeout used when a slot has none configured (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Model used when a slot has none configured
pub const DEFAULT_MODEL: &str = "llama3:latest";

/// A configured Ollama server
///
/// Two endpoints are the same endpoint when their base URLs match.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path such as `/api/version`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url
    }
}

impl Eq for Endpoint {}

/// Read-only set of endpoints, in registration order
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    /// Resolve the primary and secondary slots
    ///
    /// A slot only counts when its URL is non-empty. This never fails: a
    /// timeout that is not a number is replaced by [`DEFAULT_TIMEOUT_MS`].
    pub fn load(config: &BackendConfig) -> Self {
        let slots = [
            (
                "Primary Ollama Server",
                &config.primary_url,
                &config.primary_model,
                &config.primary_timeout_ms,
            ),
            (
                "Secondary Ollama Server",
                &config.secondary_url,
                &config.secondary_model,
                &config.secondary_timeout_ms,
            ),
        ];

        let endpoints = slots
            .into_iter()
            .filter_map(|(name, url, model, timeout_ms)| {
                let url = url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
                let model = model
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_MODEL);

                Some(
                    Endpoint::new(name, url)
                        .with_model(model)
                        .with_timeout(parse_timeout(name, timeout_ms.as_deref())),
                )
            })
            .collect();

        Self { endpoints }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }
}

fn parse_timeout(slot: &str, raw: Option<&str>) -> Duration {
    let millis = match raw.map(str::trim) {
        None | Some("") => DEFAULT_TIMEOUT_MS,
        Some(value) => value.parse::<u64>().unwrap_or_else(|_| {
            warn!(
                "{}: timeout '{}' is not a number of milliseconds, using {}",
                slot, value, DEFAULT_TIMEOUT_MS
            );
            DEFAULT_TIMEOUT_MS
        }),
    };
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_has_no_endpoints() {
        let registry = EndpointRegistry::load(&BackendConfig::default());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_blank_url_disables_slot() {
        let config = BackendConfig::default()
            .with_primary("   ")
            .with_secondary("http://backup:11434");

        let registry = EndpointRegistry::load(&config);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.endpoints()[0].name, "Secondary Ollama Server");
    }

    #[test]
    fn test_defaults_applied() {
        let config = BackendConfig::default().with_primary("http://localhost:11434/");
        let registry = EndpointRegistry::load(&config);
        let endpoint = &registry.endpoints()[0];

        assert_eq!(endpoint.name, "Primary Ollama Server");
        assert_eq!(endpoint.base_url, "http://localhost:11434");
        assert_eq!(endpoint.model, DEFAULT_MODEL);
        assert_eq!(endpoint.timeout, Duration::from_millis(30_000));
        assert_eq!(endpoint.url("/api/version"), "http://localhost:11434/api/version");
    }

    #[test]
    fn test_both_slots_in_registration_order() {
        let config = BackendConfig::default()
            .with_primary("http://a:11434")
            .with_primary_model("llama3:8b")
            .with_primary_timeout_ms("1500")
            .with_secondary("http://b:11434")
            .with_secondary_model("mistral");

        let registry = EndpointRegistry::load(&config);
        let endpoints = registry.endpoints();

        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].base_url, "http://a:11434");
        assert_eq!(endpoints[0].model, "llama3:8b");
        assert_eq!(endpoints[0].timeout, Duration::from_millis(1500));
        assert_eq!(endpoints[1].base_url, "http://b:11434");
        assert_eq!(endpoints[1].model, "mistral");
        assert_eq!(endpoints[1].timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_malformed_timeout_falls_back_to_default() {
        let config = BackendConfig::default()
            .with_primary("http://a:11434")
            .with_primary_timeout_ms("thirty seconds");

        let registry = EndpointRegistry::load(&config);

        assert_eq!(
            registry.endpoints()[0].timeout,
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_identity_is_base_url() {
        let a = Endpoint::new("one", "http://host:11434").with_model("x");
        let b = Endpoint::new("two", "http://host:11434/").with_model("y");
        assert_eq!(a, b);
    }
}
