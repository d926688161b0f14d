//! git2wp library
//!
//! Turns a git commit into a WordPress post. The summary is written by the
//! fastest reachable Ollama server, or built from a fixed template when no
//! server can do it.

pub mod cli;
pub mod commit;
pub mod endpoint;
pub mod error;
pub mod ollama;
pub mod selector;
pub mod summary;
pub mod template;
pub mod wordpress;

pub use commit::{ChangedFile, CommitDescriptor};
pub use endpoint::{Endpoint, EndpointRegistry};
pub use error::{Error, Result};
pub use ollama::OllamaClient;
pub use selector::{BackendSelector, SelectionOutcome};
pub use summary::{GeneratedSummary, SummaryGenerator, SummarySource};

/// Generation backend settings, as read from the environment
///
/// Every value is kept raw; [`EndpointRegistry::load`] decides how to
/// interpret missing or malformed entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub primary_url: Option<String>,
    pub primary_model: Option<String>,
    pub primary_timeout_ms: Option<String>,
    pub secondary_url: Option<String>,
    pub secondary_model: Option<String>,
    pub secondary_timeout_ms: Option<String>,
}

impl BackendConfig {
    /// Read `OLLAMA_*` / `SEC_OLLAMA_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            primary_url: lookup("OLLAMA_BASE_URL"),
            primary_model: lookup("DEFAULT_MODEL"),
            primary_timeout_ms: lookup("OLLAMA_TIMEOUT"),
            secondary_url: lookup("SEC_OLLAMA_BASE_URL"),
            secondary_model: lookup("SEC_DEFAULT_MODEL"),
            secondary_timeout_ms: lookup("SEC_OLLAMA_TIMEOUT"),
        }
    }

    pub fn with_primary(mut self, url: impl Into<String>) -> Self {
        self.primary_url = Some(url.into());
        self
    }

    pub fn with_primary_model(mut self, model: impl Into<String>) -> Self {
        self.primary_model = Some(model.into());
        self
    }

    pub fn with_primary_timeout_ms(mut self, timeout_ms: impl Into<String>) -> Self {
        self.primary_timeout_ms = Some(timeout_ms.into());
        self
    }

    pub fn with_secondary(mut self, url: impl Into<String>) -> Self {
        self.secondary_url = Some(url.into());
        self
    }

    pub fn with_secondary_model(mut self, model: impl Into<String>) -> Self {
        self.secondary_model = Some(model.into());
        self
    }

    pub fn with_secondary_timeout_ms(mut self, timeout_ms: impl Into<String>) -> Self {
        self.secondary_timeout_ms = Some(timeout_ms.into());
        self
    }
}
