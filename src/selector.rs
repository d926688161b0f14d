//! Backend selection: probe every endpoint, keep the fastest

use crate::{endpoint::Endpoint, Error, Result};
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info};
use std::time::Duration;

/// Upper bound for a single liveness check, independent of generation timeouts
pub const PROBE_CEILING: Duration = Duration::from_secs(5);

/// Liveness check against a single endpoint
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Returns the time from dispatch until the endpoint answered successfully.
    async fn check(&self, endpoint: &Endpoint) -> Result<Duration>;
}

/// Outcome of probing one endpoint in a selection round
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub endpoint: Endpoint,
    pub reachable: bool,
    /// `Duration::MAX` when unreachable, so it never ranks ahead of a live endpoint
    pub latency: Duration,
}

impl ProbeResult {
    pub fn reachable(endpoint: Endpoint, latency: Duration) -> Self {
        Self {
            endpoint,
            reachable: true,
            latency,
        }
    }

    pub fn unreachable(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            reachable: false,
            latency: Duration::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(Endpoint),
    NoneAvailable,
}

impl SelectionOutcome {
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            SelectionOutcome::Selected(endpoint) => Some(endpoint),
            SelectionOutcome::NoneAvailable => None,
        }
    }
}

/// Picks the fastest reachable endpoint
pub struct BackendSelector<P> {
    probe: P,
    ceiling: Duration,
}

impl<P: LivenessProbe> BackendSelector<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            ceiling: PROBE_CEILING,
        }
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Run one selection round
    ///
    /// All probes run concurrently and every one of them is awaited, so the
    /// round takes as long as the slowest probe (at most the ceiling).
    pub async fn select(&self, endpoints: &[Endpoint]) -> SelectionOutcome {
        if endpoints.is_empty() {
            debug!("No generation endpoints configured");
            return SelectionOutcome::NoneAvailable;
        }

        let results = self.probe_all(endpoints).await;
        let outcome = pick_fastest(&results);

        match &outcome {
            SelectionOutcome::Selected(endpoint) => {
                info!("Using {} ({})", endpoint.name, endpoint.base_url)
            }
            SelectionOutcome::NoneAvailable => {
                info!("None of {} endpoint(s) answered", endpoints.len())
            }
        }

        outcome
    }

    /// Probe every endpoint; results come back in registration order
    pub async fn probe_all(&self, endpoints: &[Endpoint]) -> Vec<ProbeResult> {
        join_all(endpoints.iter().map(|endpoint| self.probe_one(endpoint))).await
    }

    async fn probe_one(&self, endpoint: &Endpoint) -> ProbeResult {
        let checked = match tokio::time::timeout(self.ceiling, self.probe.check(endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(Error::ProbeUnreachable {
                endpoint: endpoint.name.clone(),
                reason: format!("no answer within {:?}", self.ceiling),
            }),
        };

        match checked {
            Ok(latency) => {
                debug!("{} answered in {:?}", endpoint.name, latency);
                ProbeResult::reachable(endpoint.clone(), latency)
            }
            Err(e) => {
                debug!("{}", e);
                ProbeResult::unreachable(endpoint.clone())
            }
        }
    }
}

/// Minimum latency among reachable results; the earliest result wins ties
pub fn pick_fastest(results: &[ProbeResult]) -> SelectionOutcome {
    let mut best: Option<&ProbeResult> = None;

    for result in results.iter().filter(|r| r.reachable) {
        match best {
            Some(current) if current.latency <= result.latency => {}
            _ => best = Some(result),
        }
    }

    best.map(|r| SelectionOutcome::Selected(r.endpoint.clone()))
        .unwrap_or(SelectionOutcome::NoneAvailable)
}
