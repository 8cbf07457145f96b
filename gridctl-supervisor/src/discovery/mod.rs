//! Endpoint discovery
//!
//! [`ServiceDiscovery`] turns configured service endpoints into one stream of
//! execution targets. Computing information endpoints are probed for their
//! targets directly; registries are asked for further endpoints, which are fed
//! back into the same aggregator. Every endpoint is queried at most once per
//! aggregator, which also ends registry cycles.

pub mod consumer;

use gridctl_client::{RegistryService, TargetInfoService};
use gridctl_core::domain::endpoint::{Capability, Endpoint};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Semaphore, watch};
use tracing::{Instrument, Span, debug, warn};

use crate::config::Config;

pub use consumer::{DiscoveryConsumer, TargetCollector};

/// Progress of the query for one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Started,
    Successful,
    Failed,
}

/// Tuning of a discovery round
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Endpoint patterns (URL or host) never queried
    pub rejected: Vec<String>,
    /// Bound for each single query
    pub timeout: Duration,
    /// Queries in flight at once
    pub max_parallel: usize,
    pub span: Span,
}

impl DiscoveryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            rejected: config.rejected_services.clone(),
            timeout: config.timeout,
            max_parallel: config.max_parallel_queries.max(1),
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Aggregates registry walks and target probes
///
/// Cloning yields another handle on the same round.
#[derive(Clone)]
pub struct ServiceDiscovery {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<dyn RegistryService>,
    target_info: Arc<dyn TargetInfoService>,
    consumers: RwLock<Vec<Arc<dyn DiscoveryConsumer>>>,
    seen: Mutex<HashSet<String>>,
    statuses: Mutex<HashMap<String, QueryStatus>>,
    pending: watch::Sender<usize>,
    permits: Semaphore,
    options: DiscoveryOptions,
}

impl ServiceDiscovery {
    pub fn new(
        registry: Arc<dyn RegistryService>,
        target_info: Arc<dyn TargetInfoService>,
        options: DiscoveryOptions,
    ) -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                registry,
                target_info,
                consumers: RwLock::new(Vec::new()),
                seen: Mutex::new(HashSet::new()),
                statuses: Mutex::new(HashMap::new()),
                pending,
                permits: Semaphore::new(options.max_parallel.max(1)),
                options,
            }),
        }
    }

    /// Register a consumer for results arriving from now on
    pub fn add_consumer(&self, consumer: Arc<dyn DiscoveryConsumer>) {
        self.inner
            .consumers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(consumer);
    }

    /// Start querying `endpoint` in the background
    ///
    /// Endpoints that are rejected, already seen, or offer neither computing
    /// information nor a registry are skipped.
    pub fn add_endpoint(&self, endpoint: Endpoint) {
        let inner = &self.inner;
        let _entered = inner.options.span.enter();

        if inner.options.rejected.iter().any(|p| endpoint.matches(p)) {
            debug!(endpoint = %endpoint, "Skipping rejected service");
            return;
        }

        let probe = endpoint.has_capability(Capability::ComputingInfo);
        let walk = endpoint.has_capability(Capability::Registry);
        if !probe && !walk {
            debug!(endpoint = %endpoint, "Endpoint offers nothing to discover");
            return;
        }

        let identity = endpoint.identity();
        if !lock(&inner.seen).insert(identity.clone()) {
            return;
        }
        lock(&inner.statuses).insert(identity.clone(), QueryStatus::Started);
        inner.pending.send_modify(|n| *n += 1);

        let discovery = self.clone();
        let span = inner.options.span.clone();
        tokio::spawn(
            async move {
                let mut finished = QueryFinished {
                    inner: Arc::clone(&discovery.inner),
                    identity,
                    status: QueryStatus::Failed,
                };
                if discovery.query(&endpoint, probe, walk).await {
                    finished.status = QueryStatus::Successful;
                }
            }
            .instrument(span),
        );
    }

    /// Wait until every query, including recursively added ones, has finished
    pub async fn wait(&self) {
        let mut pending = self.inner.pending.subscribe();
        // The sender lives in `self`, so this only ends once the count is zero
        let _ = pending.wait_for(|n| *n == 0).await;
    }

    /// Query status of an endpoint seen by this round
    pub fn status(&self, endpoint: &Endpoint) -> Option<QueryStatus> {
        lock(&self.inner.statuses).get(&endpoint.identity()).copied()
    }

    /// Every endpoint seen by this round, with its status
    pub fn statuses(&self) -> Vec<(String, QueryStatus)> {
        let mut all: Vec<(String, QueryStatus)> = lock(&self.inner.statuses)
            .iter()
            .map(|(id, status)| (id.clone(), *status))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    async fn query(&self, endpoint: &Endpoint, probe: bool, walk: bool) -> bool {
        let inner = &self.inner;
        let Ok(_permit) = inner.permits.acquire().await else {
            return false;
        };
        let timeout = inner.options.timeout;
        let mut ok = true;

        if probe {
            match tokio::time::timeout(timeout, inner.target_info.query_targets(endpoint)).await {
                Ok(Ok(targets)) => {
                    debug!(endpoint = %endpoint, targets = targets.len(), "Probed computing service");
                    let consumers = self.consumers();
                    for target in &targets {
                        for consumer in &consumers {
                            consumer.on_target(target);
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(endpoint = %endpoint, "Target query failed: {}", e);
                    ok = false;
                }
                Err(_) => {
                    warn!(endpoint = %endpoint, "Target query timed out after {:?}", timeout);
                    ok = false;
                }
            }
        }

        if walk {
            match tokio::time::timeout(timeout, inner.registry.query_endpoints(endpoint)).await {
                Ok(Ok(found)) => {
                    debug!(registry = %endpoint, endpoints = found.len(), "Walked registry");
                    let consumers = self.consumers();
                    for next in found {
                        for consumer in &consumers {
                            consumer.on_endpoint(&next);
                        }
                        self.add_endpoint(next);
                    }
                }
                Ok(Err(e)) => {
                    warn!(registry = %endpoint, "Registry query failed: {}", e);
                    ok = false;
                }
                Err(_) => {
                    warn!(registry = %endpoint, "Registry query timed out after {:?}", timeout);
                    ok = false;
                }
            }
        }

        ok
    }

    fn consumers(&self) -> Vec<Arc<dyn DiscoveryConsumer>> {
        self.inner
            .consumers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Records the final status and releases the pending count, also when a
/// consumer panics
struct QueryFinished {
    inner: Arc<Inner>,
    identity: String,
    status: QueryStatus,
}

impl Drop for QueryFinished {
    fn drop(&mut self) {
        lock(&self.inner.statuses).insert(std::mem::take(&mut self.identity), self.status);
        self.inner.pending.send_modify(|n| *n -= 1);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
