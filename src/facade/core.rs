//! Shared facade machinery.
//!
//! # Responsibilities
//! - Retry wrapped calls with exponential backoff
//! - Fail fast while the circuit breaker is open
//! - Serve and populate the TTL cache
//! - Bound health probes with a timeout
//! - Fan batches out over a bounded worker pool
//! - Keep per-facade metrics
//!
//! # Design Decisions
//! - Breaker and metrics live behind short-lived std locks; the service call
//!   itself always runs with no lock held
//! - Retries count each attempt as a request, so `total_requests` is the
//!   number of times the service was actually contacted
//! - Only successful results are cached

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::metrics::{CircuitSnapshot, FacadeMetrics, FacadeSnapshot};
use crate::config::{OrchestratorConfig, RetryConfig};
use crate::error::{BoxError, FacadeError};
use crate::health::ServiceHealth;
use crate::observability::metrics as telemetry;
use crate::resilience::cache::Lookup;
use crate::resilience::{Admission, CircuitBreakerState, RetryPolicy, TtlCache};
use crate::sync::lock;

/// State shared by every concrete facade.
pub struct FacadeCore {
    name: String,
    breaker: Mutex<CircuitBreakerState>,
    metrics: Mutex<FacadeMetrics>,
    cache: TtlCache,
    workers: Arc<Semaphore>,
    probe_timeout: Duration,
    retry_limits: RetryConfig,
}

impl FacadeCore {
    pub fn new(name: impl Into<String>, config: &OrchestratorConfig) -> Self {
        Self {
            name: name.into(),
            breaker: Mutex::new(CircuitBreakerState::from_config(&config.circuit_breaker)),
            metrics: Mutex::new(FacadeMetrics::default()),
            cache: TtlCache::new(),
            workers: Arc::new(Semaphore::new(config.facade.batch_workers.max(1))),
            probe_timeout: Duration::from_secs(config.facade.probe_timeout_secs),
            retry_limits: config.retries.clone(),
        }
    }

    /// Replace the breaker built from configuration.
    pub fn with_circuit_breaker(self, breaker: CircuitBreakerState) -> Self {
        Self {
            breaker: Mutex::new(breaker),
            ..self
        }
    }

    pub fn with_probe_timeout(self, probe_timeout: Duration) -> Self {
        Self {
            probe_timeout,
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Retry policy for one operation, capped by the shared limits.
    pub fn policy(&self, max_retries: u32, base_delay_ms: u64) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(base_delay_ms))
            .with_limits(&self.retry_limits)
    }

    /// Run `op` under the breaker, retrying failures per `policy`.
    ///
    /// The breaker is consulted before every attempt. After the last failed
    /// attempt the service's own error is returned unchanged.
    pub async fn call<T, F, Fut>(
        &self,
        operation: &'static str,
        policy: &RetryPolicy,
        mut op: F,
    ) -> Result<T, FacadeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            self.admit(operation)?;

            let started = Instant::now();
            let outcome = op().await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(value) => {
                    self.on_success(operation, elapsed);
                    return Ok(value);
                }
                Err(err) => {
                    self.on_failure(operation, elapsed);

                    if attempt + 1 >= attempts {
                        tracing::error!(
                            service = %self.name,
                            operation,
                            attempts,
                            error = %err,
                            "Operation failed after all retries"
                        );
                        return Err(FacadeError::Service(err));
                    }

                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        service = %self.name,
                        operation,
                        attempt = attempt + 1,
                        attempts,
                        delay = ?delay,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn admit(&self, operation: &'static str) -> Result<(), FacadeError> {
        let admission = lock(&self.breaker).try_acquire(Instant::now());
        match admission {
            Admission::Allowed => Ok(()),
            Admission::Trial => {
                tracing::info!(service = %self.name, operation, "Circuit half-open, sending trial call");
                Ok(())
            }
            Admission::Rejected { retry_in } => {
                lock(&self.metrics).rejected_requests += 1;
                telemetry::record_circuit_open(&self.name);
                telemetry::record_facade_call(&self.name, operation, "rejected", Duration::ZERO);
                tracing::debug!(service = %self.name, operation, retry_in = ?retry_in, "Circuit open, failing fast");
                Err(FacadeError::CircuitOpen {
                    service: self.name.clone(),
                    retry_in,
                })
            }
        }
    }

    fn on_success(&self, operation: &'static str, elapsed: Duration) {
        let recovered = {
            let mut breaker = lock(&self.breaker);
            let was_open = breaker.is_open;
            breaker.record_success();
            was_open
        };
        lock(&self.metrics).record_success(elapsed);
        telemetry::record_facade_call(&self.name, operation, "success", elapsed);

        if recovered {
            tracing::info!(service = %self.name, "Circuit closed after successful trial");
        }
    }

    fn on_failure(&self, operation: &'static str, elapsed: Duration) {
        let (opened, failures) = {
            let mut breaker = lock(&self.breaker);
            let opened = breaker.record_failure(Instant::now());
            (opened, breaker.failure_count)
        };
        lock(&self.metrics).record_failure();
        telemetry::record_facade_call(&self.name, operation, "failure", elapsed);

        if opened {
            tracing::warn!(
                service = %self.name,
                failures,
                "Circuit breaker opened"
            );
        }
    }

    /// Return the cached value under `key`, or run `load` and cache its
    /// successful result for `ttl`.
    pub async fn cached<T, F, Fut>(&self, key: &str, ttl: Duration, load: F) -> Result<T, FacadeError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FacadeError>>,
    {
        if let Lookup::Hit(value) = self.cache.lookup::<T>(key) {
            lock(&self.metrics).cache_hits += 1;
            telemetry::record_cache_event(&self.name, "hit");
            return Ok(value);
        }

        lock(&self.metrics).cache_misses += 1;
        telemetry::record_cache_event(&self.name, "miss");

        let value = load().await?;
        self.cache.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Drop every cached entry in `namespace`.
    pub fn invalidate_namespace(&self, namespace: &str) {
        let removed = self.cache.invalidate_namespace(namespace);
        if removed > 0 {
            tracing::debug!(service = %self.name, namespace, removed, "Cache namespace invalidated");
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!(service = %self.name, "Cache cleared");
    }

    /// Evaluate `probe` under the probe timeout.
    ///
    /// An open breaker short-circuits to UNHEALTHY without running the
    /// probe. Errors and timeouts are UNHEALTHY; `Ok(false)` is DEGRADED.
    pub async fn health_check<Fut>(&self, probe: Fut) -> ServiceHealth
    where
        Fut: Future<Output = Result<bool, BoxError>>,
    {
        let rejecting = lock(&self.breaker).is_rejecting(Instant::now());

        let health = if rejecting {
            tracing::debug!(service = %self.name, "Circuit open, skipping probe");
            ServiceHealth::Unhealthy
        } else {
            match tokio::time::timeout(self.probe_timeout, probe).await {
                Ok(Ok(true)) => ServiceHealth::Healthy,
                Ok(Ok(false)) => ServiceHealth::Degraded,
                Ok(Err(e)) => {
                    tracing::warn!(service = %self.name, error = %e, "Health probe failed");
                    ServiceHealth::Unhealthy
                }
                Err(_) => {
                    tracing::warn!(service = %self.name, timeout = ?self.probe_timeout, "Health probe timed out");
                    ServiceHealth::Unhealthy
                }
            }
        };

        let mut metrics = lock(&self.metrics);
        metrics.last_health_check = Some(unix_now());
        metrics.last_health = health;
        health
    }

    /// Run every operation on the facade's worker pool.
    ///
    /// Each slot holds the operation's value, or `None` if it failed or
    /// panicked. Output order matches input order.
    pub async fn batch_execute<T, E, F, Fut>(&self, operations: Vec<F>) -> Vec<Option<T>>
    where
        T: Send + 'static,
        E: std::fmt::Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut results: Vec<Option<T>> = operations.iter().map(|_| None).collect();
        let mut set = JoinSet::new();

        for (index, op) in operations.into_iter().enumerate() {
            let workers = Arc::clone(&self.workers);
            set.spawn(async move {
                // The pool is never closed, so acquire only fails if it is dropped.
                let _permit = workers.acquire_owned().await.ok();
                (index, op().await)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(value))) => results[index] = Some(value),
                Ok((index, Err(e))) => {
                    tracing::warn!(service = %self.name, index, error = %e, "Batch item failed");
                }
                Err(e) => {
                    tracing::warn!(service = %self.name, error = %e, "Batch item panicked");
                }
            }
        }
        results
    }

    pub fn snapshot(&self) -> FacadeSnapshot {
        let circuit = {
            let breaker = lock(&self.breaker);
            CircuitSnapshot {
                state: breaker.state(Instant::now()),
                failure_count: breaker.failure_count,
                failure_threshold: breaker.failure_threshold,
                recovery_timeout_secs: breaker.recovery_timeout.as_secs(),
            }
        };
        let metrics = lock(&self.metrics).clone();
        FacadeSnapshot {
            service: self.name.clone(),
            cache_hit_ratio: metrics.cache_hit_ratio(),
            metrics,
            cache_entries: self.cache.len(),
            circuit,
        }
    }

    pub fn last_health(&self) -> ServiceHealth {
        lock(&self.metrics).last_health
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
