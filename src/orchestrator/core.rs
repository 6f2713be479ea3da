//! The service orchestrator.
//!
//! # Responsibilities
//! - Register services and build their facades eagerly
//! - Compute a dependency-respecting initialization order
//! - Run bounded health-check cycles and derive the overall status
//! - Own the monitor and metrics loops, and stop them on shutdown
//!
//! # Health cycle
//! ```text
//! perform_health_checks()
//!     → skipped (cached map returned) if a cycle is running or ran < min_interval ago
//!     → critical services, one at a time, each under critical_timeout
//!         timeout / panic → UNHEALTHY
//!     → non-critical services on a small pool, each under non_critical_timeout,
//!       all under non_critical_wait
//!         timeout / panic / still running at the wait bound → DEGRADED
//!     → health map, recovery trackers, overall status, metrics
//! ```
//!
//! # Design Decisions
//! - Cheap clonable handle around shared state; no global instance
//! - Fast init: startup only checks that facades exist, probing is left to
//!   the first monitor cycle
//! - std locks only, never held across an await

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::Instrument;

use super::graph::DependencyGraph;
use super::registry::{Registry, ServiceConfig};
use super::report::{
    ComprehensiveMetrics, DashboardEntry, HealthCounts, HealthDashboard, ServiceReport,
    ShutdownReport,
};
use crate::config::OrchestratorConfig;
use crate::error::{BoxError, OrchestratorError, Result};
use crate::facade::{Facade, FacadeConstructor};
use crate::health::{
    derive_status, HealthMonitor, MetricsCollector, ServiceHealth, ServiceRecoveryTracker,
    ServiceStatus, Transition,
};
use crate::lifecycle::{LifecyclePhase, Shutdown};
use crate::observability::metrics as telemetry;
use crate::resilience::backoff::calculate_backoff;
use crate::sync::{lock, read, write};

const INIT_RETRY_BASE: Duration = Duration::from_millis(100);
const INIT_RETRY_MAX: Duration = Duration::from_secs(2);

/// Handle to the orchestrator. Clones share the same state.
#[derive(Clone)]
pub struct ServiceOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    config: OrchestratorConfig,
    registry: RwLock<Registry>,
    facades: RwLock<HashMap<String, Arc<dyn Facade>>>,
    health: RwLock<HashMap<String, ServiceHealth>>,
    trackers: Mutex<HashMap<String, ServiceRecoveryTracker>>,
    state: Mutex<RunState>,
    check_in_progress: AtomicBool,
    shutdown: Shutdown,
    tasks: Mutex<Vec<BackgroundTask>>,
}

struct RunState {
    phase: LifecyclePhase,
    init_order: Vec<String>,
    critical_init_failed: bool,
    cycles: u64,
    skipped: u64,
    last_check: Option<Instant>,
    last_status: ServiceStatus,
}

struct BackgroundTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// Clears the in-progress flag however the cycle ends.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ServiceOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry: RwLock::new(Registry::default()),
                facades: RwLock::new(HashMap::new()),
                health: RwLock::new(HashMap::new()),
                trackers: Mutex::new(HashMap::new()),
                state: Mutex::new(RunState {
                    phase: LifecyclePhase::Created,
                    init_order: Vec::new(),
                    critical_init_failed: false,
                    cycles: 0,
                    skipped: 0,
                    last_check: None,
                    last_status: ServiceStatus::Initializing,
                }),
                check_in_progress: AtomicBool::new(false),
                shutdown: Shutdown::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    /// Register `service` under `name` with default interval and retries.
    pub async fn register_service<S>(
        &self,
        name: &str,
        service: Arc<S>,
        constructor: FacadeConstructor<S>,
        dependencies: &[&str],
        critical: bool,
    ) -> Result<()>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let config = ServiceConfig::new(name, service, constructor)
            .depends_on(dependencies.iter().copied())
            .critical(critical);
        self.register(config).await
    }

    /// Store `config` and build its facade.
    ///
    /// The config stays registered even if construction fails. A failure is
    /// returned only for critical services; otherwise it is logged.
    pub async fn register(&self, config: ServiceConfig) -> Result<()> {
        let phase = self.phase();
        if phase.is_terminal() {
            return Err(OrchestratorError::InvalidTransition {
                from: phase.to_string(),
                to: format!("registering '{}'", config.name),
            });
        }

        let config = Arc::new(config);
        {
            let mut registry = write(&self.inner.registry);
            if registry.contains(&config.name) {
                return Err(OrchestratorError::DuplicateService(config.name.clone()));
            }
            registry.insert(Arc::clone(&config));
        }
        write(&self.inner.health).insert(config.name.clone(), ServiceHealth::Unknown);
        lock(&self.inner.trackers)
            .insert(config.name.clone(), ServiceRecoveryTracker::new(Instant::now()));

        match self.construct(&config).await {
            Ok(facade) => {
                write(&self.inner.facades).insert(config.name.clone(), facade);
                tracing::info!(
                    service = %config.name,
                    critical = config.critical,
                    dependencies = ?config.dependencies,
                    "Service registered"
                );
                Ok(())
            }
            Err(e) if config.critical => {
                tracing::error!(service = %config.name, error = %e, "Critical service failed to initialize");
                Err(OrchestratorError::Initialization {
                    service: config.name.clone(),
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                tracing::warn!(service = %config.name, error = %e, "Non-critical service failed to initialize, continuing without it");
                Ok(())
            }
        }
    }

    async fn construct(&self, config: &ServiceConfig) -> std::result::Result<Arc<dyn Facade>, BoxError> {
        let attempts = config.max_init_retries.max(1);
        let mut attempt = 0;
        loop {
            match config.build_facade(&self.inner.config) {
                Ok(facade) => return Ok(facade),
                Err(e) if attempt + 1 >= attempts => return Err(e),
                Err(e) => {
                    let delay = calculate_backoff(attempt, INIT_RETRY_BASE, INIT_RETRY_MAX, 0.0);
                    tracing::warn!(
                        service = %config.name,
                        attempt = attempt + 1,
                        attempts,
                        delay = ?delay,
                        error = %e,
                        "Facade construction failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Validate the dependency graph and bring the orchestrator up.
    ///
    /// Returns `Ok(false)` if a critical service has no facade; the status is
    /// then FAILED and no background loop is started. Graph errors are
    /// returned before any service is touched.
    pub async fn initialize_services(&self) -> Result<bool> {
        self.transition(LifecyclePhase::Initializing)?;

        let order = match self.initialization_plan() {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(error = %e, "Invalid service dependency graph");
                self.force_phase(LifecyclePhase::Created);
                return Err(e);
            }
        };
        tracing::info!(order = ?order, "Initializing services");

        let mut missing = Vec::new();
        {
            let registry = read(&self.inner.registry);
            let facades = read(&self.inner.facades);
            for name in &order {
                let critical = registry.get(name).is_some_and(|s| s.critical);
                if facades.contains_key(name) {
                    tracing::debug!(service = %name, "Service ready");
                } else if critical {
                    tracing::error!(service = %name, "Critical service has no facade");
                    missing.push(name.clone());
                } else {
                    tracing::warn!(service = %name, "Non-critical service has no facade");
                }
            }
        }

        let failed = !missing.is_empty();
        {
            let mut state = lock(&self.inner.state);
            state.init_order = order;
            if failed {
                state.critical_init_failed = true;
                state.last_status = ServiceStatus::Failed;
                state.phase = LifecyclePhase::Created;
            } else {
                state.phase = LifecyclePhase::Running;
            }
        }

        if failed {
            telemetry::record_orchestrator_status(ServiceStatus::Failed);
            tracing::error!(missing = ?missing, "Initialization failed: critical services unavailable");
            return Ok(false);
        }

        if self.inner.config.monitor.enabled {
            self.start_background_tasks();
        }
        tracing::info!("All services initialized");
        Ok(true)
    }

    fn initialization_plan(&self) -> Result<Vec<String>> {
        let registry = read(&self.inner.registry);
        let mut graph = DependencyGraph::new();
        for service in registry.iter() {
            graph.add_node(&service.name);
        }
        for service in registry.iter() {
            for dependency in &service.dependencies {
                graph.add_edge(&service.name, dependency)?;
            }
        }
        graph.topological_sort()
    }

    fn start_background_tasks(&self) {
        let monitor = HealthMonitor::new(
            self.clone(),
            self.monitor_interval(),
            Duration::from_secs(self.inner.config.monitor.max_backoff_secs),
        );
        let collector = MetricsCollector::new(
            self.clone(),
            Duration::from_secs(self.inner.config.monitor.metrics_interval_secs),
        );

        let monitor_handle = tokio::spawn(monitor.run(self.inner.shutdown.subscribe()));
        let collector_handle = tokio::spawn(collector.run(self.inner.shutdown.subscribe()));

        lock(&self.inner.tasks).extend([
            BackgroundTask {
                name: "health_monitor",
                handle: monitor_handle,
            },
            BackgroundTask {
                name: "metrics_collector",
                handle: collector_handle,
            },
        ]);
    }

    /// Cadence of the health monitor: the shortest registered interval.
    pub fn monitor_interval(&self) -> Duration {
        read(&self.inner.registry)
            .iter()
            .map(|s| s.health_check_interval)
            .min()
            .unwrap_or(Duration::from_secs(self.inner.config.monitor.interval_secs))
            .max(Duration::from_secs(1))
    }

    fn transition(&self, next: LifecyclePhase) -> Result<()> {
        let mut state = lock(&self.inner.state);
        if !state.phase.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition {
                from: state.phase.to_string(),
                to: next.to_string(),
            });
        }
        state.phase = next;
        Ok(())
    }

    fn force_phase(&self, phase: LifecyclePhase) {
        lock(&self.inner.state).phase = phase;
    }

    pub fn phase(&self) -> LifecyclePhase {
        lock(&self.inner.state).phase
    }

    pub fn initialization_order(&self) -> Vec<String> {
        lock(&self.inner.state).init_order.clone()
    }

    /// Overall status, derived from the latest health map.
    pub fn status(&self) -> ServiceStatus {
        {
            let state = lock(&self.inner.state);
            if state.critical_init_failed {
                return ServiceStatus::Failed;
            }
            if state.cycles == 0 {
                return ServiceStatus::Initializing;
            }
        }
        self.derive_current_status()
    }

    fn derive_current_status(&self) -> ServiceStatus {
        let registry = read(&self.inner.registry);
        let health = read(&self.inner.health);
        derive_status(
            registry
                .iter()
                .map(|s| (health.get(&s.name).copied().unwrap_or_default(), s.critical)),
        )
    }

    pub fn get_service(&self, name: &str) -> Option<Arc<dyn Facade>> {
        read(&self.inner.facades).get(name).cloned()
    }

    /// Typed access to a facade, e.g. `get_facade::<ChatFacade>("chat")`.
    pub fn get_facade<F: Facade>(&self, name: &str) -> Option<Arc<F>> {
        self.get_service(name)?.into_any().downcast::<F>().ok()
    }

    /// Registered service names in registration order.
    pub fn service_names(&self) -> Vec<String> {
        read(&self.inner.registry)
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// Last observed health, for one service or all of them.
    pub fn get_service_health(&self, name: Option<&str>) -> HashMap<String, ServiceHealth> {
        let registry = read(&self.inner.registry);
        let health = read(&self.inner.health);
        registry
            .iter()
            .filter(|s| name.map_or(true, |n| s.name == n))
            .map(|s| (s.name.clone(), health.get(&s.name).copied().unwrap_or_default()))
            .collect()
    }

    /// Clear one facade's cache. Returns false if there is no such facade.
    pub fn clear_service_cache(&self, name: &str) -> bool {
        match self.get_service(name) {
            Some(facade) => {
                facade.clear_cache();
                true
            }
            None => false,
        }
    }

    /// Probe every registered service and update the health map.
    ///
    /// Overlapping calls, calls within `min_interval` of the last completed
    /// cycle, and calls after shutdown started return the stored map
    /// without probing.
    pub async fn perform_health_checks(&self) -> HashMap<String, ServiceHealth> {
        if self.inner.shutdown.is_triggered() {
            return self.skip_cycle("shutting down");
        }

        if self
            .inner
            .check_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return self.skip_cycle("already in progress");
        }
        let _guard = CycleGuard(&self.inner.check_in_progress);

        // Checked under the flag so a cycle finishing concurrently is seen.
        let min_interval = self.inner.config.health.min_interval();
        let recent = lock(&self.inner.state)
            .last_check
            .is_some_and(|at| at.elapsed() < min_interval);
        if recent {
            return self.skip_cycle("ran recently");
        }

        let cycle_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("health_cycle", cycle_id = %cycle_id);
        self.run_health_cycle().instrument(span).await
    }

    fn skip_cycle(&self, reason: &'static str) -> HashMap<String, ServiceHealth> {
        lock(&self.inner.state).skipped += 1;
        telemetry::record_health_cycle_skipped();
        tracing::debug!(reason, "Health check skipped, returning cached results");
        self.get_service_health(None)
    }

    async fn run_health_cycle(&self) -> HashMap<String, ServiceHealth> {
        let started = Instant::now();
        let services = read(&self.inner.registry).snapshot();
        let facades = read(&self.inner.facades).clone();
        let health_config = &self.inner.config.health;

        let (critical, non_critical): (Vec<_>, Vec<_>) =
            services.into_iter().partition(|s| s.critical);

        let mut results = HashMap::with_capacity(critical.len() + non_critical.len());
        for service in &critical {
            let health = match facades.get(&service.name) {
                Some(facade) => {
                    probe_critical(&service.name, Arc::clone(facade), health_config.critical_timeout())
                        .await
                }
                None => ServiceHealth::Unhealthy,
            };
            results.insert(service.name.clone(), health);
        }

        results.extend(self.probe_non_critical(&non_critical, &facades).await);

        self.apply_results(&results);
        let elapsed = started.elapsed();
        telemetry::record_health_cycle(elapsed);
        tracing::debug!(elapsed = ?elapsed, services = results.len(), "Health cycle complete");
        results
    }

    async fn probe_non_critical(
        &self,
        services: &[Arc<ServiceConfig>],
        facades: &HashMap<String, Arc<dyn Facade>>,
    ) -> HashMap<String, ServiceHealth> {
        let health_config = &self.inner.config.health;
        let per_call = health_config.non_critical_timeout();
        let workers = Arc::new(Semaphore::new(health_config.non_critical_workers.max(1)));

        let mut results = HashMap::new();
        let mut pending = HashSet::new();
        let mut set = JoinSet::new();

        for service in services {
            let Some(facade) = facades.get(&service.name).cloned() else {
                results.insert(service.name.clone(), ServiceHealth::Unhealthy);
                continue;
            };
            pending.insert(service.name.clone());

            let name = service.name.clone();
            let workers = Arc::clone(&workers);
            set.spawn(
                async move {
                    let _permit = workers.acquire_owned().await.ok();
                    let health = match tokio::time::timeout(per_call, facade.health_check()).await {
                        Ok(health) => health,
                        Err(_) => {
                            tracing::warn!(service = %name, timeout = ?per_call, "Health check timed out");
                            ServiceHealth::Degraded
                        }
                    };
                    (name, health)
                }
                .in_current_span(),
            );
        }

        let collect = async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((name, health)) => {
                        pending.remove(&name);
                        results.insert(name, health);
                    }
                    Err(e) => tracing::warn!(error = %e, "Health check task panicked"),
                }
            }
        };
        if tokio::time::timeout(health_config.non_critical_wait(), collect)
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = pending.len(),
                wait = ?health_config.non_critical_wait(),
                "Non-critical health checks exceeded wait bound"
            );
        }
        set.abort_all();

        for name in pending {
            results.insert(name, ServiceHealth::Degraded);
        }
        results
    }

    fn apply_results(&self, results: &HashMap<String, ServiceHealth>) {
        let now = Instant::now();
        {
            let mut trackers = lock(&self.inner.trackers);
            for (name, &health) in results {
                let tracker = trackers
                    .entry(name.clone())
                    .or_insert_with(|| ServiceRecoveryTracker::new(now));
                let transition = tracker.observe(health, now);
                log_transition(name, health, transition, tracker, now);
                telemetry::record_service_health(name, health);
            }
        }
        write(&self.inner.health).extend(results.iter().map(|(k, v)| (k.clone(), *v)));

        let derived = self.derive_current_status();
        let (previous, status) = {
            let mut state = lock(&self.inner.state);
            let status = if state.critical_init_failed {
                ServiceStatus::Failed
            } else {
                derived
            };
            state.cycles += 1;
            state.last_check = Some(now);
            (std::mem::replace(&mut state.last_status, status), status)
        };

        telemetry::record_orchestrator_status(status);
        if previous != status {
            match status {
                ServiceStatus::Ready => tracing::info!(from = %previous, "Orchestrator status: READY"),
                ServiceStatus::Degraded => tracing::warn!(from = %previous, "Orchestrator status: DEGRADED"),
                ServiceStatus::Failed => tracing::error!(from = %previous, "Orchestrator status: FAILED"),
                ServiceStatus::Initializing => {}
            }
        }
    }

    pub fn get_comprehensive_metrics(&self) -> ComprehensiveMetrics {
        let now = Instant::now();
        let status = self.status();
        let (phase, initialization_order, health_cycles, skipped, last_check) = {
            let state = lock(&self.inner.state);
            (
                state.phase,
                state.init_order.clone(),
                state.cycles,
                state.skipped,
                state.last_check,
            )
        };

        let registry = read(&self.inner.registry).snapshot();
        let facades = read(&self.inner.facades).clone();
        let health = read(&self.inner.health).clone();
        let trackers = lock(&self.inner.trackers).clone();

        let services = registry
            .iter()
            .map(|s| {
                let facade = facades.get(&s.name);
                ServiceReport {
                    name: s.name.clone(),
                    critical: s.critical,
                    dependencies: s.dependencies.clone(),
                    health: health.get(&s.name).copied().unwrap_or_default(),
                    initialized: facade.is_some(),
                    recovery: trackers.get(&s.name).map(|t| t.summary(now)),
                    facade: facade.map(|f| f.get_metrics()),
                }
            })
            .collect();

        ComprehensiveMetrics {
            status,
            phase,
            initialization_order,
            health_cycles,
            skipped_health_cycles: skipped,
            last_health_check_secs_ago: last_check.map(|at| now.saturating_duration_since(at).as_secs()),
            services,
        }
    }

    pub fn get_health_status_dashboard(&self) -> HealthDashboard {
        let now = Instant::now();
        let status = self.status();
        let phase = self.phase();

        let registry = read(&self.inner.registry).snapshot();
        let facades = read(&self.inner.facades).clone();
        let health = read(&self.inner.health).clone();
        let trackers = lock(&self.inner.trackers).clone();

        let services: Vec<DashboardEntry> = registry
            .iter()
            .map(|s| {
                let snapshot = facades.get(&s.name).map(|f| f.get_metrics());
                let tracker = trackers.get(&s.name);
                DashboardEntry {
                    name: s.name.clone(),
                    health: health.get(&s.name).copied().unwrap_or_default(),
                    critical: s.critical,
                    circuit: snapshot.as_ref().map(|m| m.circuit.state),
                    consecutive_failures: tracker.map_or(0, |t| t.consecutive_failures),
                    recovery_count: tracker.map_or(0, |t| t.recovery_count),
                    downtime_secs: tracker.and_then(|t| t.downtime(now)).map(|d| d.as_secs()),
                    avg_response_time_ms: snapshot.map(|m| m.metrics.avg_response_time_ms),
                }
            })
            .collect();

        HealthDashboard {
            status,
            phase,
            counts: HealthCounts::tally(services.iter().map(|s| s.health)),
            critical_issues: services
                .iter()
                .filter(|s| s.critical && !s.health.is_healthy())
                .map(|s| s.name.clone())
                .collect(),
            services,
            generated_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Push the current snapshot to the metrics recorder.
    pub fn publish_metrics(&self) {
        let facades = read(&self.inner.facades).clone();
        for facade in facades.values() {
            telemetry::record_facade_snapshot(&facade.get_metrics());
        }
        for (name, health) in self.get_service_health(None) {
            telemetry::record_service_health(&name, health);
        }
        telemetry::record_orchestrator_status(self.status());
    }

    /// Stop the background loops, then shut every facade down.
    ///
    /// Facades are stopped dependents first. One facade failing, hanging or
    /// panicking does not keep the others from shutting down.
    pub async fn shutdown(&self) -> ShutdownReport {
        let order = {
            let mut state = lock(&self.inner.state);
            if !state.phase.can_transition_to(LifecyclePhase::ShuttingDown) {
                tracing::debug!(phase = %state.phase, "Shutdown already requested");
                return ShutdownReport::default();
            }
            state.phase = LifecyclePhase::ShuttingDown;
            state.init_order.clone()
        };
        tracing::info!("Shutting down orchestrator");

        self.inner.shutdown.trigger();
        let join_timeout = Duration::from_secs(self.inner.config.monitor.join_timeout_secs);
        let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
        for task in tasks {
            let abort = task.handle.abort_handle();
            match tokio::time::timeout(join_timeout, task.handle).await {
                Ok(Ok(())) => tracing::debug!(task = task.name, "Background task stopped"),
                Ok(Err(e)) => tracing::warn!(task = task.name, error = %e, "Background task ended abnormally"),
                Err(_) => {
                    abort.abort();
                    tracing::warn!(task = task.name, timeout = ?join_timeout, "Background task did not stop in time, aborted");
                }
            }
        }

        let facades = read(&self.inner.facades).clone();
        let mut names: Vec<String> = order
            .into_iter()
            .rev()
            .filter(|n| facades.contains_key(n))
            .collect();
        for service in read(&self.inner.registry).snapshot().iter().rev() {
            if facades.contains_key(&service.name) && !names.contains(&service.name) {
                names.push(service.name.clone());
            }
        }

        let facade_timeout = Duration::from_secs(self.inner.config.facade.shutdown_timeout_secs);
        let mut report = ShutdownReport::default();
        for name in names {
            let Some(facade) = facades.get(&name).cloned() else {
                continue;
            };
            facade.clear_cache();

            let handle = tokio::spawn(async move { facade.shutdown().await });
            let abort = handle.abort_handle();
            match tokio::time::timeout(facade_timeout, handle).await {
                Ok(Ok(Ok(()))) => {
                    tracing::info!(service = %name, "Service stopped");
                    report.stopped.push(name);
                }
                Ok(Ok(Err(e))) => {
                    tracing::error!(service = %name, error = %e, "Service shutdown failed");
                    report.failed.push(name);
                }
                Ok(Err(e)) => {
                    tracing::error!(service = %name, error = %e, "Service shutdown panicked");
                    report.failed.push(name);
                }
                Err(_) => {
                    abort.abort();
                    tracing::error!(service = %name, timeout = ?facade_timeout, "Service shutdown timed out");
                    report.failed.push(name);
                }
            }
        }

        self.force_phase(LifecyclePhase::Stopped);
        tracing::info!(
            stopped = report.stopped.len(),
            failed = report.failed.len(),
            "Orchestrator stopped"
        );
        report
    }
}

async fn probe_critical(name: &str, facade: Arc<dyn Facade>, limit: Duration) -> ServiceHealth {
    let handle = tokio::spawn(async move { facade.health_check().await }.in_current_span());
    let abort = handle.abort_handle();
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(health)) => health,
        Ok(Err(e)) => {
            tracing::error!(service = %name, error = %e, "Critical health check panicked");
            ServiceHealth::Unhealthy
        }
        Err(_) => {
            abort.abort();
            tracing::warn!(service = %name, timeout = ?limit, "Critical health check timed out");
            ServiceHealth::Unhealthy
        }
    }
}

fn log_transition(
    name: &str,
    health: ServiceHealth,
    transition: Transition,
    tracker: &ServiceRecoveryTracker,
    now: Instant,
) {
    if !transition.should_log() {
        return;
    }
    match transition {
        Transition::Failed => {
            tracing::warn!(service = %name, health = %health, "Service health degraded");
        }
        Transition::StillFailing { consecutive } => {
            tracing::error!(
                service = %name,
                health = %health,
                consecutive_failures = consecutive,
                downtime = ?tracker.downtime(now),
                "Service still failing"
            );
        }
        Transition::Recovered { downtime } => {
            tracing::info!(
                service = %name,
                downtime = ?downtime,
                recoveries = tracker.recovery_count,
                "Service recovered"
            );
            telemetry::record_recovery(name);
        }
        Transition::Steady => {}
    }
}
