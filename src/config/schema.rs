//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! orchestrator and its facades. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the service orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Health-check cycle settings.
    pub health: HealthCheckConfig,

    /// Background monitor and metrics loops.
    pub monitor: MonitorConfig,

    /// Default circuit breaker for every facade.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Settings shared by every facade.
    pub facade: FacadeConfig,

    /// Retry limits shared by every facade.
    pub retries: RetryConfig,

    /// Chat facade tuning.
    pub chat: ChatConfig,

    /// Document facade tuning.
    pub documents: DocumentConfig,

    /// Feeds facade tuning.
    pub feeds: FeedsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    /// Services the factory registers, in declaration order.
    #[serde(default = "default_services")]
    pub services: Vec<ServiceDefinition>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            health: HealthCheckConfig::default(),
            monitor: MonitorConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            facade: FacadeConfig::default(),
            retries: RetryConfig::default(),
            chat: ChatConfig::default(),
            documents: DocumentConfig::default(),
            feeds: FeedsConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
            services: default_services(),
        }
    }
}

/// Health-check cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Minimum seconds between two real probe rounds.
    pub min_interval_secs: u64,

    /// Per-call timeout for critical services (probed one at a time).
    pub critical_timeout_secs: u64,

    /// Per-call timeout for non-critical services.
    pub non_critical_timeout_secs: u64,

    /// Overall wait bound for the non-critical round.
    pub non_critical_wait_secs: u64,

    /// Concurrent non-critical probes.
    pub non_critical_workers: usize,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 30,
            critical_timeout_secs: 15,
            non_critical_timeout_secs: 8,
            non_critical_wait_secs: 20,
            non_critical_workers: 3,
        }
    }
}

impl HealthCheckConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn critical_timeout(&self) -> Duration {
        Duration::from_secs(self.critical_timeout_secs)
    }

    pub fn non_critical_timeout(&self) -> Duration {
        Duration::from_secs(self.non_critical_timeout_secs)
    }

    pub fn non_critical_wait(&self) -> Duration {
        Duration::from_secs(self.non_critical_wait_secs)
    }
}

/// Background loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Start the monitor and metrics loops after initialization.
    pub enabled: bool,

    /// Fallback monitor cadence when no service declares its own interval.
    pub interval_secs: u64,

    /// Cap for the monitor's failure backoff.
    pub max_backoff_secs: u64,

    /// Metrics collector cadence.
    pub metrics_interval_secs: u64,

    /// How long shutdown waits for each loop to exit.
    pub join_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            max_backoff_secs: 600,
            metrics_interval_secs: 300,
            join_timeout_secs: 5,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,

    /// Seconds after the last failure before calls are admitted again.
    pub recovery_timeout_secs: u64,

    /// Admit a single trial call after the recovery timeout instead of
    /// letting every caller through at once.
    pub half_open_trial: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_secs: 60,
            half_open_trial: true,
        }
    }
}

/// Settings shared by all facades.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FacadeConfig {
    /// Timeout for a facade's own health probe.
    pub probe_timeout_secs: u64,

    /// Worker pool size for `batch_execute`.
    pub batch_workers: usize,

    /// Deadline for each facade's shutdown hook.
    pub shutdown_timeout_secs: u64,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5,
            batch_workers: 4,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Retry limits shared by all facades.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Upper bound for any single backoff delay in milliseconds.
    pub max_delay_ms: u64,

    /// Random jitter added to each delay, as a fraction of it (0.0 = none).
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_delay_ms: 30_000,
            jitter_ratio: 0.0,
        }
    }
}

/// Chat facade tuning. Interactive calls get short retry budgets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// How long the model list stays cached.
    pub models_ttl_secs: u64,
    /// Probe budget for receiving the first streamed token.
    pub probe_token_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 500,
            models_ttl_secs: 3600,
            probe_token_timeout_secs: 4,
        }
    }
}

/// Document facade tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub list_ttl_secs: u64,
    pub query_ttl_secs: u64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
            list_ttl_secs: 60,
            query_ttl_secs: 300,
        }
    }
}

/// Feeds facade tuning. Feed data changes slowly, so TTLs are long.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub feeds_ttl_secs: u64,
    pub items_ttl_secs: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
            feeds_ttl_secs: 3600,
            items_ttl_secs: 900,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Which facade wraps a declared service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Chat,
    Documents,
    Feeds,
}

/// A service the factory should register.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceDefinition {
    /// Unique service name.
    pub name: String,

    pub kind: ServiceKind,

    /// Critical services force FAILED status when unhealthy.
    #[serde(default)]
    pub critical: bool,

    /// Names of services that must initialize first.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,

    #[serde(default = "default_max_init_retries")]
    pub max_init_retries: u32,
}

fn default_health_check_interval() -> u64 {
    60
}

fn default_max_init_retries() -> u32 {
    3
}

impl ServiceDefinition {
    pub fn new(name: &str, kind: ServiceKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            critical: false,
            dependencies: Vec::new(),
            health_check_interval_secs: default_health_check_interval(),
            max_init_retries: default_max_init_retries(),
        }
    }
}

fn default_services() -> Vec<ServiceDefinition> {
    let chat = ServiceDefinition {
        critical: true,
        ..ServiceDefinition::new("chat", ServiceKind::Chat)
    };
    let documents = ServiceDefinition {
        critical: true,
        dependencies: vec!["chat".to_string()],
        ..ServiceDefinition::new("documents", ServiceKind::Documents)
    };
    let feeds = ServiceDefinition::new("feeds", ServiceKind::Feeds);
    vec![chat, documents, feeds]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.health.min_interval_secs, 30);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.services.len(), 3);
        assert_eq!(config.services[1].dependencies, vec!["chat".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let raw = r#"
            [health]
            critical_timeout_secs = 3

            [[services]]
            name = "rss"
            kind = "feeds"
        "#;
        let config: OrchestratorConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.health.critical_timeout_secs, 3);
        assert_eq!(config.health.non_critical_timeout_secs, 8);
        assert_eq!(config.services.len(), 1);
        assert!(!config.services[0].critical);
        assert_eq!(config.services[0].max_init_retries, 3);
    }
}
