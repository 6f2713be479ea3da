//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (service dependencies reference declared services)
//! - Validate value ranges (timeouts > 0, worker pools non-empty, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OrchestratorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{OrchestratorConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let health = &config.health;
    non_zero(&mut errors, "health.critical_timeout_secs", health.critical_timeout_secs);
    non_zero(&mut errors, "health.non_critical_timeout_secs", health.non_critical_timeout_secs);
    non_zero(&mut errors, "health.non_critical_wait_secs", health.non_critical_wait_secs);
    non_zero(&mut errors, "health.non_critical_workers", health.non_critical_workers as u64);
    if health.non_critical_wait_secs < health.non_critical_timeout_secs {
        errors.push(ValidationError::new(
            "health.non_critical_wait_secs",
            "must not be shorter than non_critical_timeout_secs",
        ));
    }

    non_zero(&mut errors, "monitor.interval_secs", config.monitor.interval_secs);
    non_zero(&mut errors, "monitor.metrics_interval_secs", config.monitor.metrics_interval_secs);
    if config.monitor.max_backoff_secs < config.monitor.interval_secs {
        errors.push(ValidationError::new(
            "monitor.max_backoff_secs",
            "must not be shorter than interval_secs",
        ));
    }

    non_zero(&mut errors, "circuit_breaker.failure_threshold", config.circuit_breaker.failure_threshold as u64);
    non_zero(&mut errors, "facade.probe_timeout_secs", config.facade.probe_timeout_secs);
    non_zero(&mut errors, "facade.batch_workers", config.facade.batch_workers as u64);

    if !(0.0..=1.0).contains(&config.retries.jitter_ratio) {
        errors.push(ValidationError::new("retries.jitter_ratio", "must be within [0.0, 1.0]"));
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}' (expected pretty or json)", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
        }
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("'{}' is not a socket address", config.admin.bind_address),
            ));
        }
    }

    validate_services(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_services(config: &OrchestratorConfig, errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();
    for service in &config.services {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::new("services.name", "must not be empty"));
        }
        if !names.insert(service.name.as_str()) {
            errors.push(ValidationError::new(
                format!("services.{}", service.name),
                "declared more than once",
            ));
        }
        if service.health_check_interval_secs == 0 {
            errors.push(ValidationError::new(
                format!("services.{}.health_check_interval_secs", service.name),
                "must be greater than zero",
            ));
        }
    }

    for service in &config.services {
        for dep in &service.dependencies {
            if dep == &service.name {
                errors.push(ValidationError::new(
                    format!("services.{}.dependencies", service.name),
                    "a service cannot depend on itself",
                ));
            } else if !names.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    format!("services.{}.dependencies", service.name),
                    format!("unknown service '{}'", dep),
                ));
            }
        }
    }
}

fn non_zero(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::new(field, "must be greater than zero"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ServiceDefinition, ServiceKind};

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&OrchestratorConfig::default()).is_ok());
    }

    #[test]
    fn wait_bound_shorter_than_probe_timeout_is_rejected() {
        let mut config = OrchestratorConfig::default();
        config.health.non_critical_wait_secs = 2;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "health.non_critical_wait_secs");
    }

    #[test]
    fn dependency_problems_are_collected() {
        let mut config = OrchestratorConfig::default();
        let mut loner = ServiceDefinition::new("loner", ServiceKind::Feeds);
        loner.dependencies = vec!["loner".into(), "ghost".into()];
        config.services.push(loner);
        config.services.push(ServiceDefinition::new("chat", ServiceKind::Chat));

        let errors = validate_config(&config).unwrap_err();
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(errors.len(), 3, "{:?}", messages);
        assert!(messages.iter().any(|m| m.contains("declared more than once")));
        assert!(messages.iter().any(|m| m.contains("cannot depend on itself")));
        assert!(messages.iter().any(|m| m.contains("unknown service 'ghost'")));
    }

    #[test]
    fn admin_requires_real_key() {
        let mut config = OrchestratorConfig::default();
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "admin.api_key");

        config.admin.api_key = "s3cret".into();
        assert!(validate_config(&config).is_ok());
    }
}
