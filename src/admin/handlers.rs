use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use super::AdminState;
use crate::health::{ServiceHealth, ServiceStatus};
use crate::lifecycle::LifecyclePhase;
use crate::orchestrator::{ComprehensiveMetrics, HealthDashboard};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: ServiceStatus,
    pub phase: LifecyclePhase,
    pub services: Vec<String>,
    pub initialization_order: Vec<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub services: BTreeMap<String, ServiceHealth>,
}

#[derive(Serialize)]
pub struct CacheCleared {
    pub service: String,
    pub cleared: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let orchestrator = &state.orchestrator;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: orchestrator.status(),
        phase: orchestrator.phase(),
        services: orchestrator.service_names(),
        initialization_order: orchestrator.initialization_order(),
    })
}

pub async fn get_health(State(state): State<AdminState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: state.orchestrator.status(),
        services: state.orchestrator.get_service_health(None).into_iter().collect(),
    })
}

pub async fn get_dashboard(State(state): State<AdminState>) -> Json<HealthDashboard> {
    Json(state.orchestrator.get_health_status_dashboard())
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<ComprehensiveMetrics> {
    Json(state.orchestrator.get_comprehensive_metrics())
}

/// Runs a cycle now, subject to the usual throttle.
pub async fn run_health_check(State(state): State<AdminState>) -> Json<HealthResponse> {
    let services = state.orchestrator.perform_health_checks().await;
    Json(HealthResponse {
        status: state.orchestrator.status(),
        services: services.into_iter().collect(),
    })
}

pub async fn clear_service_cache(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<CacheCleared>, StatusCode> {
    if !state.orchestrator.clear_service_cache(&name) {
        return Err(StatusCode::NOT_FOUND);
    }
    tracing::info!(service = %name, "Cache cleared via admin API");
    Ok(Json(CacheCleared {
        service: name,
        cleared: true,
    }))
}
