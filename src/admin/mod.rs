//! Admin HTTP surface.
//!
//! Read-only views of orchestrator state plus two operator actions
//! (run a health cycle, clear one facade's cache). Every route sits behind
//! the bearer-token middleware.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::orchestrator::ServiceOrchestrator;

#[derive(Clone)]
pub struct AdminState {
    pub orchestrator: ServiceOrchestrator,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(orchestrator: ServiceOrchestrator, api_key: &str) -> Self {
        Self {
            orchestrator,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/health", get(get_health))
        .route("/admin/dashboard", get(get_dashboard))
        .route("/admin/metrics", get(get_metrics))
        .route("/admin/health-check", post(run_health_check))
        .route("/admin/services/{name}/cache/clear", post(clear_service_cache))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
