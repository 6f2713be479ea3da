//! Admin routes exercised in-process.

use axum::body::Body;
use axum::http::{header::AUTHORIZATION, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use service_resilience::admin::{setup_admin_router, AdminState};
use service_resilience::orchestrator::ServiceOrchestrator;

mod common;

use common::{scripted, test_config, Behavior, ScriptedService};

const KEY: &str = "test-admin-key";

async fn router() -> Router {
    let orchestrator = ServiceOrchestrator::new(test_config());
    orchestrator
        .register_service("core", ScriptedService::new(), scripted(), &[], true)
        .await
        .unwrap();
    orchestrator
        .register_service("extra", ScriptedService::with_health(Behavior::Fail), scripted(), &["core"], false)
        .await
        .unwrap();
    orchestrator.initialize_services().await.unwrap();
    setup_admin_router(AdminState::new(orchestrator, KEY))
}

fn request(method: Method, uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", key));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json(router: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn requests_without_valid_token_are_rejected() {
    let app = router().await;

    let response = app.clone().oneshot(request(Method::GET, "/admin/status", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request(Method::GET, "/admin/status", Some("wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_reports_phase_and_order() {
    let (status, body) = json(router().await, request(Method::GET, "/admin/status", Some(KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "INITIALIZING");
    assert_eq!(body["phase"], "running");
    assert_eq!(body["initialization_order"], serde_json::json!(["core", "extra"]));
}

#[tokio::test]
async fn health_check_route_runs_a_cycle() {
    let app = router().await;
    let (status, body) = json(app.clone(), request(Method::POST, "/admin/health-check", Some(KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "DEGRADED");
    assert_eq!(body["services"]["core"], "HEALTHY");
    assert_eq!(body["services"]["extra"], "UNHEALTHY");

    let (_, dashboard) = json(app, request(Method::GET, "/admin/dashboard", Some(KEY))).await;
    assert_eq!(dashboard["counts"]["healthy"], 1);
    assert_eq!(dashboard["counts"]["unhealthy"], 1);
    assert_eq!(dashboard["critical_issues"], serde_json::json!([]));
}

#[tokio::test]
async fn metrics_lists_every_service() {
    let (status, body) = json(router().await, request(Method::GET, "/admin/metrics", Some(KEY))).await;
    assert_eq!(status, StatusCode::OK);
    let services = body["services"].as_array().unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0]["name"], "core");
    assert_eq!(services[0]["facade"]["circuit"]["state"], "closed");
}

#[tokio::test]
async fn cache_clear_is_404_for_unknown_service() {
    let app = router().await;
    let (status, body) = json(
        app.clone(),
        request(Method::POST, "/admin/services/core/cache/clear", Some(KEY)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], true);

    let (status, _) = json(app, request(Method::POST, "/admin/services/ghost/cache/clear", Some(KEY))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
