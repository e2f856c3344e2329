use super::*;
use crate::orchestrator::test_helpers::{FakeGenerator, TestEnv, orchestrator, seeded_env};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

mod system;

/// Router over a seeded store with a generator that always answers `reply`
async fn test_app(reply: &str) -> (Router, TestEnv) {
    let env = seeded_env().await;
    let orchestrator = Arc::new(orchestrator(
        &env,
        Arc::new(FakeGenerator::replying(reply)),
        vec![],
    ));
    let app = create_router(orchestrator, env.config.clone());
    (app, env)
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (app, _env) = test_app("x").await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn cors_can_be_disabled() {
    let env = seeded_env().await;
    let mut config = (*env.config).clone();
    config.server.cors_enabled = false;
    let orchestrator = Arc::new(orchestrator(
        &env,
        Arc::new(FakeGenerator::replying("x")),
        vec![],
    ));
    let app = create_router(orchestrator, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn cors_origin_list_is_enforced() {
    let env = seeded_env().await;
    let mut config = (*env.config).clone();
    config.server.cors_origins = vec!["http://allowed.example".to_string()];
    let orchestrator = Arc::new(orchestrator(
        &env,
        Arc::new(FakeGenerator::replying("x")),
        vec![],
    ));
    let app = create_router(orchestrator, Arc::new(config));

    let request = |origin: &str| {
        Request::builder()
            .uri("/health")
            .header("Origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .clone()
        .oneshot(request("http://allowed.example"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://allowed.example"
    );

    let other = app.oneshot(request("http://other.example")).await.unwrap();
    assert!(!other.headers().contains_key("access-control-allow-origin"));
}
