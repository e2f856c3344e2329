use super::*;

#[tokio::test]
async fn banner_reports_running() {
    let (app, _env) = test_app("x").await;
    let (status, body) = send(app, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["service"], "EduHelpify Document Processing API");
}

#[tokio::test]
async fn health_reports_version() {
    let (app, _env) = test_app("x").await;
    let (status, body) = send(app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _env) = test_app("x").await;
    let (status, body) = send(app, "GET", "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/process_queue"].is_object());
}
