//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the pipeline's REST API using utoipa for
//! compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the document processing API
///
/// Served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "EduHelpify Document Processing API",
        version = "0.1.0",
        description = "Turns queued document tasks into generated study material and emails the result"
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        crate::api::routes::process_task,
        crate::api::routes::process_queue,
        crate::api::routes::service_info,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::api::routes::ServiceInfo,
            crate::api::routes::ProcessResponse,
            crate::api::routes::QueueResponse,
            crate::types::QueueEntryOutcome,
            crate::types::TaskId,
            crate::types::TaskStatus,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "processing", description = "Task processing"),
        (name = "system", description = "Service status and documentation")
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_processing_paths() {
        let spec = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = spec["paths"].as_object().unwrap();

        assert!(paths.contains_key("/process/{task_id}"));
        assert!(paths.contains_key("/process_queue"));
        assert!(paths.contains_key("/health"));
        assert!(spec["components"]["schemas"]["ApiError"].is_object());
    }
}
