//! Error types for the document pipeline
//!
//! This module provides the crate-wide error type and its mapping onto the HTTP surface:
//! - Domain-specific error types (acquisition, generation, materialization)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pipeline
///
/// Every stage of task processing reports failure through this type. The orchestrator
/// turns any of these into a single FAILED status write for a claimed task.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "GOOGLE_API_KEY")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Which kind of record was looked up
        entity: Entity,
        /// The identifier that was looked up
        id: String,
    },

    /// The task exists but is not in a claimable state
    #[error("task {id} is not claimable (status {status})")]
    TaskNotClaimable {
        /// The task that could not be claimed
        id: String,
        /// The status observed when the claim was refused
        status: String,
    },

    /// Input file acquisition failed
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Content generation failed
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Rendering generated content into the output format failed
    #[error("materialization error: {0}")]
    Materialization(#[from] MaterializationError),

    /// Notification delivery failed (never fails a task)
    #[error("notification error: {0}")]
    Notification(String),

    /// Object store upload or download failed
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Kinds of records the pipeline resolves by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A processing task
    Task,
    /// An output content type
    ContentType,
    /// A task configuration
    TaskConfig,
    /// A system prompt template
    SystemPrompt,
}

impl Entity {
    /// Snake-case name used in error codes
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Task => "task",
            Entity::ContentType => "content_type",
            Entity::TaskConfig => "task_config",
            Entity::SystemPrompt => "system_prompt",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Entity::Task => "task",
            Entity::ContentType => "content type",
            Entity::TaskConfig => "task config",
            Entity::SystemPrompt => "system prompt",
        };
        f.write_str(label)
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Stored value could not be decoded into its typed form
    #[error("invalid stored value: {0}")]
    InvalidValue(String),

    /// Constraint violation (e.g., a second output record for a task)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Input acquisition errors
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The task has no input file records at all
    #[error("no input files recorded for task {task_id}")]
    NoInputFiles {
        /// The task being processed
        task_id: String,
    },

    /// Every input file failed to resolve
    #[error("none of the {attempted} input files for task {task_id} could be read")]
    NoValidInputFiles {
        /// The task being processed
        task_id: String,
        /// How many files were attempted
        attempted: usize,
    },
}

/// Generation provider errors
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider rejected the request or returned an unusable response
    #[error("{provider}: {reason}")]
    Provider {
        /// Provider name
        provider: String,
        /// What went wrong
        reason: String,
    },

    /// The provider did not answer within the configured timeout
    #[error("{provider} timed out after {seconds}s")]
    Timeout {
        /// Provider name
        provider: String,
        /// The timeout that elapsed
        seconds: u64,
    },

    /// The provider answered but produced no text
    #[error("{provider} returned no content")]
    EmptyResponse {
        /// Provider name
        provider: String,
    },
}

/// Output rendering errors
#[derive(Debug, Error)]
pub enum MaterializationError {
    /// Slide content parsed as JSON but matched none of the accepted shapes
    #[error("invalid slide format: {0}")]
    InvalidSlideFormat(String),

    /// Slide content was not valid JSON
    #[error("malformed slide JSON: {0}")]
    MalformedJson(String),

    /// Writing the output document failed
    #[error("failed to render {format}: {reason}")]
    Render {
        /// Target format
        format: String,
        /// The reason rendering failed
        reason: String,
    },
}

/// API error response format
///
/// Returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "status": "error",
///   "code": "task_not_found",
///   "message": "task not found: 42",
///   "details": { "entity": "task", "id": "42" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always "error"
    pub status: String,

    /// Machine-readable error code (e.g., "task_not_found", "generation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 404 only for the task itself; a missing dependency is a bad request
            Error::NotFound {
                entity: Entity::Task,
                ..
            } => 404,
            Error::NotFound { .. } => 400,

            Error::Config { .. } => 400,
            Error::Acquisition(_) => 400,

            Error::TaskNotClaimable { .. } => 409,

            Error::Generation(_) => 500,
            Error::Materialization(_) => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // External service errors
            Error::Notification(_) => 502,
            Error::Storage(_) => 502,
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::NotFound { entity, .. } => match entity {
                Entity::Task => "task_not_found",
                Entity::ContentType => "content_type_not_found",
                Entity::TaskConfig => "task_config_not_found",
                Entity::SystemPrompt => "system_prompt_not_found",
            },
            Error::TaskNotClaimable { .. } => "task_not_claimable",
            Error::Acquisition(e) => match e {
                AcquisitionError::NoInputFiles { .. } => "no_input_files",
                AcquisitionError::NoValidInputFiles { .. } => "no_valid_input_files",
            },
            Error::Generation(_) => "generation_error",
            Error::Materialization(e) => match e {
                MaterializationError::InvalidSlideFormat(_) => "invalid_slide_format",
                MaterializationError::MalformedJson(_) => "malformed_json",
                MaterializationError::Render { .. } => "materialization_error",
            },
            Error::Notification(_) => "notification_error",
            Error::Storage(_) => "storage_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::NotFound { entity, id } => Some(serde_json::json!({
                "entity": entity.as_str(),
                "id": id,
            })),
            Error::TaskNotClaimable { id, status } => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::Acquisition(AcquisitionError::NoInputFiles { task_id }) => {
                Some(serde_json::json!({ "task_id": task_id }))
            }
            Error::Acquisition(AcquisitionError::NoValidInputFiles { task_id, attempted }) => {
                Some(serde_json::json!({
                    "task_id": task_id,
                    "attempted": attempted,
                }))
            }
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        ApiError {
            status: "error".to_string(),
            code,
            message,
            details,
        }
    }
}
