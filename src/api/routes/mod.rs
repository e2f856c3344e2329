//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`processing`] — Single-task and whole-queue processing
//! - [`system`] — Service banner, health, OpenAPI

use serde::{Deserialize, Serialize};

use crate::types::QueueEntryOutcome;

mod processing;
mod system;

pub use processing::*;
pub use system::*;

/// Response for GET /
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ServiceInfo {
    /// Always "running"
    pub status: String,
    /// Service name
    pub service: String,
}

/// Response for POST /process/:task_id
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProcessResponse {
    /// Always "success"
    pub status: String,
    /// Human-readable summary
    pub message: String,
    /// Whether the completion email was accepted by a provider
    pub email_sent: bool,
}

/// Response for POST /process_queue
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QueueResponse {
    /// Always "success"
    pub status: String,
    /// Human-readable summary
    pub message: String,
    /// Per-task outcomes in processing order
    pub tasks: Vec<QueueEntryOutcome>,
}
