//! # eduhelpify-pipeline
//!
//! Document processing pipeline for EduHelpify study material generation.
//!
//! A task names an output content type, a task config (difficulty, length, focus area) and a
//! set of uploaded input files. Processing a task:
//!
//! 1. claims it (QUEUED → INPROGRESS, conditionally)
//! 2. builds the generation prompt from the content type's template
//! 3. fetches the inputs from local storage or their URLs
//! 4. asks the generation provider for content
//! 5. renders txt, pdf, docx, pptx, json or html
//! 6. stores the output locally and publishes it to the object store
//! 7. emails the result to the task owner
//! 8. records COMPLETED, or FAILED with the reason if any stage before notification failed
//!
//! ## Quick Start
//!
//! ```no_run
//! use eduhelpify_pipeline::{Config, Orchestrator, TaskId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_env()?);
//!     config.validate()?;
//!
//!     let orchestrator = Orchestrator::from_config(config).await?;
//!     let outcome = orchestrator.process(&TaskId::new("task-123")).await?;
//!     println!("output at {}", outcome.output_location);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Input file acquisition
pub mod acquisition;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Content generation providers
pub mod generation;
/// Logging initialization for binaries
pub mod logging;
/// Output rendering
pub mod materialize;
/// Completion notifications
pub mod notification;
/// Task orchestration
pub mod orchestrator;
/// Prompt construction
pub mod prompt;
/// Remote object storage
pub mod storage;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use acquisition::{AcquisitionReport, FileAcquirer};
pub use config::Config;
pub use db::{Database, TaskStore};
pub use error::{
    AcquisitionError, ApiError, DatabaseError, Entity, Error, GenerationError,
    MaterializationError, Result, ToHttpStatus,
};
pub use generation::{GeminiProvider, GenerationProvider};
pub use materialize::OutputMaterializer;
pub use notification::{NotificationDispatcher, NotificationProvider};
pub use orchestrator::{Orchestrator, OrchestratorServices};
pub use prompt::PromptBuilder;
pub use storage::{ObjectStore, SupabaseStorage};
pub use types::{
    ContentType, FileCategory, FileRecord, OutputFormat, ProcessOutcome, QueueReport, Task,
    TaskConfig, TaskId, TaskStatus,
};

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Wait for a termination signal (Ctrl+C).
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
