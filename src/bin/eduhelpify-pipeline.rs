//! HTTP server for the document processing pipeline.
//!
//! Configuration comes from the environment (and `.env`); see `Config::from_env`.

use eduhelpify_pipeline::{Config, Orchestrator, api, logging};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.logging);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "configuration rejected");
        return ExitCode::FAILURE;
    }

    let config = Arc::new(config);
    let orchestrator = match Orchestrator::from_config(config.clone()).await {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => {
            tracing::error!(error = %e, "failed to start pipeline");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        store = %config.storage.store_dir.display(),
        database = %config.persistence.database_path.display(),
        model = %config.generation.model,
        "pipeline ready"
    );

    match api::start_api_server(orchestrator, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "API server failed");
            ExitCode::FAILURE
        }
    }
}
