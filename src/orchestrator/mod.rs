//! Task orchestration split into focused submodules.
//!
//! The `Orchestrator` struct and its methods are organized by stage:
//! - [`pipeline`] - Claim, resolve, acquire, generate and finish one task
//! - [`persist`] - Local output writes and remote publishing
//! - [`queue`] - Sequential processing of every queued task

mod persist;
mod pipeline;
mod queue;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::acquisition::FileAcquirer;
use crate::config::Config;
use crate::db::{Database, TaskStore};
use crate::error::Result;
use crate::generation::{GeminiProvider, GenerationProvider};
use crate::materialize::OutputMaterializer;
use crate::notification::{NotificationDispatcher, NotificationProvider, providers_from_config};
use crate::storage::{ObjectStore, SupabaseStorage};

/// External collaborators the orchestrator is built from
///
/// Everything is injected; nothing is looked up globally.
#[derive(Clone)]
pub struct OrchestratorServices {
    /// Task store
    pub store: Arc<dyn TaskStore>,
    /// Content generation
    pub generator: Arc<dyn GenerationProvider>,
    /// Remote object store for input fallback and output publishing
    pub object_store: Option<Arc<dyn ObjectStore>>,
    /// Email providers, tried in order
    pub notifiers: Vec<Arc<dyn NotificationProvider>>,
}

/// Runs tasks through the pipeline (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Orchestrator {
    pub(crate) config: Arc<Config>,
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) generator: Arc<dyn GenerationProvider>,
    pub(crate) object_store: Option<Arc<dyn ObjectStore>>,
    pub(crate) acquirer: FileAcquirer,
    pub(crate) materializer: OutputMaterializer,
    pub(crate) dispatcher: NotificationDispatcher,
}

impl Orchestrator {
    /// Wire an orchestrator from explicit services
    pub fn new(config: Arc<Config>, services: OrchestratorServices) -> Self {
        let OrchestratorServices {
            store,
            generator,
            object_store,
            notifiers,
        } = services;

        let acquirer = FileAcquirer::new(
            &config.storage,
            &config.acquisition,
            object_store.clone(),
        );
        let dispatcher = NotificationDispatcher::new(
            store.clone(),
            notifiers,
            config.notifications.sender.clone(),
            config.storage.output_dir(),
            config.acquisition.fetch_timeout,
        );

        Self {
            config,
            store,
            generator,
            object_store,
            acquirer,
            materializer: OutputMaterializer,
            dispatcher,
        }
    }

    /// Build the production service graph from configuration
    ///
    /// Opens (and migrates) the SQLite store, and creates the Gemini provider, the optional
    /// Supabase object store and the notification chain.
    pub async fn from_config(config: Arc<Config>) -> Result<Self> {
        let db = Database::new(&config.persistence.database_path).await?;
        let generator = GeminiProvider::new(&config.generation)?;

        let object_store: Option<Arc<dyn ObjectStore>> =
            config.storage.remote.as_ref().map(|remote| {
                Arc::new(SupabaseStorage::new(remote, config.acquisition.fetch_timeout))
                    as Arc<dyn ObjectStore>
            });
        if object_store.is_none() {
            tracing::info!("No object store configured, outputs stay local");
        }

        let notifiers = providers_from_config(
            &config.notifications.providers,
            config.notifications.timeout,
        );
        if notifiers.is_empty() {
            tracing::info!("No notification providers configured, completion emails disabled");
        }

        for dir in [config.storage.input_dir(), config.storage.output_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }

        Ok(Self::new(
            config,
            OrchestratorServices {
                store: Arc::new(db),
                generator: Arc::new(generator),
                object_store,
                notifiers,
            },
        ))
    }

    /// Configuration the orchestrator runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The task store
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }
}
