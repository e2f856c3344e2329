//! Output persistence: local write, then best-effort remote publish.

use crate::error::Result;
use crate::types::{OutputFormat, TaskId};

use super::Orchestrator;

impl Orchestrator {
    /// Store rendered output and return the location to record
    ///
    /// The file is always written to `<store>/output/output_<taskId>.<ext>`. It is then
    /// published under `output/output_<taskId>.<ext>` when an object store is configured.
    /// A failed publish keeps the local path.
    pub(crate) async fn persist_output(
        &self,
        task_id: &TaskId,
        format: OutputFormat,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let file_name = format.output_file_name(task_id);
        let output_dir = self.config.storage.output_dir();
        tokio::fs::create_dir_all(&output_dir).await?;

        let local_path = output_dir.join(&file_name);
        tokio::fs::write(&local_path, &bytes).await?;
        let local = local_path.to_string_lossy().into_owned();
        tracing::info!(task_id = %task_id, path = %local, bytes = bytes.len(), "output written");

        let Some(store) = &self.object_store else {
            return Ok(local);
        };

        let key = format!("output/{}", file_name);
        match store.upload(&key, bytes, format.mime_type()).await {
            Ok(url) => {
                tracing::info!(task_id = %task_id, store = store.name(), url = %url, "output published");
                Ok(url)
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %task_id,
                    store = store.name(),
                    key = %key,
                    error = %e,
                    "publish failed, keeping local output"
                );
                Ok(local)
            }
        }
    }
}
