//! Batch driver over all queued tasks.

use crate::error::Result;
use crate::types::{QueueEntryOutcome, QueueReport, TaskStatus};

use super::Orchestrator;

impl Orchestrator {
    /// Process every QUEUED task, oldest first, one at a time
    ///
    /// A failing task is recorded in the report and the loop moves on. Only failing to list
    /// the queue is an error.
    pub async fn process_queue(&self) -> Result<QueueReport> {
        let queued = self.store.list_queued_tasks().await?;
        if queued.is_empty() {
            tracing::info!("No queued tasks found");
            return Ok(QueueReport::default());
        }

        tracing::info!(count = queued.len(), "processing queued tasks");

        let mut report = QueueReport::default();
        for task_id in queued {
            let entry = match self.process(&task_id).await {
                Ok(_) => QueueEntryOutcome {
                    task_id,
                    status: TaskStatus::Completed,
                    error: None,
                },
                Err(e) => {
                    // FAILED normally, but a task claimed elsewhere keeps its own status
                    let status = match self.store.get_task(&task_id).await {
                        Ok(Some(task)) => task.status,
                        _ => TaskStatus::Failed,
                    };
                    QueueEntryOutcome {
                        task_id,
                        status,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.entries.push(entry);
        }

        tracing::info!(
            total = report.entries.len(),
            completed = report.completed(),
            "queue pass finished"
        );
        Ok(report)
    }
}
