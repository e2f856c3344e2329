//! Single-task pipeline: claim, resolve, acquire, generate, render, publish, notify.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::error::{AcquisitionError, Entity, Error, GenerationError, Result, ToHttpStatus};
use crate::generation::{ContentFormat, GeneratedContent, GenerationRequest, InputDocument};
use crate::prompt::PromptBuilder;
use crate::types::{
    ContentType, FileCategory, NewFileRecord, OutputFormat, ProcessOutcome, Task, TaskId,
};

use super::Orchestrator;

/// What a successful run produced before notification
struct RenderedOutput {
    format: OutputFormat,
    location: String,
}

/// Everything resolved from the task's references
struct TaskPlan {
    content_type: ContentType,
    format: OutputFormat,
    system_prompt: String,
}

impl Orchestrator {
    /// Process one task end to end
    ///
    /// A task that does not exist or is not QUEUED is rejected without any write. Once the
    /// task is claimed, the call always ends with exactly one terminal status write:
    /// COMPLETED on success, FAILED with `"<code>: <message>"` otherwise. The claimed work
    /// runs on its own tokio task, so dropping the returned future does not strand the task
    /// INPROGRESS, and a panic in a provider becomes a FAILED write. Notification failures
    /// never fail the task; they show up as `email_sent = false`.
    pub async fn process(&self, task_id: &TaskId) -> Result<ProcessOutcome> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: Entity::Task,
                id: task_id.to_string(),
            })?;

        if !self.store.claim_task(task_id).await? {
            let status = self
                .store
                .get_task(task_id)
                .await?
                .map(|t| t.status)
                .unwrap_or(task.status);
            tracing::warn!(task_id = %task_id, status = %status, "task not claimable");
            return Err(Error::TaskNotClaimable {
                id: task_id.to_string(),
                status: status.to_string(),
            });
        }
        tracing::info!(task_id = %task_id, "task claimed");

        // Detached so the terminal write happens even if the caller is dropped
        let worker = self.clone();
        let handle = tokio::spawn(async move { worker.finish_claimed(task).await });
        match handle.await {
            Ok(result) => result,
            Err(e) => {
                let error = Error::Other(format!("task worker stopped: {}", e));
                self.abandon(task_id, &error).await;
                Err(error)
            }
        }
    }

    async fn finish_claimed(&self, task: Task) -> Result<ProcessOutcome> {
        let task_id = &task.id;

        let output = match AssertUnwindSafe(self.run_claimed(&task)).catch_unwind().await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                self.record_failure(task_id, &e).await;
                return Err(e);
            }
            Err(panic) => {
                let error = Error::Other(format!(
                    "task processing panicked: {}",
                    panic_message(panic.as_ref())
                ));
                self.record_failure(task_id, &error).await;
                return Err(error);
            }
        };

        let email_sent = AssertUnwindSafe(self.dispatcher.send(task_id))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                tracing::error!(
                    task_id = %task_id,
                    panic = panic_message(panic.as_ref()),
                    "notification panicked"
                );
                false
            });
        if !email_sent {
            tracing::warn!(task_id = %task_id, "completion email not sent");
        }

        match self.store.complete_task(task_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(task_id = %task_id, "task left INPROGRESS before completion write");
            }
            Err(e) => {
                self.abandon(task_id, &e).await;
                return Err(e);
            }
        }

        tracing::info!(
            task_id = %task_id,
            format = %output.format,
            location = %output.location,
            email_sent,
            "task completed"
        );

        Ok(ProcessOutcome {
            task_id: task_id.clone(),
            format: output.format,
            output_location: output.location,
            email_sent,
        })
    }

    async fn run_claimed(&self, task: &Task) -> Result<RenderedOutput> {
        let plan = self.plan(task).await?;
        let files = self.acquire_inputs(&task.id).await?;
        let generated = self.generate(task, &plan, files).await?;
        if plan.format == OutputFormat::Pptx && generated.format_hint != ContentFormat::Json {
            tracing::warn!(
                task_id = %task.id,
                provider = self.generator.name(),
                "slide deck requested but provider returned text, parsing it as JSON"
            );
        }

        let bytes = self.materializer.render(&generated.text, plan.format)?;
        let location = self.persist_output(&task.id, plan.format, bytes).await?;

        self.store
            .insert_file_record(&NewFileRecord {
                task_id: task.id.clone(),
                file_name: plan.format.output_file_name(&task.id),
                stored_location: location.clone(),
                category: FileCategory::Output,
                file_type_id: Some(plan.content_type.id.clone()),
            })
            .await?;

        Ok(RenderedOutput {
            format: plan.format,
            location,
        })
    }

    async fn plan(&self, task: &Task) -> Result<TaskPlan> {
        let content_type_id = required_ref(&task.output_content_type_id, Entity::ContentType)?;
        let content_type = self
            .store
            .get_content_type(content_type_id)
            .await?
            .ok_or_else(|| not_found(Entity::ContentType, content_type_id))?;

        let config_id = required_ref(&task.task_config_id, Entity::TaskConfig)?;
        let task_config = self
            .store
            .get_task_config(config_id)
            .await?
            .ok_or_else(|| not_found(Entity::TaskConfig, config_id))?;

        let template = self
            .store
            .get_system_prompt(&content_type.id)
            .await?
            .ok_or_else(|| not_found(Entity::SystemPrompt, &content_type.id))?;

        let format = OutputFormat::resolve(&content_type);
        tracing::info!(
            task_id = %task.id,
            content_type = %content_type.id,
            format = %format,
            "task resolved"
        );

        Ok(TaskPlan {
            system_prompt: PromptBuilder::from_config(&template.prompt, &task_config),
            content_type,
            format,
        })
    }

    async fn acquire_inputs(&self, task_id: &TaskId) -> Result<Vec<InputDocument>> {
        let records = self.store.list_files(task_id, FileCategory::Input).await?;
        if records.is_empty() {
            return Err(AcquisitionError::NoInputFiles {
                task_id: task_id.to_string(),
            }
            .into());
        }

        let report = self.acquirer.resolve(&records).await;
        let mut documents = Vec::with_capacity(report.resolved.len());
        for file in report.resolved {
            match tokio::fs::read(&file.path).await {
                Ok(bytes) => documents.push(InputDocument {
                    file_name: file.file_name,
                    bytes,
                    mime_type: file.mime_type.to_string(),
                }),
                Err(e) => {
                    tracing::warn!(
                        task_id = %task_id,
                        path = %file.path.display(),
                        error = %e,
                        "resolved input could not be read"
                    );
                }
            }
        }

        if documents.is_empty() {
            return Err(AcquisitionError::NoValidInputFiles {
                task_id: task_id.to_string(),
                attempted: records.len(),
            }
            .into());
        }

        tracing::info!(
            task_id = %task_id,
            files = documents.len(),
            requested = records.len(),
            "inputs acquired"
        );
        Ok(documents)
    }

    async fn generate(
        &self,
        task: &Task,
        plan: &TaskPlan,
        files: Vec<InputDocument>,
    ) -> Result<GeneratedContent> {
        let request = GenerationRequest {
            files,
            system_prompt: plan.system_prompt.clone(),
            user_prompt: task.user_prompt.clone().unwrap_or_default(),
            desired_format: plan.format,
        };

        let timeout = self.config.generation.timeout;
        let generated = tokio::time::timeout(timeout, self.generator.generate(request))
            .await
            .map_err(|_| GenerationError::Timeout {
                provider: self.generator.name().to_string(),
                seconds: timeout.as_secs(),
            })??;

        tracing::info!(
            task_id = %task.id,
            provider = self.generator.name(),
            chars = generated.text.len(),
            format_hint = ?generated.format_hint,
            "content generated"
        );
        Ok(generated)
    }

    /// Fail a task that may already have an output record
    ///
    /// A FAILED task keeps no output record, so the record is removed first. If that removal
    /// fails the status is left alone.
    async fn abandon(&self, task_id: &TaskId, error: &Error) {
        match self.store.delete_files(task_id, FileCategory::Output).await {
            Ok(_) => self.record_failure(task_id, error).await,
            Err(e) => {
                tracing::error!(
                    task_id = %task_id,
                    error = %e,
                    "output record could not be removed, FAILED not written"
                );
            }
        }
    }

    /// Write FAILED for a claimed task; errors here are logged, never raised
    async fn record_failure(&self, task_id: &TaskId, error: &Error) {
        let reason = format!("{}: {}", error.error_code(), error);
        tracing::error!(task_id = %task_id, error = %error, "task failed");

        match self.store.fail_task(task_id, &reason).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(task_id = %task_id, "task no longer INPROGRESS, FAILED not written");
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "failed to record task failure");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn required_ref(value: &Option<String>, entity: Entity) -> Result<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| not_found(entity, "<unset>"))
}

fn not_found(entity: Entity, id: &str) -> Error {
    Error::NotFound {
        entity,
        id: id.to_string(),
    }
}
