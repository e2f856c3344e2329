//! Task store abstraction consumed by the orchestrator and notification dispatcher.

use async_trait::async_trait;

use crate::Result;
use crate::types::{
    ContentType, FileCategory, FileRecord, NewFileRecord, SystemPrompt, Task, TaskConfig, TaskId,
    User,
};

use super::Database;

/// Durable storage of tasks and everything a task references
///
/// Implementations must make [`TaskStore::claim_task`] a conditional update: it succeeds for
/// exactly one caller and only when the task is currently QUEUED. Terminal writes only apply
/// to an INPROGRESS task.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Look up a task
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Conditionally move QUEUED to INPROGRESS; `false` when the task was not QUEUED
    async fn claim_task(&self, id: &TaskId) -> Result<bool>;

    /// Write COMPLETED for an INPROGRESS task
    async fn complete_task(&self, id: &TaskId) -> Result<bool>;

    /// Write FAILED with a reason for an INPROGRESS task
    async fn fail_task(&self, id: &TaskId, reason: &str) -> Result<bool>;

    /// Queued task IDs, oldest first
    async fn list_queued_tasks(&self) -> Result<Vec<TaskId>>;

    /// Look up a content type
    async fn get_content_type(&self, id: &str) -> Result<Option<ContentType>>;

    /// Look up a task config
    async fn get_task_config(&self, id: &str) -> Result<Option<TaskConfig>>;

    /// Look up the prompt template for an output content type
    async fn get_system_prompt(&self, content_type_id: &str) -> Result<Option<SystemPrompt>>;

    /// A task's file records of one category
    async fn list_files(&self, task_id: &TaskId, category: FileCategory)
    -> Result<Vec<FileRecord>>;

    /// Record a file
    async fn insert_file_record(&self, record: &NewFileRecord) -> Result<i64>;

    /// Remove a task's file records of one category
    async fn delete_files(&self, task_id: &TaskId, category: FileCategory) -> Result<u64>;

    /// The user who owns a task
    async fn get_user_for_task(&self, task_id: &TaskId) -> Result<Option<User>>;
}

#[async_trait]
impl TaskStore for Database {
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        Database::get_task(self, id).await
    }

    async fn claim_task(&self, id: &TaskId) -> Result<bool> {
        Database::claim_task(self, id).await
    }

    async fn complete_task(&self, id: &TaskId) -> Result<bool> {
        Database::complete_task(self, id).await
    }

    async fn fail_task(&self, id: &TaskId, reason: &str) -> Result<bool> {
        Database::fail_task(self, id, reason).await
    }

    async fn list_queued_tasks(&self) -> Result<Vec<TaskId>> {
        Database::list_queued_tasks(self).await
    }

    async fn get_content_type(&self, id: &str) -> Result<Option<ContentType>> {
        Database::get_content_type(self, id).await
    }

    async fn get_task_config(&self, id: &str) -> Result<Option<TaskConfig>> {
        Database::get_task_config(self, id).await
    }

    async fn get_system_prompt(&self, content_type_id: &str) -> Result<Option<SystemPrompt>> {
        Database::get_system_prompt(self, content_type_id).await
    }

    async fn list_files(
        &self,
        task_id: &TaskId,
        category: FileCategory,
    ) -> Result<Vec<FileRecord>> {
        Database::list_files(self, task_id, category).await
    }

    async fn insert_file_record(&self, record: &NewFileRecord) -> Result<i64> {
        Database::insert_file_record(self, record).await
    }

    async fn delete_files(&self, task_id: &TaskId, category: FileCategory) -> Result<u64> {
        Database::delete_files(self, task_id, category).await
    }

    async fn get_user_for_task(&self, task_id: &TaskId) -> Result<Option<User>> {
        Database::get_user_for_task(self, task_id).await
    }
}
