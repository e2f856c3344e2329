//! Task lookup, claiming and terminal status writes.

use crate::error::DatabaseError;
use crate::types::{Task, TaskId, TaskStatus};
use crate::{Error, Result};

use super::{Database, NewTask, TaskRow};

impl Database {
    /// Insert a new task in QUEUED state
    pub async fn insert_task(&self, task: &NewTask) -> Result<TaskId> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO task (
                id, status, task_config_id, output_content_type_id,
                user_prompt, user_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(TaskStatus::Queued.as_str())
        .bind(&task.task_config_id)
        .bind(&task.output_content_type_id)
        .bind(&task.user_prompt)
        .bind(&task.user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert task: {}",
                e
            )))
        })?;

        Ok(TaskId::new(task.id.clone()))
    }

    /// Get a task by ID
    pub async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT
                id, status, task_config_id, output_content_type_id,
                user_prompt, user_id, error_message, created_at, updated_at
            FROM task
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get task: {}",
                e
            )))
        })?;

        row.map(Task::try_from).transpose()
    }

    /// Atomically move a task from QUEUED to INPROGRESS
    ///
    /// Returns `true` only for the caller whose update changed the row. Any other status,
    /// including a concurrent claim that won first, yields `false`.
    pub async fn claim_task(&self, id: &TaskId) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE task
            SET status = ?, error_message = NULL, updated_at = ?
            WHERE id = ? AND UPPER(status) = 'QUEUED'
            "#,
        )
        .bind(TaskStatus::InProgress.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to claim task: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark a claimed task COMPLETED
    pub async fn complete_task(&self, id: &TaskId) -> Result<bool> {
        self.finish_task(id, TaskStatus::Completed, None).await
    }

    /// Mark a claimed task FAILED with a reason
    pub async fn fail_task(&self, id: &TaskId, reason: &str) -> Result<bool> {
        self.finish_task(id, TaskStatus::Failed, Some(reason)).await
    }

    // Only an INPROGRESS task may become terminal, so a finished task is never rewritten
    async fn finish_task(
        &self,
        id: &TaskId,
        status: TaskStatus,
        reason: Option<&str>,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE task
            SET status = ?, error_message = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(now)
        .bind(id)
        .bind(TaskStatus::InProgress.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to set task status to {}: {}",
                status, e
            )))
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// List queued task IDs, oldest first
    pub async fn list_queued_tasks(&self) -> Result<Vec<TaskId>> {
        let ids = sqlx::query_scalar::<_, TaskId>(
            r#"
            SELECT id FROM task
            WHERE UPPER(status) = 'QUEUED'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list queued tasks: {}",
                e
            )))
        })?;

        Ok(ids)
    }
}
