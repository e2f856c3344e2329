//! Content types, task configs and system prompts.
//!
//! The orchestrator only reads these; the insert helpers exist for provisioning.

use crate::error::DatabaseError;
use crate::types::{ContentType, SystemPrompt, TaskConfig};
use crate::{Error, Result};

use super::{ContentTypeRow, Database, SystemPromptRow, TaskConfigRow};

impl Database {
    /// Insert or replace a content type
    pub async fn upsert_content_type(&self, content_type: &ContentType) -> Result<()> {
        let extensions = serde_json::to_string(&content_type.extensions)?;

        sqlx::query(
            r#"
            INSERT INTO contenttype (id, name, extensions) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, extensions = excluded.extensions
            "#,
        )
        .bind(&content_type.id)
        .bind(&content_type.name)
        .bind(extensions)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to upsert content type: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get a content type by ID
    pub async fn get_content_type(&self, id: &str) -> Result<Option<ContentType>> {
        let row = sqlx::query_as::<_, ContentTypeRow>(
            "SELECT id, name, extensions FROM contenttype WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get content type: {}",
                e
            )))
        })?;

        row.map(ContentType::try_from).transpose()
    }

    /// Insert or replace a task config
    pub async fn upsert_task_config(&self, config: &TaskConfig) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO taskconfig (id, focus_area, content_length, difficulty_level)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                focus_area = excluded.focus_area,
                content_length = excluded.content_length,
                difficulty_level = excluded.difficulty_level
            "#,
        )
        .bind(&config.id)
        .bind(&config.focus_area)
        .bind(&config.content_length)
        .bind(&config.difficulty_level)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to upsert task config: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get a task config by ID
    pub async fn get_task_config(&self, id: &str) -> Result<Option<TaskConfig>> {
        let row = sqlx::query_as::<_, TaskConfigRow>(
            r#"
            SELECT id, focus_area, content_length, difficulty_level
            FROM taskconfig
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get task config: {}",
                e
            )))
        })?;

        Ok(row.map(TaskConfig::from))
    }

    /// Insert or replace the prompt for a content type
    pub async fn upsert_system_prompt(&self, prompt: &SystemPrompt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO systemprompts (output_content_type_id, prompt) VALUES (?, ?)
            ON CONFLICT(output_content_type_id) DO UPDATE SET prompt = excluded.prompt
            "#,
        )
        .bind(&prompt.output_content_type_id)
        .bind(&prompt.prompt)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to upsert system prompt: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get the prompt template for an output content type
    pub async fn get_system_prompt(&self, content_type_id: &str) -> Result<Option<SystemPrompt>> {
        let row = sqlx::query_as::<_, SystemPromptRow>(
            r#"
            SELECT output_content_type_id, prompt
            FROM systemprompts
            WHERE output_content_type_id = ?
            "#,
        )
        .bind(content_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get system prompt: {}",
                e
            )))
        })?;

        Ok(row.map(SystemPrompt::from))
    }
}
