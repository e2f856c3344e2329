//! Database layer for the document pipeline
//!
//! Handles SQLite persistence for tasks, their configuration catalog, file records and users.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`tasks`] — Task lookup, claiming and terminal status writes
//! - [`catalog`] — Content types, task configs and system prompts
//! - [`files`] — Input and output file records
//! - [`users`] — Task owners
//! - [`store`] — The [`TaskStore`] trait the orchestrator depends on
//!
//! Rows are decoded into the typed records of [`crate::types`] here and nowhere else.

use crate::error::DatabaseError;
use crate::types::{
    ContentType, FileCategory, FileRecord, SystemPrompt, Task, TaskConfig, TaskId, TaskStatus,
    User,
};
use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod catalog;
mod files;
mod migrations;
mod store;
mod tasks;
mod users;

pub use store::TaskStore;

/// New task to be inserted into the database
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// Task identifier
    pub id: String,
    /// Referenced task configuration
    pub task_config_id: Option<String>,
    /// Referenced output content type
    pub output_content_type_id: Option<String>,
    /// Free-form requester instructions
    pub user_prompt: Option<String>,
    /// Owning user
    pub user_id: Option<String>,
}

/// Task record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskRow {
    pub id: TaskId,
    pub status: String,
    pub task_config_id: Option<String>,
    pub output_content_type_id: Option<String>,
    pub user_prompt: Option<String>,
    pub user_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<TaskRow> for Task {
    type Error = Error;

    fn try_from(row: TaskRow) -> Result<Self> {
        let status = TaskStatus::parse(&row.status).ok_or_else(|| {
            Error::Database(DatabaseError::InvalidValue(format!(
                "task {} has unknown status '{}'",
                row.id, row.status
            )))
        })?;

        Ok(Task {
            id: row.id,
            status,
            task_config_id: row.task_config_id,
            output_content_type_id: row.output_content_type_id,
            user_prompt: row.user_prompt,
            user_id: row.user_id,
            error_message: row.error_message,
            created_at: timestamp(row.created_at),
            updated_at: timestamp(row.updated_at),
        })
    }
}

/// Content type record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ContentTypeRow {
    pub id: String,
    pub name: Option<String>,
    pub extensions: Option<String>,
}

impl TryFrom<ContentTypeRow> for ContentType {
    type Error = Error;

    fn try_from(row: ContentTypeRow) -> Result<Self> {
        let extensions = match row.extensions.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(raw) if raw.starts_with('[') => serde_json::from_str::<Vec<String>>(raw)
                .map_err(|e| {
                    Error::Database(DatabaseError::InvalidValue(format!(
                        "content type {} has malformed extensions: {}",
                        row.id, e
                    )))
                })?,
            // Older rows hold a comma-separated list
            Some(raw) => raw
                .split(',')
                .map(|ext| ext.trim().to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
        };

        Ok(ContentType {
            id: row.id,
            name: row.name.filter(|n| !n.trim().is_empty()),
            extensions,
        })
    }
}

/// Task config record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskConfigRow {
    pub id: String,
    pub focus_area: Option<String>,
    pub content_length: Option<String>,
    pub difficulty_level: Option<String>,
}

impl From<TaskConfigRow> for TaskConfig {
    fn from(row: TaskConfigRow) -> Self {
        TaskConfig {
            id: row.id,
            focus_area: row.focus_area,
            content_length: row.content_length,
            difficulty_level: row.difficulty_level,
        }
    }
}

/// System prompt record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SystemPromptRow {
    pub output_content_type_id: String,
    pub prompt: String,
}

impl From<SystemPromptRow> for SystemPrompt {
    fn from(row: SystemPromptRow) -> Self {
        SystemPrompt {
            output_content_type_id: row.output_content_type_id,
            prompt: row.prompt,
        }
    }
}

/// File store record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct FileRow {
    pub id: i64,
    pub task_id: TaskId,
    pub file_name: String,
    pub stored_location: String,
    pub file_category: String,
    pub file_type_id: Option<String>,
    pub created_at: i64,
}

impl TryFrom<FileRow> for FileRecord {
    type Error = Error;

    fn try_from(row: FileRow) -> Result<Self> {
        let category = FileCategory::parse(&row.file_category).ok_or_else(|| {
            Error::Database(DatabaseError::InvalidValue(format!(
                "file {} has unknown category '{}'",
                row.id, row.file_category
            )))
        })?;

        Ok(FileRecord {
            id: row.id,
            task_id: row.task_id,
            file_name: row.file_name,
            stored_location: row.stored_location,
            category,
            file_type_id: row.file_type_id,
            created_at: timestamp(row.created_at),
        })
    }
}

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email.filter(|e| !e.trim().is_empty()),
            username: row.username,
        }
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Database handle for the task store
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
