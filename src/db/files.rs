//! Input and output file records.

use crate::error::DatabaseError;
use crate::types::{FileCategory, FileRecord, NewFileRecord, TaskId};
use crate::{Error, Result};

use super::{Database, FileRow};

impl Database {
    /// Insert a file record
    ///
    /// A second output record for the same task violates the store's uniqueness index and is
    /// reported as [`DatabaseError::ConstraintViolation`].
    pub async fn insert_file_record(&self, record: &NewFileRecord) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO filestore (
                task_id, file_name, stored_location, file_category, file_type_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.task_id)
        .bind(&record.file_name)
        .bind(&record.stored_location)
        .bind(record.category.as_str())
        .bind(&record.file_type_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let unique_violation = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if unique_violation {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "task {} already has an output file",
                    record.task_id
                )))
            } else {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert file record: {}",
                    e
                )))
            }
        })?;

        Ok(result.last_insert_rowid())
    }

    /// List a task's file records of one category, in insertion order
    pub async fn list_files(
        &self,
        task_id: &TaskId,
        category: FileCategory,
    ) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, task_id, file_name, stored_location, file_category, file_type_id, created_at
            FROM filestore
            WHERE task_id = ? AND LOWER(file_category) = ?
            ORDER BY id ASC
            "#,
        )
        .bind(task_id)
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list files: {}",
                e
            )))
        })?;

        rows.into_iter().map(FileRecord::try_from).collect()
    }

    /// Delete a task's file records of one category, returning how many were removed
    pub async fn delete_files(&self, task_id: &TaskId, category: FileCategory) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM filestore
            WHERE task_id = ? AND LOWER(file_category) = ?
            "#,
        )
        .bind(task_id)
        .bind(category.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to delete files: {}",
                e
            )))
        })?;

        Ok(result.rows_affected())
    }
}
