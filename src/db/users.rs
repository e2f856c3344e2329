//! Task owners.

use crate::error::DatabaseError;
use crate::types::{TaskId, User};
use crate::{Error, Result};

use super::{Database, UserRow};

impl Database {
    /// Insert or replace a user
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET email = excluded.email, username = excluded.username
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to upsert user: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Resolve the user who owns a task
    pub async fn get_user_for_task(&self, task_id: &TaskId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.username
            FROM task t
            JOIN users u ON u.id = t.user_id
            WHERE t.id = ?
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get user for task: {}",
                e
            )))
        })?;

        Ok(row.map(User::from))
    }
}
