//! Database lifecycle and schema migrations.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

use super::Database;

impl Database {
    /// Create a new database connection
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory: {}",
                    e
                )))
            })?;
        }

        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to database: {}",
                e
            )))
        })?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create schema_version table: {}",
                e
            )))
        })?;

        let current_version: Option<Option<i64>> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query schema version: {}",
                        e
                    )))
                })?;

        let current_version = current_version.flatten().unwrap_or(0);

        if current_version < 1 {
            Self::apply_migration(&mut conn, 1).await?;
        }
        if current_version < 2 {
            Self::apply_migration(&mut conn, 2).await?;
        }

        Ok(())
    }

    /// Apply one migration inside a transaction
    async fn apply_migration(conn: &mut SqliteConnection, version: i32) -> Result<()> {
        tracing::info!(version, "Applying database migration");

        sqlx::query("BEGIN")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to begin transaction: {}",
                    e
                )))
            })?;

        let result = async {
            match version {
                1 => Self::migrate_v1(conn).await?,
                2 => Self::migrate_v2(conn).await?,
                other => {
                    return Err(Error::Database(DatabaseError::MigrationFailed(format!(
                        "Unknown migration version {}",
                        other
                    ))));
                }
            }
            Self::record_migration(conn, version).await?;
            Ok::<(), Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::MigrationFailed(format!(
                            "Failed to commit migration v{}: {}",
                            version, e
                        )))
                    })?;
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                return Err(e);
            }
        }

        tracing::info!(version, "Database migration complete");
        Ok(())
    }

    /// Migration v1: catalog, task and file tables
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
        let statements = [
            (
                "contenttype",
                r#"
                CREATE TABLE contenttype (
                    id TEXT PRIMARY KEY,
                    name TEXT,
                    extensions TEXT NOT NULL DEFAULT '[]'
                )
                "#,
            ),
            (
                "taskconfig",
                r#"
                CREATE TABLE taskconfig (
                    id TEXT PRIMARY KEY,
                    focus_area TEXT,
                    content_length TEXT,
                    difficulty_level TEXT
                )
                "#,
            ),
            (
                "systemprompts",
                r#"
                CREATE TABLE systemprompts (
                    output_content_type_id TEXT PRIMARY KEY,
                    prompt TEXT NOT NULL
                )
                "#,
            ),
            (
                "users",
                r#"
                CREATE TABLE users (
                    id TEXT PRIMARY KEY,
                    email TEXT,
                    username TEXT
                )
                "#,
            ),
            (
                "task",
                r#"
                CREATE TABLE task (
                    id TEXT PRIMARY KEY,
                    status TEXT NOT NULL DEFAULT 'QUEUED',
                    task_config_id TEXT,
                    output_content_type_id TEXT,
                    user_prompt TEXT,
                    user_id TEXT,
                    error_message TEXT,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )
                "#,
            ),
            (
                "task status index",
                "CREATE INDEX idx_task_status ON task(status, created_at)",
            ),
            (
                "filestore",
                r#"
                CREATE TABLE filestore (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task_id TEXT NOT NULL REFERENCES task(id) ON DELETE CASCADE,
                    file_name TEXT NOT NULL,
                    stored_location TEXT NOT NULL,
                    file_category TEXT NOT NULL,
                    file_type_id TEXT,
                    created_at INTEGER NOT NULL
                )
                "#,
            ),
            (
                "filestore task index",
                "CREATE INDEX idx_filestore_task ON filestore(task_id, file_category)",
            ),
        ];

        for (name, sql) in statements {
            sqlx::query(sql).execute(&mut *conn).await.map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to create {}: {}",
                    name, e
                )))
            })?;
        }

        Ok(())
    }

    /// Migration v2: at most one output record per task
    async fn migrate_v2(conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX idx_filestore_one_output
            ON filestore(task_id) WHERE file_category = 'output'
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create output uniqueness index: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Record a migration version
    async fn record_migration(conn: &mut SqliteConnection, version: i32) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to record migration: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
