//! Core types for the document pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a processing task
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl sqlx::Type<sqlx::Sqlite> for TaskId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Task status
///
/// One canonical spelling is written: `QUEUED`, `INPROGRESS`, `COMPLETED`, `FAILED`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Waiting to be claimed
    Queued,
    /// Claimed by a worker
    InProgress,
    /// Output produced and recorded
    Completed,
    /// Processing failed
    Failed,
}

impl TaskStatus {
    /// Canonical stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "QUEUED",
            TaskStatus::InProgress => "INPROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }

    /// Parse a stored status, accepting legacy spellings
    ///
    /// Matching is case-insensitive; `Processing` and `in_progress` read as
    /// [`TaskStatus::InProgress`].
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "QUEUED" => Some(TaskStatus::Queued),
            "INPROGRESS" | "PROCESSING" => Some(TaskStatus::InProgress),
            "COMPLETED" | "COMPLETE" => Some(TaskStatus::Completed),
            "FAILED" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// Whether this status ends the task lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conversion request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    pub id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// Referenced task configuration
    pub task_config_id: Option<String>,
    /// Referenced output content type
    pub output_content_type_id: Option<String>,
    /// Free-form instructions from the requester
    pub user_prompt: Option<String>,
    /// Owning user
    pub user_id: Option<String>,
    /// Failure reason captured when the task failed
    pub error_message: Option<String>,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task row last changed
    pub updated_at: DateTime<Utc>,
}

/// Generation settings attached to a task
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Config identifier
    pub id: String,
    /// Topic the output should emphasize
    pub focus_area: Option<String>,
    /// Desired output length (e.g. "short")
    pub content_length: Option<String>,
    /// Target difficulty (e.g. "beginner")
    pub difficulty_level: Option<String>,
}

/// Output content type
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    /// Content type identifier
    pub id: String,
    /// Format name such as "pdf" or "pptx"
    pub name: Option<String>,
    /// Accepted file extensions, in preference order
    pub extensions: Vec<String>,
}

/// Prompt template for one output content type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// Content type this prompt belongs to
    pub output_content_type_id: String,
    /// Template with `{difficulty_level}` and `{content_length}` placeholders
    pub prompt: String,
}

/// Whether a file is an input or the produced output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Uploaded source document
    Input,
    /// Generated artifact
    Output,
}

impl FileCategory {
    /// Stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Input => "input",
            FileCategory::Output => "output",
        }
    }

    /// Parse the stored form
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "input" => Some(FileCategory::Input),
            "output" => Some(FileCategory::Output),
            _ => None,
        }
    }
}

/// Metadata locating an input or output file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Record identifier
    pub id: i64,
    /// Owning task
    pub task_id: TaskId,
    /// File name as uploaded or produced
    pub file_name: String,
    /// Local path or remote URL
    pub stored_location: String,
    /// Input or output
    pub category: FileCategory,
    /// Content type of the file, if known
    pub file_type_id: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Whether `stored_location` is an http(s) URL
    pub fn is_remote(&self) -> bool {
        is_remote_location(&self.stored_location)
    }
}

/// Returns true for `http://` and `https://` locations
pub fn is_remote_location(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// File record to be inserted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFileRecord {
    /// Owning task
    pub task_id: TaskId,
    /// File name
    pub file_name: String,
    /// Local path or remote URL
    pub stored_location: String,
    /// Input or output
    pub category: FileCategory,
    /// Content type of the file, if known
    pub file_type_id: Option<String>,
}

/// Requester of a task
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,
    /// Notification address
    pub email: Option<String>,
    /// Display name used in the greeting
    pub username: Option<String>,
}

/// Concrete output file format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text
    Txt,
    /// PDF document
    Pdf,
    /// Word document
    Docx,
    /// PowerPoint slide deck
    Pptx,
    /// JSON document
    Json,
    /// HTML document
    Html,
}

impl OutputFormat {
    /// Recognize a format name or extension (case-insensitive, leading dot ignored)
    pub fn from_name(value: &str) -> Option<Self> {
        let trimmed = value.trim().trim_start_matches('.').to_ascii_lowercase();
        match trimmed.as_str() {
            "txt" | "text" => Some(OutputFormat::Txt),
            "pdf" => Some(OutputFormat::Pdf),
            "docx" => Some(OutputFormat::Docx),
            "pptx" => Some(OutputFormat::Pptx),
            "json" => Some(OutputFormat::Json),
            "html" | "htm" => Some(OutputFormat::Html),
            _ => None,
        }
    }

    /// Pick the output format for a content type
    ///
    /// An unset name yields [`OutputFormat::Txt`]. A set but unrecognized name falls back
    /// to the first recognized extension, then to txt.
    pub fn resolve(content_type: &ContentType) -> Self {
        let Some(name) = content_type.name.as_deref() else {
            return OutputFormat::Txt;
        };

        OutputFormat::from_name(name)
            .or_else(|| {
                content_type
                    .extensions
                    .iter()
                    .find_map(|ext| OutputFormat::from_name(ext))
            })
            .unwrap_or(OutputFormat::Txt)
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Pptx => "pptx",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }

    /// MIME type used for uploads and attachments
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "text/plain",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            OutputFormat::Json => "application/json",
            OutputFormat::Html => "text/html",
        }
    }

    /// Local and remote output file name for a task
    pub fn output_file_name(&self, task_id: &TaskId) -> String {
        format!("output_{}.{}", task_id, self.extension())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Result of a successful `process` call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProcessOutcome {
    /// The processed task
    #[schema(value_type = String)]
    pub task_id: TaskId,
    /// Format of the produced artifact
    pub format: OutputFormat,
    /// Where the output record points (remote URL or local path)
    pub output_location: String,
    /// Whether the completion email went out
    pub email_sent: bool,
}

/// Per-task result inside a queue run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QueueEntryOutcome {
    /// The task
    #[schema(value_type = String)]
    pub task_id: TaskId,
    /// Status after the run
    pub status: TaskStatus,
    /// Failure reason, when the task did not complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of draining the queue once
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QueueReport {
    /// One entry per queued task, in processing order
    pub entries: Vec<QueueEntryOutcome>,
}

impl QueueReport {
    /// Number of tasks that completed
    pub fn completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == TaskStatus::Completed)
            .count()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(name: Option<&str>, extensions: &[&str]) -> ContentType {
        ContentType {
            id: "ct".into(),
            name: name.map(str::to_string),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn status_parse_accepts_legacy_spellings() {
        assert_eq!(TaskStatus::parse("QUEUED"), Some(TaskStatus::Queued));
        assert_eq!(TaskStatus::parse("Processing"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("Completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("failed"), Some(TaskStatus::Failed));
        assert_eq!(TaskStatus::parse("paused"), None);
    }

    #[test]
    fn status_serializes_in_canonical_form() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"INPROGRESS\"");
        assert_eq!(TaskStatus::InProgress.to_string(), "INPROGRESS");
    }

    #[test]
    fn unset_content_type_name_resolves_to_txt() {
        let ct = content_type(None, &["pdf"]);
        assert_eq!(OutputFormat::resolve(&ct), OutputFormat::Txt);
    }

    #[test]
    fn content_type_name_wins_over_extensions() {
        let ct = content_type(Some("PPTX"), &[".pdf"]);
        assert_eq!(OutputFormat::resolve(&ct), OutputFormat::Pptx);
    }

    #[test]
    fn unknown_name_falls_back_to_first_known_extension() {
        let ct = content_type(Some("Lecture Notes"), &[".md", ".docx", ".pdf"]);
        assert_eq!(OutputFormat::resolve(&ct), OutputFormat::Docx);

        let ct = content_type(Some("Lecture Notes"), &[".md"]);
        assert_eq!(OutputFormat::resolve(&ct), OutputFormat::Txt);
    }

    #[test]
    fn output_file_name_is_task_namespaced() {
        let id = TaskId::new("abc");
        assert_eq!(OutputFormat::Pdf.output_file_name(&id), "output_abc.pdf");
    }

    #[test]
    fn remote_location_detection() {
        assert!(is_remote_location("https://x.supabase.co/storage/v1/object/public/a/b"));
        assert!(is_remote_location("HTTP://host/file"));
        assert!(!is_remote_location("/srv/store/input/a.pdf"));
    }
}
