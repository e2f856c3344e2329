//! Shared test helpers: a seeded SQLite store and fakes for the external services.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{Database, NewTask};
use crate::error::{Error, GenerationError, Result};
use crate::generation::{ContentFormat, GeneratedContent, GenerationProvider, GenerationRequest};
use crate::notification::{EmailMessage, NotificationProvider};
use crate::types::{
    ContentType, FileCategory, NewFileRecord, SystemPrompt, TaskConfig, TaskId, TaskStatus, User,
};

use super::{Orchestrator, OrchestratorServices};

pub(crate) const TEMPLATE: &str =
    "Explain at {difficulty_level} level in {content_length} form.";

/// A migrated database with catalog rows, plus a config rooted in a temp dir
pub(crate) struct TestEnv {
    pub(crate) db: Arc<Database>,
    pub(crate) config: Arc<Config>,
    pub(crate) dir: TempDir,
}

impl TestEnv {
    /// Queue a task owned by `user-1` with local input files
    pub(crate) async fn queue_task(
        &self,
        id: &str,
        content_type_id: &str,
        inputs: &[(&str, &str)],
    ) -> TaskId {
        let task_id = self.queue_task_for(id, content_type_id, Some("user-1")).await;
        for (name, contents) in inputs {
            let path = self.dir.path().join("uploads").join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, contents).unwrap();
            self.add_input(&task_id, name, path.to_str().unwrap()).await;
        }
        task_id
    }

    /// Queue a task without inputs for an optional owner
    pub(crate) async fn queue_task_for(
        &self,
        id: &str,
        content_type_id: &str,
        user_id: Option<&str>,
    ) -> TaskId {
        self.db
            .insert_task(&NewTask {
                id: id.to_string(),
                task_config_id: Some("cfg-1".into()),
                output_content_type_id: Some(content_type_id.to_string()),
                user_prompt: Some("Keep it brief".into()),
                user_id: user_id.map(str::to_string),
            })
            .await
            .unwrap()
    }

    /// Record an input file at an arbitrary location
    pub(crate) async fn add_input(&self, task_id: &TaskId, name: &str, location: &str) {
        self.db
            .insert_file_record(&NewFileRecord {
                task_id: task_id.clone(),
                file_name: name.to_string(),
                stored_location: location.to_string(),
                category: FileCategory::Input,
                file_type_id: None,
            })
            .await
            .unwrap();
    }
}

/// Write an output file where the dispatcher expects it and record it
pub(crate) async fn record_output(env: &TestEnv, task_id: &TaskId, name: &str, bytes: &[u8]) {
    let dir = env.config.storage.output_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    env.db
        .insert_file_record(&NewFileRecord {
            task_id: task_id.clone(),
            file_name: name.to_string(),
            stored_location: path.to_string_lossy().into_owned(),
            category: FileCategory::Output,
            file_type_id: None,
        })
        .await
        .unwrap();
}

pub(crate) fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.path().join("test.db");
    config.storage.store_dir = dir.path().join("store");
    config.generation.api_key = Some("test-key".into());
    config.generation.timeout = Duration::from_secs(5);
    config.acquisition.fetch_timeout = Duration::from_secs(5);
    config.notifications.sender.email = Some("noreply@example.com".into());
    config
}

/// Create a seeded environment
///
/// Content types: `ct-txt`, `ct-pdf`, `ct-docx`, `ct-pptx` (named after their format) and
/// `ct-unnamed` (no name). Each has a system prompt. Config `cfg-1` is hard/short with a
/// Thermodynamics focus. Users: `user-1` (ada@example.com) and `user-no-email`.
pub(crate) async fn seeded_env() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();

    let content_types = [
        ("ct-txt", Some("txt")),
        ("ct-pdf", Some("pdf")),
        ("ct-docx", Some("docx")),
        ("ct-pptx", Some("pptx")),
        ("ct-unnamed", None),
    ];
    for (id, name) in content_types {
        db.upsert_content_type(&ContentType {
            id: id.to_string(),
            name: name.map(str::to_string),
            extensions: vec!["pdf".to_string()],
        })
        .await
        .unwrap();
        db.upsert_system_prompt(&SystemPrompt {
            output_content_type_id: id.to_string(),
            prompt: TEMPLATE.to_string(),
        })
        .await
        .unwrap();
    }

    db.upsert_task_config(&TaskConfig {
        id: "cfg-1".into(),
        focus_area: Some("Thermodynamics".into()),
        content_length: Some("short".into()),
        difficulty_level: Some("hard".into()),
    })
    .await
    .unwrap();

    db.upsert_user(&User {
        id: "user-1".into(),
        email: Some("ada@example.com".into()),
        username: Some("ada".into()),
    })
    .await
    .unwrap();
    db.upsert_user(&User {
        id: "user-no-email".into(),
        email: None,
        username: Some("ghost".into()),
    })
    .await
    .unwrap();

    TestEnv {
        db: Arc::new(db),
        config: Arc::new(config),
        dir,
    }
}

/// Build an orchestrator over the environment's store and the given fakes
pub(crate) fn orchestrator(
    env: &TestEnv,
    generator: Arc<dyn GenerationProvider>,
    notifiers: Vec<Arc<dyn NotificationProvider>>,
) -> Orchestrator {
    Orchestrator::new(
        env.config.clone(),
        OrchestratorServices {
            store: env.db.clone(),
            generator,
            object_store: None,
            notifiers,
        },
    )
}

enum Reply {
    Text(String),
    Delayed(String, Duration),
    Fail(String),
    Hang,
    Panic,
}

/// Generation provider returning a canned reply and recording requests
pub(crate) struct FakeGenerator {
    reply: Reply,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub(crate) fn replying(text: &str) -> Self {
        Self::with(Reply::Text(text.to_string()))
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self::with(Reply::Fail(reason.to_string()))
    }

    /// Answers `text` after `delay`
    pub(crate) fn delayed(text: &str, delay: Duration) -> Self {
        Self::with(Reply::Delayed(text.to_string(), delay))
    }

    /// Never answers; only a timeout ends the call
    pub(crate) fn hanging() -> Self {
        Self::with(Reply::Hang)
    }

    pub(crate) fn panicking() -> Self {
        Self::with(Reply::Panic)
    }

    fn with(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for FakeGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedContent> {
        let format_hint = if request.desired_format == crate::types::OutputFormat::Pptx {
            ContentFormat::Json
        } else {
            ContentFormat::Text
        };
        self.requests.lock().unwrap().push(request);

        match &self.reply {
            Reply::Text(text) => Ok(GeneratedContent {
                text: text.clone(),
                format_hint,
            }),
            Reply::Fail(reason) => Err(GenerationError::Provider {
                provider: "fake".into(),
                reason: reason.clone(),
            }
            .into()),
            Reply::Delayed(text, delay) => {
                tokio::time::sleep(*delay).await;
                Ok(GeneratedContent {
                    text: text.clone(),
                    format_hint,
                })
            }
            Reply::Hang => std::future::pending().await,
            Reply::Panic => panic!("generator blew up"),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Poll until the task leaves INPROGRESS, for callers that gave up waiting on `process`
pub(crate) async fn wait_for_terminal(env: &TestEnv, task_id: &TaskId) -> TaskStatus {
    for _ in 0..200 {
        let task = env.db.get_task(task_id).await.unwrap().unwrap();
        if task.status.is_terminal() {
            return task.status;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("task {} never reached a terminal status", task_id);
}

/// Notification provider that records every message it is given
pub(crate) struct RecordingNotifier {
    accept: bool,
    messages: Mutex<Vec<EmailMessage>>,
}

impl RecordingNotifier {
    pub(crate) fn accepting() -> Self {
        Self {
            accept: true,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn rejecting() -> Self {
        Self {
            accept: false,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn messages(&self) -> Vec<EmailMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationProvider for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.messages.lock().unwrap().push(message.clone());
        if self.accept {
            Ok(())
        } else {
            Err(Error::Notification("rejected".into()))
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
