use super::test_helpers::*;
use super::*;
use crate::error::{AcquisitionError, Entity, Error, GenerationError, MaterializationError};
use crate::types::{FileCategory, OutputFormat, TaskId, TaskStatus};
use async_trait::async_trait;
use std::io::Read as _;
use std::time::Duration;

async fn status_of(env: &TestEnv, id: &TaskId) -> (TaskStatus, Option<String>) {
    let task = env.db.get_task(id).await.unwrap().unwrap();
    (task.status, task.error_message)
}

async fn outputs(env: &TestEnv, id: &TaskId) -> Vec<crate::types::FileRecord> {
    env.db.list_files(id, FileCategory::Output).await.unwrap()
}

/// Object store that either accepts uploads at a fixed base URL or rejects them
struct FakeObjectStore {
    accept: bool,
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        if self.accept {
            Ok(format!("https://cdn.example.com/files/{}", key))
        } else {
            Err(Error::Storage("bucket unavailable".into()))
        }
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        Err(Error::Storage(format!("{} missing", key)))
    }

    fn name(&self) -> &'static str {
        "fake-store"
    }
}

#[tokio::test]
async fn completes_text_task_end_to_end() {
    let env = seeded_env().await;
    let task = env
        .queue_task("t1", "ct-txt", &[("notes.txt", "Entropy notes")])
        .await;
    let generator = Arc::new(FakeGenerator::replying("**Entropy** always *rises*"));
    let notifier = Arc::new(RecordingNotifier::accepting());

    let outcome = orchestrator(&env, generator.clone(), vec![notifier.clone()])
        .process(&task)
        .await
        .unwrap();

    assert_eq!(outcome.format, OutputFormat::Txt);
    assert!(outcome.email_sent);
    assert_eq!(status_of(&env, &task).await, (TaskStatus::Completed, None));

    let expected_path = env.config.storage.output_dir().join("output_t1.txt");
    assert_eq!(
        std::fs::read_to_string(&expected_path).unwrap(),
        "Entropy always rises"
    );
    assert_eq!(outcome.output_location, expected_path.to_string_lossy());

    let records = outputs(&env, &task).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].file_name, "output_t1.txt");
    assert_eq!(records[0].file_type_id.as_deref(), Some("ct-txt"));

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].system_prompt,
        "Explain at hard level in short form.\nFocus on: Thermodynamics"
    );
    assert_eq!(requests[0].user_prompt, "Keep it brief");
    assert_eq!(requests[0].files[0].bytes, b"Entropy notes");
    assert_eq!(requests[0].files[0].mime_type, "text/plain");

    assert_eq!(notifier.messages()[0].attachments[0].file_name, "output_t1.txt");
}

#[tokio::test]
async fn unnamed_content_type_renders_txt() {
    let env = seeded_env().await;
    let task = env
        .queue_task("t1", "ct-unnamed", &[("a.txt", "x")])
        .await;

    let outcome = orchestrator(&env, Arc::new(FakeGenerator::replying("hello")), vec![])
        .process(&task)
        .await
        .unwrap();

    assert_eq!(outcome.format, OutputFormat::Txt);
    assert!(outcome.output_location.ends_with("output_t1.txt"));
}

#[tokio::test]
async fn renders_slide_deck_from_json() {
    let env = seeded_env().await;
    let task = env.queue_task("deck", "ct-pptx", &[("a.pdf", "%PDF")]).await;
    let generator = Arc::new(FakeGenerator::replying(
        r#"{"slides":[{"title":"Heat","content":["Flows","Downhill"]}]}"#,
    ));

    let outcome = orchestrator(&env, generator.clone(), vec![])
        .process(&task)
        .await
        .unwrap();
    assert_eq!(outcome.format, OutputFormat::Pptx);
    assert_eq!(generator.requests()[0].desired_format, OutputFormat::Pptx);

    let file = std::fs::File::open(&outcome.output_location).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut slide = String::new();
    archive
        .by_name("ppt/slides/slide1.xml")
        .unwrap()
        .read_to_string(&mut slide)
        .unwrap();
    assert!(slide.contains("Heat"));
    assert!(slide.contains("Downhill"));
}

#[tokio::test]
async fn generation_error_fails_task_without_output() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-pdf", &[("a.txt", "x")]).await;
    let notifier = Arc::new(RecordingNotifier::accepting());

    let err = orchestrator(
        &env,
        Arc::new(FakeGenerator::failing("quota exceeded")),
        vec![notifier.clone()],
    )
    .process(&task)
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Generation(_)));
    let (status, message) = status_of(&env, &task).await;
    assert_eq!(status, TaskStatus::Failed);
    let message = message.unwrap();
    assert!(message.starts_with("generation_error:"));
    assert!(message.contains("quota exceeded"));
    assert!(outputs(&env, &task).await.is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn generation_timeout_fails_task() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("a.txt", "x")]).await;

    let mut config = (*env.config).clone();
    config.generation.timeout = Duration::from_millis(50);
    let orchestrator = Orchestrator::new(
        Arc::new(config),
        OrchestratorServices {
            store: env.db.clone(),
            generator: Arc::new(FakeGenerator::hanging()),
            object_store: None,
            notifiers: vec![],
        },
    );

    let err = orchestrator.process(&task).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Generation(GenerationError::Timeout { ref provider, .. }) if provider == "fake"
    ));
    assert_eq!(status_of(&env, &task).await.0, TaskStatus::Failed);
}

#[tokio::test]
async fn task_without_inputs_fails() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[]).await;
    let generator = Arc::new(FakeGenerator::replying("unused"));

    let err = orchestrator(&env, generator.clone(), vec![])
        .process(&task)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Acquisition(AcquisitionError::NoInputFiles { .. })
    ));
    let (status, message) = status_of(&env, &task).await;
    assert_eq!(status, TaskStatus::Failed);
    assert!(message.unwrap().starts_with("no_input_files:"));
    assert!(generator.requests().is_empty());
}

#[tokio::test]
async fn unreadable_inputs_fail_task() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[]).await;
    env.add_input(&task, "gone.pdf", "/no/such/gone.pdf").await;
    env.add_input(&task, "lost.pdf", "/no/such/lost.pdf").await;

    let err = orchestrator(&env, Arc::new(FakeGenerator::replying("x")), vec![])
        .process(&task)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Acquisition(AcquisitionError::NoValidInputFiles { attempted: 2, .. })
    ));
    assert_eq!(status_of(&env, &task).await.0, TaskStatus::Failed);
}

#[tokio::test]
async fn partially_readable_inputs_still_complete() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("ok.txt", "fine")]).await;
    env.add_input(&task, "gone.pdf", "/no/such/gone.pdf").await;
    let generator = Arc::new(FakeGenerator::replying("done"));

    orchestrator(&env, generator.clone(), vec![])
        .process(&task)
        .await
        .unwrap();

    assert_eq!(generator.requests()[0].files.len(), 1);
    assert_eq!(status_of(&env, &task).await.0, TaskStatus::Completed);
}

#[tokio::test]
async fn missing_content_type_fails_with_entity() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-missing", &[("a.txt", "x")]).await;

    let err = orchestrator(&env, Arc::new(FakeGenerator::replying("x")), vec![])
        .process(&task)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::NotFound {
            entity: Entity::ContentType,
            ref id
        } if id == "ct-missing"
    ));
    let message = status_of(&env, &task).await.1.unwrap();
    assert!(message.starts_with("content_type_not_found:"));
}

#[tokio::test]
async fn unknown_task_is_not_found_and_writes_nothing() {
    let env = seeded_env().await;

    let err = orchestrator(&env, Arc::new(FakeGenerator::replying("x")), vec![])
        .process(&TaskId::new("ghost"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::NotFound {
            entity: Entity::Task,
            ..
        }
    ));
    assert!(env.db.get_task(&TaskId::new("ghost")).await.unwrap().is_none());
}

#[tokio::test]
async fn finished_task_is_not_claimable() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("a.txt", "x")]).await;
    let generator = Arc::new(FakeGenerator::replying("x"));
    let orchestrator = orchestrator(&env, generator.clone(), vec![]);

    orchestrator.process(&task).await.unwrap();
    let err = orchestrator.process(&task).await.unwrap_err();

    assert!(matches!(
        err,
        Error::TaskNotClaimable { ref status, .. } if status == "COMPLETED"
    ));
    assert_eq!(status_of(&env, &task).await.0, TaskStatus::Completed);
    assert_eq!(generator.requests().len(), 1);
    assert_eq!(outputs(&env, &task).await.len(), 1);
}

#[tokio::test]
async fn notification_failure_keeps_task_completed() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("a.txt", "x")]).await;
    let notifier = Arc::new(RecordingNotifier::rejecting());

    let outcome = orchestrator(
        &env,
        Arc::new(FakeGenerator::replying("x")),
        vec![notifier.clone()],
    )
    .process(&task)
    .await
    .unwrap();

    assert!(!outcome.email_sent);
    assert_eq!(notifier.messages().len(), 1);
    assert_eq!(status_of(&env, &task).await.0, TaskStatus::Completed);
}

#[tokio::test]
async fn invalid_slide_json_fails_task() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-pptx", &[("a.txt", "x")]).await;

    let err = orchestrator(&env, Arc::new(FakeGenerator::replying(r#"{"bad":1}"#)), vec![])
        .process(&task)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Materialization(MaterializationError::InvalidSlideFormat(_))
    ));
    let message = status_of(&env, &task).await.1.unwrap();
    assert!(message.starts_with("invalid_slide_format:"));
    assert!(outputs(&env, &task).await.is_empty());
}

#[tokio::test]
async fn published_output_records_remote_url() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-pdf", &[("a.txt", "x")]).await;

    let orchestrator = Orchestrator::new(
        env.config.clone(),
        OrchestratorServices {
            store: env.db.clone(),
            generator: Arc::new(FakeGenerator::replying("Para one\n\nPara two")),
            object_store: Some(Arc::new(FakeObjectStore { accept: true })),
            notifiers: vec![],
        },
    );
    let outcome = orchestrator.process(&task).await.unwrap();

    assert_eq!(
        outcome.output_location,
        "https://cdn.example.com/files/output/output_t1.pdf"
    );
    assert_eq!(
        outputs(&env, &task).await[0].stored_location,
        outcome.output_location
    );
    // The local copy is still written
    assert!(env.config.storage.output_dir().join("output_t1.pdf").exists());
}

#[tokio::test]
async fn failed_publish_keeps_local_path() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-docx", &[("a.txt", "x")]).await;

    let orchestrator = Orchestrator::new(
        env.config.clone(),
        OrchestratorServices {
            store: env.db.clone(),
            generator: Arc::new(FakeGenerator::replying("Body")),
            object_store: Some(Arc::new(FakeObjectStore { accept: false })),
            notifiers: vec![],
        },
    );
    let outcome = orchestrator.process(&task).await.unwrap();

    let local = env.config.storage.output_dir().join("output_t1.docx");
    assert_eq!(outcome.output_location, local.to_string_lossy());
    assert_eq!(status_of(&env, &task).await.0, TaskStatus::Completed);
}

#[tokio::test]
async fn queue_continues_after_failing_task() {
    let env = seeded_env().await;
    let first = env.queue_task("t-a", "ct-txt", &[("a.txt", "a")]).await;
    let broken = env.queue_task("t-b", "ct-txt", &[]).await;
    let last = env.queue_task("t-c", "ct-txt", &[("c.txt", "c")]).await;

    let report = orchestrator(&env, Arc::new(FakeGenerator::replying("ok")), vec![])
        .process_queue()
        .await
        .unwrap();

    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.completed(), 2);

    let by_id = |id: &TaskId| report.entries.iter().find(|e| &e.task_id == id).unwrap();
    assert_eq!(by_id(&first).status, TaskStatus::Completed);
    assert_eq!(by_id(&last).status, TaskStatus::Completed);
    assert_eq!(by_id(&broken).status, TaskStatus::Failed);
    assert!(by_id(&broken).error.as_deref().unwrap().contains("no input files"));

    for id in [&first, &broken, &last] {
        assert!(status_of(&env, id).await.0.is_terminal());
    }
}

#[tokio::test]
async fn empty_queue_reports_nothing() {
    let env = seeded_env().await;
    let report = orchestrator(&env, Arc::new(FakeGenerator::replying("ok")), vec![])
        .process_queue()
        .await
        .unwrap();
    assert!(report.entries.is_empty());
}

fn with_generator(
    env: &TestEnv,
    generator: FakeGenerator,
    timeout: Duration,
) -> Orchestrator {
    let mut config = (*env.config).clone();
    config.generation.timeout = timeout;
    Orchestrator::new(
        Arc::new(config),
        OrchestratorServices {
            store: env.db.clone(),
            generator: Arc::new(generator),
            object_store: None,
            notifiers: vec![],
        },
    )
}

#[tokio::test]
async fn dropped_caller_still_completes_task() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("a.txt", "x")]).await;
    let orchestrator = with_generator(
        &env,
        FakeGenerator::delayed("late answer", Duration::from_millis(200)),
        Duration::from_secs(5),
    );

    let gave_up = tokio::time::timeout(Duration::from_millis(50), orchestrator.process(&task)).await;
    assert!(gave_up.is_err());

    assert_eq!(wait_for_terminal(&env, &task).await, TaskStatus::Completed);
    assert_eq!(outputs(&env, &task).await.len(), 1);
}

#[tokio::test]
async fn dropped_caller_still_records_timeout() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("a.txt", "x")]).await;
    let orchestrator = with_generator(&env, FakeGenerator::hanging(), Duration::from_millis(200));

    let gave_up = tokio::time::timeout(Duration::from_millis(50), orchestrator.process(&task)).await;
    assert!(gave_up.is_err());

    assert_eq!(wait_for_terminal(&env, &task).await, TaskStatus::Failed);
    let (_, message) = status_of(&env, &task).await;
    assert!(message.unwrap().starts_with("generation_error:"));
}

#[tokio::test]
async fn provider_panic_fails_task() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("a.txt", "x")]).await;
    let orchestrator = with_generator(&env, FakeGenerator::panicking(), Duration::from_secs(5));

    let err = orchestrator.process(&task).await.unwrap_err();

    assert!(matches!(err, Error::Other(ref message) if message.contains("generator blew up")));
    let (status, message) = status_of(&env, &task).await;
    assert_eq!(status, TaskStatus::Failed);
    assert!(message.unwrap().starts_with("internal_error:"));
    assert!(outputs(&env, &task).await.is_empty());
}

/// Store whose COMPLETED write always fails; everything else goes to the database
struct CompleteFailsStore {
    inner: Arc<crate::db::Database>,
}

#[async_trait]
impl crate::db::TaskStore for CompleteFailsStore {
    async fn get_task(&self, id: &TaskId) -> Result<Option<crate::types::Task>> {
        self.inner.get_task(id).await
    }

    async fn claim_task(&self, id: &TaskId) -> Result<bool> {
        self.inner.claim_task(id).await
    }

    async fn complete_task(&self, _id: &TaskId) -> Result<bool> {
        Err(Error::Database(crate::error::DatabaseError::QueryFailed(
            "disk I/O error".into(),
        )))
    }

    async fn fail_task(&self, id: &TaskId, reason: &str) -> Result<bool> {
        self.inner.fail_task(id, reason).await
    }

    async fn list_queued_tasks(&self) -> Result<Vec<TaskId>> {
        self.inner.list_queued_tasks().await
    }

    async fn get_content_type(&self, id: &str) -> Result<Option<crate::types::ContentType>> {
        self.inner.get_content_type(id).await
    }

    async fn get_task_config(&self, id: &str) -> Result<Option<crate::types::TaskConfig>> {
        self.inner.get_task_config(id).await
    }

    async fn get_system_prompt(
        &self,
        content_type_id: &str,
    ) -> Result<Option<crate::types::SystemPrompt>> {
        self.inner.get_system_prompt(content_type_id).await
    }

    async fn list_files(
        &self,
        task_id: &TaskId,
        category: FileCategory,
    ) -> Result<Vec<crate::types::FileRecord>> {
        self.inner.list_files(task_id, category).await
    }

    async fn insert_file_record(&self, record: &crate::types::NewFileRecord) -> Result<i64> {
        self.inner.insert_file_record(record).await
    }

    async fn delete_files(&self, task_id: &TaskId, category: FileCategory) -> Result<u64> {
        self.inner.delete_files(task_id, category).await
    }

    async fn get_user_for_task(&self, task_id: &TaskId) -> Result<Option<crate::types::User>> {
        self.inner.get_user_for_task(task_id).await
    }
}

#[tokio::test]
async fn failed_completion_write_leaves_no_output_record() {
    let env = seeded_env().await;
    let task = env.queue_task("t1", "ct-txt", &[("a.txt", "x")]).await;
    let orchestrator = Orchestrator::new(
        env.config.clone(),
        OrchestratorServices {
            store: Arc::new(CompleteFailsStore {
                inner: env.db.clone(),
            }),
            generator: Arc::new(FakeGenerator::replying("done")),
            object_store: None,
            notifiers: vec![],
        },
    );

    let err = orchestrator.process(&task).await.unwrap_err();

    assert!(matches!(err, Error::Database(_)));
    let (status, message) = status_of(&env, &task).await;
    assert_eq!(status, TaskStatus::Failed);
    assert!(message.unwrap().starts_with("database_error:"));
    assert!(outputs(&env, &task).await.is_empty());
}
