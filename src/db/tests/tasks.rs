use super::{open, queued_task};
use crate::db::*;
use crate::types::{TaskId, TaskStatus};

#[tokio::test]
async fn test_insert_and_get_task() {
    let (db, _file) = open().await;

    db.insert_task(&NewTask {
        id: "task-1".into(),
        task_config_id: Some("cfg".into()),
        output_content_type_id: Some("ct".into()),
        user_prompt: Some("Summarize chapter 2".into()),
        user_id: Some("u1".into()),
    })
    .await
    .unwrap();

    let task = db.get_task(&TaskId::new("task-1")).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Queued);
    assert_eq!(task.task_config_id.as_deref(), Some("cfg"));
    assert_eq!(task.user_prompt.as_deref(), Some("Summarize chapter 2"));
    assert!(task.error_message.is_none());

    assert!(db.get_task(&TaskId::new("missing")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_is_conditional() {
    let (db, _file) = open().await;
    let id = queued_task(&db, "task-1").await;

    assert!(db.claim_task(&id).await.unwrap());
    assert!(!db.claim_task(&id).await.unwrap(), "second claim must be refused");

    let task = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
}

#[tokio::test]
async fn test_concurrent_claims_have_one_winner() {
    let (db, _file) = open().await;
    let id = queued_task(&db, "task-race").await;

    let (a, b) = tokio::join!(db.claim_task(&id), db.claim_task(&id));
    let winners = [a.unwrap(), b.unwrap()].iter().filter(|won| **won).count();
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_terminal_write_requires_inprogress() {
    let (db, _file) = open().await;
    let id = queued_task(&db, "task-1").await;

    // Not claimed yet
    assert!(!db.complete_task(&id).await.unwrap());

    db.claim_task(&id).await.unwrap();
    assert!(db.fail_task(&id, "generation_error: quota").await.unwrap());

    // Already terminal
    assert!(!db.complete_task(&id).await.unwrap());

    let task = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error_message.as_deref(), Some("generation_error: quota"));
}

#[tokio::test]
async fn test_legacy_status_spellings_are_readable() {
    let (db, _file) = open().await;
    let id = queued_task(&db, "legacy").await;

    sqlx::query("UPDATE task SET status = 'Processing' WHERE id = ?")
        .bind(&id)
        .execute(db.pool())
        .await
        .unwrap();

    let task = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
}

#[tokio::test]
async fn test_list_queued_tasks_oldest_first() {
    let (db, _file) = open().await;
    let first = queued_task(&db, "b-first").await;
    let second = queued_task(&db, "a-second").await;
    let claimed = queued_task(&db, "c-claimed").await;

    sqlx::query("UPDATE task SET created_at = created_at + 10 WHERE id = ?")
        .bind(&second)
        .execute(db.pool())
        .await
        .unwrap();
    db.claim_task(&claimed).await.unwrap();

    let queued = db.list_queued_tasks().await.unwrap();
    assert_eq!(queued, vec![first, second]);
}
