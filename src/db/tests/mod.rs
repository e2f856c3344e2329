mod tasks;

use crate::db::*;
use crate::types::TaskId;
use tempfile::NamedTempFile;

async fn open() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

async fn queued_task(db: &Database, id: &str) -> TaskId {
    db.insert_task(&NewTask {
        id: id.to_string(),
        ..Default::default()
    })
    .await
    .unwrap()
}
