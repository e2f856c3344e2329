//! Input file acquisition
//!
//! Turns a task's input [`FileRecord`]s into readable local files. Each record is resolved
//! independently:
//!
//! 1. A local `stored_location` is used when it names a readable file, otherwise the file is
//!    looked up as `<store>/input/<file_name>`.
//! 2. A remote location is fetched directly without credentials. If that fails the file is
//!    downloaded through the [`ObjectStore`] under a key derived from the URL.
//!
//! Fetched bytes are staged as `<store>/input/<taskId>_<fileName>`. A record that cannot be
//! resolved is skipped and reported; it never aborts the others.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AcquisitionConfig, StorageConfig};
use crate::storage::ObjectStore;
use crate::types::FileRecord;
use crate::utils::{guess_mime_type, sanitize_file_name, staged_input_name};

/// How a file was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionSource {
    /// Found on the local filesystem
    Local,
    /// Fetched from its URL without credentials
    Direct,
    /// Downloaded through the object store
    ObjectStore,
}

/// A file ready to be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Original file name from the record
    pub file_name: String,
    /// Readable local path
    pub path: PathBuf,
    /// MIME type guessed from the file name
    pub mime_type: &'static str,
    /// Where the bytes came from
    pub source: AcquisitionSource,
}

/// A record that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    /// Original file name from the record
    pub file_name: String,
    /// Why every path failed
    pub reason: String,
}

/// Outcome of resolving a task's inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionReport {
    /// Resolved files, in record order
    pub resolved: Vec<ResolvedFile>,
    /// Failed records, in record order
    pub failed: Vec<FailedFile>,
}

impl AcquisitionReport {
    /// Number of records attempted
    pub fn attempted(&self) -> usize {
        self.resolved.len() + self.failed.len()
    }

    /// At least one file resolved
    pub fn is_success(&self) -> bool {
        !self.resolved.is_empty()
    }
}

/// Resolves input file records to local files
#[derive(Clone)]
pub struct FileAcquirer {
    client: reqwest::Client,
    store_dir: PathBuf,
    object_store: Option<Arc<dyn ObjectStore>>,
    max_concurrent: usize,
    fetch_timeout: Duration,
}

impl FileAcquirer {
    /// Create an acquirer staging files under `storage.store_dir`
    pub fn new(
        storage: &StorageConfig,
        acquisition: &AcquisitionConfig,
        object_store: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            store_dir: storage.store_dir.clone(),
            object_store,
            max_concurrent: acquisition.max_concurrent_fetches.max(1),
            fetch_timeout: acquisition.fetch_timeout,
        }
    }

    fn input_dir(&self) -> PathBuf {
        self.store_dir.join("input")
    }

    /// Resolve every record, at most `max_concurrent_fetches` at a time
    pub async fn resolve(&self, records: &[FileRecord]) -> AcquisitionReport {
        let pending: Vec<_> = records.iter().map(|record| self.resolve_one(record)).collect();
        let outcomes: Vec<Result<ResolvedFile, FailedFile>> = stream::iter(pending)
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut report = AcquisitionReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(file) => report.resolved.push(file),
                Err(failed) => {
                    tracing::warn!(
                        file = %failed.file_name,
                        reason = %failed.reason,
                        "input file skipped"
                    );
                    report.failed.push(failed);
                }
            }
        }

        tracing::info!(
            resolved = report.resolved.len(),
            attempted = report.attempted(),
            "input acquisition finished"
        );
        report
    }

    async fn resolve_one(&self, record: &FileRecord) -> Result<ResolvedFile, FailedFile> {
        let resolved = if record.is_remote() {
            self.resolve_remote(record).await
        } else {
            self.resolve_local(record).await
        };

        resolved
            .map(|(path, source)| ResolvedFile {
                file_name: record.file_name.clone(),
                mime_type: guess_mime_type(Path::new(&record.file_name)),
                path,
                source,
            })
            .map_err(|reason| FailedFile {
                file_name: record.file_name.clone(),
                reason,
            })
    }

    async fn resolve_local(
        &self,
        record: &FileRecord,
    ) -> Result<(PathBuf, AcquisitionSource), String> {
        let stored = PathBuf::from(&record.stored_location);
        if is_readable_file(&stored).await {
            return Ok((stored, AcquisitionSource::Local));
        }

        let fallback = self.input_dir().join(sanitize_file_name(&record.file_name));
        if is_readable_file(&fallback).await {
            return Ok((fallback, AcquisitionSource::Local));
        }

        Err(format!(
            "not found at {} or {}",
            stored.display(),
            fallback.display()
        ))
    }

    async fn resolve_remote(
        &self,
        record: &FileRecord,
    ) -> Result<(PathBuf, AcquisitionSource), String> {
        let url = record.stored_location.trim();

        let (bytes, source) = match self.fetch_direct(url).await {
            Ok(bytes) => (bytes, AcquisitionSource::Direct),
            Err(direct_error) => {
                tracing::debug!(url = %url, error = %direct_error, "direct fetch failed");

                let Some(store) = &self.object_store else {
                    return Err(format!("direct fetch failed: {}", direct_error));
                };
                let key = store.object_key_for(url, &record.file_name);
                match store.download(&key).await {
                    Ok(bytes) => (bytes, AcquisitionSource::ObjectStore),
                    Err(store_error) => {
                        return Err(format!(
                            "direct fetch failed: {}; {} download of '{}' failed: {}",
                            direct_error,
                            store.name(),
                            key,
                            store_error
                        ));
                    }
                }
            }
        };

        let staged = self.input_dir().join(staged_input_name(
            record.task_id.as_str(),
            &record.file_name,
        ));
        write_staged(&staged, &bytes)
            .await
            .map_err(|e| format!("failed to stage {}: {}", staged.display(), e))?;

        Ok((staged, source))
    }

    async fn fetch_direct(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("timed out after {}s", self.fetch_timeout.as_secs())
                } else {
                    e.to_string()
                }
            })?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

async fn is_readable_file(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    }
}

async fn write_staged(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
