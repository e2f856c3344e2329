//! Completion email dispatch with provider failover

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{COMPLETION_SUBJECT, EmailAttachment, EmailMessage, Mailbox, NotificationProvider};
use crate::config::SenderConfig;
use crate::db::TaskStore;
use crate::materialize::ooxml::escape_xml;
use crate::types::{FileCategory, FileRecord, TaskId, is_remote_location};
use crate::utils::{guess_mime_type, sanitize_file_name};

/// Emails a finished task's outputs to its owner
///
/// [`send`](Self::send) reports whether any provider accepted the message. A `false` result
/// is advisory: callers log it and move on.
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn TaskStore>,
    providers: Vec<Arc<dyn NotificationProvider>>,
    sender: SenderConfig,
    output_dir: PathBuf,
    client: reqwest::Client,
    fetch_timeout: Duration,
}

impl NotificationDispatcher {
    /// Create a dispatcher reading outputs from `output_dir` first
    pub fn new(
        store: Arc<dyn TaskStore>,
        providers: Vec<Arc<dyn NotificationProvider>>,
        sender: SenderConfig,
        output_dir: PathBuf,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            providers,
            sender,
            output_dir,
            client: reqwest::Client::new(),
            fetch_timeout,
        }
    }

    /// Email the outputs of `task_id`; `true` once a provider accepts the message
    pub async fn send(&self, task_id: &TaskId) -> bool {
        let user = match self.store.get_user_for_task(task_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(task_id = %task_id, "no user for task, skipping email");
                return false;
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "user lookup failed");
                return false;
            }
        };
        let Some(recipient) = user.email.clone() else {
            tracing::warn!(task_id = %task_id, user_id = %user.id, "user has no email address");
            return false;
        };

        let records = match self.store.list_files(task_id, FileCategory::Output).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "output lookup failed");
                return false;
            }
        };
        if records.is_empty() {
            tracing::warn!(task_id = %task_id, "no output files to send");
            return false;
        }

        let mut attachments = Vec::with_capacity(records.len());
        for record in &records {
            let file_name = sanitize_file_name(&record.file_name);
            match self.read_output(&file_name, record).await {
                Ok(bytes) => attachments.push(EmailAttachment {
                    mime_type: guess_mime_type(Path::new(&file_name)).to_string(),
                    file_name,
                    content_base64: STANDARD.encode(&bytes),
                }),
                Err(reason) => {
                    tracing::warn!(
                        task_id = %task_id,
                        file = %record.file_name,
                        reason = %reason,
                        "output file not attachable"
                    );
                }
            }
        }
        if attachments.is_empty() {
            tracing::warn!(task_id = %task_id, "none of the output files could be read");
            return false;
        }

        let Some(sender_email) = self.sender.email.clone() else {
            tracing::warn!(task_id = %task_id, "sender email not configured");
            return false;
        };

        let username = user
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or("User");

        let message = EmailMessage {
            from: Mailbox {
                name: Some(self.sender.name.clone()),
                email: sender_email,
            },
            to: Mailbox {
                name: user.username.clone(),
                email: recipient,
            },
            subject: COMPLETION_SUBJECT.to_string(),
            text: text_body(username, &self.sender.name),
            html: html_body(username, &self.sender.name),
            attachments,
        };

        self.deliver(task_id, &message).await
    }

    async fn deliver(&self, task_id: &TaskId, message: &EmailMessage) -> bool {
        if self.providers.is_empty() {
            tracing::warn!(task_id = %task_id, "no notification providers configured");
            return false;
        }

        for provider in &self.providers {
            match provider.send(message).await {
                Ok(()) => {
                    tracing::info!(
                        task_id = %task_id,
                        provider = provider.name(),
                        attachments = message.attachments.len(),
                        "completion email sent"
                    );
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = %task_id,
                        provider = provider.name(),
                        error = %e,
                        "notification provider failed"
                    );
                }
            }
        }

        tracing::error!(task_id = %task_id, "all notification providers failed");
        false
    }

    // Expected name under the output dir first, then the recorded location
    async fn read_output(&self, file_name: &str, record: &FileRecord) -> Result<Vec<u8>, String> {
        let expected = self.output_dir.join(file_name);
        if let Ok(bytes) = tokio::fs::read(&expected).await {
            return Ok(bytes);
        }

        if !is_remote_location(&record.stored_location) {
            return tokio::fs::read(&record.stored_location)
                .await
                .map_err(|e| format!("{}: {}", record.stored_location, e));
        }

        let response = self
            .client
            .get(&record.stored_location)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| e.to_string())
    }
}

fn text_body(username: &str, team: &str) -> String {
    format!(
        "Hello {username},\n\n\
         Your document processing task has been completed successfully.\n\n\
         The processed file(s) are attached to this email.\n\n\
         Thank you for using our service!\n\n\
         Regards,\n{team}\n"
    )
}

fn html_body(username: &str, team: &str) -> String {
    format!(
        "<p>Hello {},</p>\
         <p>Your document processing task has been completed successfully.</p>\
         <p>The processed file(s) are attached to this email.</p>\
         <p>Thank you for using our service!</p>\
         <p>Regards,<br>{}</p>",
        escape_xml(username),
        escape_xml(team)
    )
}
