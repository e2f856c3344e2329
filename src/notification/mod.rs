//! Completion notifications
//!
//! A finished task's outputs are emailed to the task owner. Delivery goes through a chain of
//! [`NotificationProvider`]s tried in order; see [`NotificationDispatcher`].

mod dispatcher;
mod mailersend;
mod resend;

pub use dispatcher::NotificationDispatcher;
pub use mailersend::MailerSendProvider;
pub use resend::ResendProvider;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::config::NotificationProviderConfig;

/// Subject of the completion email
pub const COMPLETION_SUBJECT: &str = "Your document processing task is complete";

/// A name and address pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: String,
}

/// A file attached to an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    /// File name shown to the recipient
    pub file_name: String,
    /// Base64-encoded contents
    pub content_base64: String,
    /// MIME type
    pub mime_type: String,
}

/// A provider-neutral email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Sender
    pub from: Mailbox,
    /// Single recipient
    pub to: Mailbox,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub text: String,
    /// HTML body
    pub html: String,
    /// Attached files
    pub attachments: Vec<EmailAttachment>,
}

/// An email delivery service
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Deliver one message; `Ok` only when the service accepted it
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Build the configured provider chain, in order
pub fn providers_from_config(
    configs: &[NotificationProviderConfig],
    timeout: Duration,
) -> Vec<Arc<dyn NotificationProvider>> {
    configs
        .iter()
        .map(|config| -> Arc<dyn NotificationProvider> {
            match config {
                NotificationProviderConfig::MailerSend { api_key, base_url } => {
                    Arc::new(MailerSendProvider::new(api_key, base_url, timeout))
                }
                NotificationProviderConfig::Resend { api_key, base_url } => {
                    Arc::new(ResendProvider::new(api_key, base_url, timeout))
                }
            }
        })
        .collect()
}

/// Map a failed provider response to an error, keeping the body for logs
pub(crate) async fn rejection(provider: &str, response: reqwest::Response) -> crate::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    crate::Error::Notification(format!("{} returned {}: {}", provider, status, body))
}

pub(crate) fn transport_failure(provider: &str, error: reqwest::Error) -> crate::Error {
    if error.is_timeout() {
        crate::Error::Notification(format!("{} timed out", provider))
    } else {
        crate::Error::Notification(format!("{} request failed: {}", provider, error))
    }
}
