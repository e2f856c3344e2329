//! Resend email API

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{EmailMessage, NotificationProvider, rejection, transport_failure};
use crate::Result;

const PROVIDER: &str = "resend";

/// Sends through `POST {base_url}/emails`
#[derive(Clone)]
pub struct ResendProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for ResendProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ResendProvider {
    /// Create a provider for one API token
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[derive(Serialize)]
struct Attachment<'a> {
    filename: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Payload<'a> {
    from: String,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment<'a>>,
}

impl<'a> From<&'a EmailMessage> for Payload<'a> {
    fn from(message: &'a EmailMessage) -> Self {
        let from = match &message.from.name {
            Some(name) => format!("{} <{}>", name, message.from.email),
            None => message.from.email.clone(),
        };
        Self {
            from,
            to: vec![message.to.email.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
            attachments: message
                .attachments
                .iter()
                .map(|a| Attachment {
                    filename: &a.file_name,
                    content: &a.content_base64,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl NotificationProvider for ResendProvider {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&Payload::from(message))
            .send()
            .await
            .map_err(|e| transport_failure(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(rejection(PROVIDER, response).await);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
