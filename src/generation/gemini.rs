//! Google Gemini `generateContent` client

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ContentFormat, GeneratedContent, GenerationProvider, GenerationRequest};
use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::types::OutputFormat;
use crate::{Error, Result};

const PROVIDER: &str = "gemini";

const SLIDES_INSTRUCTION: &str = "\n\nRespond only with a JSON object of the form \
{\"slides\": [{\"title\": \"...\", \"content\": \"...\"}]}. Each slide needs a short title \
and its content as plain text or a list of bullet strings.";

/// Gemini provider over the public REST API
#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    request_timeout: Duration,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Build a provider from configuration; fails without an API key
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config {
                message: "generation API key is not set".to_string(),
                key: Some("GOOGLE_API_KEY".to_string()),
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            // The orchestrator enforces the real deadline; this only stops a hung socket
            request_timeout: config.timeout + Duration::from_secs(5),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_body(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let wants_slides = request.desired_format == OutputFormat::Pptx;

        let mut parts: Vec<Part> = request
            .files
            .iter()
            .map(|doc| Part::InlineData {
                inline_data: InlineData {
                    mime_type: doc.mime_type.clone(),
                    data: STANDARD.encode(&doc.bytes),
                },
            })
            .collect();
        if !request.user_prompt.trim().is_empty() {
            parts.push(Part::Text {
                text: request.user_prompt.clone(),
            });
        }

        let mut system_text = request.system_prompt.clone();
        if wants_slides {
            system_text.push_str(SLIDES_INSTRUCTION);
        }

        GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part::Text { text: system_text }],
            },
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationSettings {
                temperature: self.temperature,
                top_p: self.top_p,
                top_k: self.top_k,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: if wants_slides {
                    "application/json"
                } else {
                    "text/plain"
                },
            },
        }
    }

    fn provider_error(reason: impl Into<String>) -> Error {
        GenerationError::Provider {
            provider: PROVIDER.to_string(),
            reason: reason.into(),
        }
        .into()
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedContent> {
        let body = self.build_body(&request);

        tracing::info!(
            model = %self.model,
            files = request.files.len(),
            format = %request.desired_format,
            "requesting generation"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::from(GenerationError::Timeout {
                        provider: PROVIDER.to_string(),
                        seconds: self.request_timeout.as_secs(),
                    })
                } else {
                    Self::provider_error(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::provider_error(format!("HTTP {}: {}", status, text)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Self::provider_error(format!("unreadable response: {}", e)))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Self::provider_error(format!("prompt blocked: {}", reason)));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse {
                provider: PROVIDER.to_string(),
            }
            .into());
        }

        Ok(GeneratedContent {
            text,
            format_hint: if request.desired_format == OutputFormat::Pptx {
                ContentFormat::Json
            } else {
                ContentFormat::Text
            },
        })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
