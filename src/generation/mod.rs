//! Content generation
//!
//! The orchestrator hands a [`GenerationProvider`] the task's input documents, the built system
//! prompt and the user's own prompt, and gets back opaque text plus a hint of its shape.

mod gemini;

pub use gemini::GeminiProvider;

use async_trait::async_trait;

use crate::Result;
use crate::types::OutputFormat;

/// An input document passed to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    /// Original file name
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// MIME type guessed from the file name
    pub mime_type: String,
}

/// Everything a provider needs for one task
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Source documents
    pub files: Vec<InputDocument>,
    /// Prompt built from the content type's template and the task config
    pub system_prompt: String,
    /// Free-text prompt the user attached to the task (may be empty)
    pub user_prompt: String,
    /// Format the output will be rendered to
    pub desired_format: OutputFormat,
}

/// Shape of generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    /// Plain or lightly marked-up prose
    Text,
    /// A JSON document
    Json,
}

/// Provider output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    /// The generated text
    pub text: String,
    /// What the text is expected to contain
    pub format_hint: ContentFormat,
}

/// A model that turns documents and prompts into content
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate content for one request
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedContent>;

    /// Provider name for logs and errors
    fn name(&self) -> &'static str;
}
