//! Prompt construction from system prompt templates
//!
//! Templates carry two literal placeholders, `{difficulty_level}` and `{content_length}`.
//! Nothing else in the template is interpreted.

use crate::types::TaskConfig;

const DIFFICULTY_PLACEHOLDER: &str = "{difficulty_level}";
const LENGTH_PLACEHOLDER: &str = "{content_length}";

/// Builds the final instruction text for a task
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Substitute placeholders and append the focus area line when one is given
    pub fn build(
        template: &str,
        difficulty_level: &str,
        content_length: &str,
        focus_area: &str,
    ) -> String {
        let mut prompt = template
            .replace(DIFFICULTY_PLACEHOLDER, difficulty_level)
            .replace(LENGTH_PLACEHOLDER, content_length);

        if !focus_area.is_empty() {
            prompt.push('\n');
            prompt.push_str("Focus on: ");
            prompt.push_str(focus_area);
        }

        prompt
    }

    /// [`PromptBuilder::build`] with unset config values treated as empty strings
    pub fn from_config(template: &str, config: &TaskConfig) -> String {
        Self::build(
            template,
            config.difficulty_level.as_deref().unwrap_or_default(),
            config.content_length.as_deref().unwrap_or_default(),
            config.focus_area.as_deref().unwrap_or_default(),
        )
    }
}
