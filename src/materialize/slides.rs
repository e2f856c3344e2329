//! Slide deck parsing
//!
//! Generated slide decks arrive as JSON in one of three shapes:
//!
//! ```json
//! [{"title": "A", "content": "B"}]
//! {"slides": [{"title": "A", "content": "B"}]}
//! {"slides": {"intro": {"title": "A", "content": "B"}}}
//! ```
//!
//! All three normalize to a `Vec<Slide>`. Keys of the mapping form are ignored and its
//! insertion order is kept. Anything else is rejected.

use serde::Deserialize;
use serde_json::Value;

use crate::Result;
use crate::error::MaterializationError;

/// One slide of a deck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// Slide heading
    pub title: String,
    /// Body text; lines become separate paragraphs
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SlideDeckInput {
    List(Vec<RawSlide>),
    Wrapped { slides: SlideCollection },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SlideCollection {
    List(Vec<RawSlide>),
    Map(serde_json::Map<String, Value>),
}

#[derive(Debug, Default, Deserialize)]
struct RawSlide {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<SlideBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SlideBody {
    Text(String),
    Lines(Vec<String>),
}

impl From<RawSlide> for Slide {
    fn from(raw: RawSlide) -> Self {
        let content = match raw.content {
            None => String::new(),
            Some(SlideBody::Text(text)) => text,
            Some(SlideBody::Lines(lines)) => lines.join("\n"),
        };
        Slide {
            title: raw.title.unwrap_or_default(),
            content,
        }
    }
}

/// Parse generated slide JSON into a canonical slide list
pub fn parse_slides(content: &str) -> Result<Vec<Slide>> {
    let body = strip_code_fence(content);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| MaterializationError::MalformedJson(e.to_string()))?;

    let deck: SlideDeckInput = serde_json::from_value(value).map_err(|_| {
        MaterializationError::InvalidSlideFormat(
            "expected a slide list, {\"slides\": [...]} or {\"slides\": {...}}".to_string(),
        )
    })?;

    let raw = match deck {
        SlideDeckInput::List(slides) => slides,
        SlideDeckInput::Wrapped {
            slides: SlideCollection::List(slides),
        } => slides,
        SlideDeckInput::Wrapped {
            slides: SlideCollection::Map(map),
        } => map
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_value::<RawSlide>(value).map_err(|e| {
                    MaterializationError::InvalidSlideFormat(format!("slide '{}': {}", key, e))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    if raw.is_empty() {
        return Err(MaterializationError::InvalidSlideFormat("deck has no slides".to_string()).into());
    }

    Ok(raw.into_iter().map(Slide::from).collect())
}

// Models often wrap JSON in a ```json fence
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
