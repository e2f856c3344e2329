//! Output materialization
//!
//! Converts generated text into the bytes of the requested output file:
//! - `txt` — text with markdown emphasis markers (`*`) removed
//! - `html` / `json` — written as generated
//! - `pdf` — paragraphs laid out on US-Letter pages ([`pdf`])
//! - `docx` — one Word paragraph per line ([`ooxml`])
//! - `pptx` — slides parsed from JSON ([`slides`]) and written as a deck ([`ooxml`])

use crate::Result;
use crate::types::OutputFormat;

pub mod ooxml;
pub mod pdf;
pub mod slides;

pub use slides::{Slide, parse_slides};

/// Renders generated content into output files
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMaterializer;

impl OutputMaterializer {
    /// Render `content` as `format`
    pub fn render(&self, content: &str, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Txt => Ok(clean_text(content).into_bytes()),
            OutputFormat::Html | OutputFormat::Json => Ok(content.as_bytes().to_vec()),
            OutputFormat::Pdf => Ok(pdf::render(&paragraphs(content))),
            OutputFormat::Docx => ooxml::render_docx(&paragraphs(content)),
            OutputFormat::Pptx => {
                let slides = parse_slides(content)?;
                ooxml::render_pptx(&slides)
            }
        }
    }
}

/// Strip markdown emphasis markers
pub fn clean_text(content: &str) -> String {
    content.replace('*', "")
}

/// Split content into non-empty paragraphs, one per line
pub fn paragraphs(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::error::MaterializationError;

    #[test]
    fn txt_strips_asterisks_and_is_idempotent() {
        let m = OutputMaterializer;
        let once = m.render("**Bold** and *italic*", OutputFormat::Txt).unwrap();
        assert_eq!(once, b"Bold and italic");

        let twice = m
            .render(std::str::from_utf8(&once).unwrap(), OutputFormat::Txt)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn html_and_json_are_verbatim() {
        let m = OutputMaterializer;
        let html = "<p>*kept*</p>";
        assert_eq!(m.render(html, OutputFormat::Html).unwrap(), html.as_bytes());
        let json = "{\"a\": \"*\"}";
        assert_eq!(m.render(json, OutputFormat::Json).unwrap(), json.as_bytes());
    }

    #[test]
    fn paragraphs_skip_blank_lines() {
        let paras = paragraphs("First\n\n   \nSecond  \r\nThird");
        assert_eq!(paras, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn pptx_rejects_unknown_shape() {
        let err = OutputMaterializer
            .render("{\"bad\":1}", OutputFormat::Pptx)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Materialization(MaterializationError::InvalidSlideFormat(_))
        ));
    }

    #[test]
    fn pdf_output_has_pdf_header() {
        let bytes = OutputMaterializer
            .render("Hello\nWorld", OutputFormat::Pdf)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }
}
