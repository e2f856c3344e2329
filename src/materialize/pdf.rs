//! Minimal PDF 1.4 writer
//!
//! Lays paragraphs out top to bottom in 11pt Helvetica on US-Letter pages, wrapping long
//! paragraphs at word boundaries and starting new pages as needed. Text is encoded as
//! WinAnsi: Latin-1 plus the typographic punctuation in 0x80-0x9F. Anything else is
//! written as `?`.

use std::fmt::Write as _;

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
const FONT_SIZE: u32 = 11;
const LEADING: u32 = 14;
// Average Helvetica glyph is a little over half the font size wide
const MAX_CHARS_PER_LINE: usize = 85;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Render paragraphs into a complete PDF document
pub fn render(paragraphs: &[String]) -> Vec<u8> {
    let pages = paginate(paragraphs);

    let mut doc = PdfBuilder::default();
    doc.raw(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let page_count = pages.len();
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", page_object_id(i)))
        .collect();

    doc.object(1, "<< /Type /Catalog /Pages 2 0 R >>".as_bytes());
    doc.object(
        2,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        )
        .as_bytes(),
    );
    doc.object(
        3,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    for (index, lines) in pages.iter().enumerate() {
        let page_id = page_object_id(index);
        let content_id = page_id + 1;

        doc.object(
            page_id,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT, content_id
            )
            .as_bytes(),
        );

        let stream = content_stream(lines);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        doc.object(content_id, &body);
    }

    doc.finish()
}

fn page_object_id(index: usize) -> usize {
    4 + index * 2
}

// Paragraphs are separated by one blank line
fn paginate(paragraphs: &[String]) -> Vec<Vec<String>> {
    let mut lines: Vec<String> = Vec::new();
    for (i, paragraph) in paragraphs.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(wrap(paragraph, MAX_CHARS_PER_LINE));
    }

    let mut pages: Vec<Vec<String>> = lines
        .chunks(LINES_PER_PAGE)
        .map(|chunk| chunk.to_vec())
        .collect();

    // A page must not start with the blank separator line
    for page in pages.iter_mut() {
        if page.first().is_some_and(|l| l.is_empty()) {
            page.remove(0);
        }
    }

    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

/// Greedy word wrap; words longer than a line are split
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn content_stream(lines: &[String]) -> Vec<u8> {
    let mut stream = format!(
        "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
        FONT_SIZE,
        LEADING,
        MARGIN,
        PAGE_HEIGHT - MARGIN
    )
    .into_bytes();

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            stream.extend_from_slice(b"T*\n");
        }
        stream.push(b'(');
        stream.extend(encode_text(line));
        stream.extend_from_slice(b") Tj\n");
    }

    stream.extend_from_slice(b"ET");
    stream
}

/// Encode a string for a PDF literal: WinAnsi bytes with `\`, `(` and `)` escaped
pub(crate) fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\t' => out.push(b' '),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) < 0x7F || (0xA0..=0xFF).contains(&(c as u32)) => out.push(c as u8),
            c => out.push(win_ansi_byte(c).unwrap_or(b'?')),
        }
    }
    out
}

// WinAnsiEncoding code points 0x80-0x9F that differ from Latin-1
fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        // Common in generated text, no WinAnsi glyph of their own
        '\u{2212}' | '\u{2010}' | '\u{2011}' => b'-',
        '\u{2009}' | '\u{202F}' => b' ',
        _ => return None,
    };
    Some(byte)
}

#[derive(Default)]
struct PdfBuilder {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfBuilder {
    fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);
        let size = self.offsets.len() + 1;
        let xref_offset = self.buf.len();

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for (_, offset) in &self.offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, xref_offset
        );

        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap("abcdefghijkl xy", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn escapes_and_replaces_characters() {
        assert_eq!(encode_text("a(b)\\c"), b"a\\(b\\)\\\\c".to_vec());
        assert_eq!(encode_text("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_text("日本"), b"??".to_vec());
    }

    #[test]
    fn typographic_punctuation_uses_win_ansi_codes() {
        assert_eq!(
            encode_text("• it’s “x” — y"),
            vec![
                0x95, b' ', b'i', b't', 0x92, b's', b' ', 0x93, b'x', 0x94, b' ', 0x97, b' ',
                b'y'
            ]
        );
        assert_eq!(encode_text("€5 – 10…"), vec![0x80, b'5', b' ', 0x96, b' ', b'1', b'0', 0x85]);
        assert_eq!(encode_text("2 − 1"), b"2 - 1".to_vec());
    }

    #[test]
    fn rendered_pdf_keeps_punctuation() {
        let pdf = render(&["“Quoted” • point".to_string()]);
        let expected: &[u8] = &[
            b'(', 0x93, b'Q', b'u', b'o', b't', b'e', b'd', 0x94, b' ', 0x95, b' ', b'p', b'o',
            b'i', b'n', b't', b')',
        ];
        assert_eq!(count(&pdf, expected), 1);
        assert_eq!(count(&pdf, b"?"), 0);
    }

    #[test]
    fn long_content_spans_multiple_pages() {
        let paragraphs: Vec<String> = (0..120).map(|i| format!("Paragraph {}", i)).collect();
        let pdf = render(&paragraphs);

        assert!(count(&pdf, b"/Type /Page ") >= 3);
        assert!(count(&pdf, b"(Paragraph 119) Tj") == 1);
    }

    #[test]
    fn empty_input_still_produces_one_page() {
        let pdf = render(&[]);
        assert_eq!(count(&pdf, b"/Type /Page "), 1);
        assert!(pdf.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pdf = render(&["Hello".to_string()]);
        let xref_start = pdf.windows(5).position(|w| w == b"xref\n").unwrap();
        let tail = std::str::from_utf8(&pdf[xref_start..]).unwrap();
        let entries: Vec<&str> = tail.lines().skip(3).take(5).collect();

        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj", i + 1);
            assert!(
                pdf[offset..].starts_with(expected.as_bytes()),
                "object {} misplaced",
                i + 1
            );
        }
    }
}
