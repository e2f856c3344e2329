//! Utility functions for file naming and type detection

use std::path::Path;

/// Reduce an uploaded file name to a single safe path component
///
/// Directory parts are dropped and characters that are unsafe on common filesystems are
/// replaced with `_`. An empty result becomes `"file"`.
///
/// # Examples
///
/// ```
/// use eduhelpify_pipeline::utils::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_file_name("notes: week 1?.pdf"), "notes_ week 1_.pdf");
/// ```
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.trim_matches('.') {
        "" => "file".to_string(),
        _ => cleaned,
    }
}

/// Name under which a fetched input is staged, namespaced by task
pub fn staged_input_name(task_id: &str, file_name: &str) -> String {
    format!("{}_{}", task_id, sanitize_file_name(file_name))
}

/// Guess a MIME type from a file extension
///
/// Unknown extensions map to `application/octet-stream`.
pub fn guess_mime_type(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
}
