/// Replaces characters that are unsafe in file names.
///
/// Path separators, Windows-reserved characters and control characters become
/// `_`, double quotes become single quotes. Leading/trailing whitespace and
/// dots are trimmed. An empty result falls back to `"tiktok_video"`.
///
/// # Example
///
/// ```
/// use ttdl::core::utils::escape_filename;
///
/// assert_eq!(escape_filename("dance/trend*.mp4"), "dance_trend_.mp4");
/// assert_eq!(escape_filename("..."), "tiktok_video");
/// ```
pub fn escape_filename(filename: &str) -> String {
    let mut result = String::with_capacity(filename.len());

    for c in filename.chars() {
        match c {
            '/' | '\\' => result.push('_'),
            ':' | '*' | '?' | '<' | '>' | '|' => result.push('_'),
            '"' => result.push('\''),
            c if c.is_control() => result.push('_'),
            _ => result.push(c),
        }
    }

    let result = result.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if result.is_empty() {
        "tiktok_video".to_string()
    } else {
        result.to_string()
    }
}

/// Cuts `text` to at most `max_chars` characters, respecting char boundaries.
///
/// ```
/// use ttdl::core::utils::truncate_chars;
///
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("hi", 10), "hi");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Formats a byte count as MiB with one decimal, e.g. `"45.0"`.
pub fn format_mb(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / (1024.0 * 1024.0))
}
