use std::path::{Component, Path};

use time::OffsetDateTime;

use crate::errors::ViewerError;

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Percent-encode a query string value
pub fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Last modification time of `path` as an RFC 3339 string
pub fn last_modified(path: &Path) -> Option<String> {
    let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let secs = mtime.duration_since(std::time::UNIX_EPOCH).ok()?.as_secs();
    let dt = OffsetDateTime::from_unix_timestamp(i64::try_from(secs).ok()?).ok()?;
    dt.format(&time::format_description::well_known::Rfc3339).ok()
}

/// Reject request paths that climb out of their root
pub fn ensure_safe_path(req_path: &str) -> Result<(), ViewerError> {
    for comp in Path::new(req_path).components() {
        match comp {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ViewerError::InvalidPath);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`
pub fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Determine content type for a file based on its extension
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase()) {
        Some(ref ext) if ext == "html" || ext == "htm" => "text/html; charset=utf-8",
        Some(ref ext) if ext == "css" => "text/css; charset=utf-8",
        Some(ref ext) if ext == "js" => "application/javascript; charset=utf-8",
        Some(ref ext) if ext == "json" => "application/json; charset=utf-8",
        Some(ref ext) if ext == "svg" => "image/svg+xml",
        Some(ref ext) if ext == "png" => "image/png",
        Some(ref ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ref ext) if ext == "gif" => "image/gif",
        Some(ref ext) if ext == "webp" => "image/webp",
        Some(ref ext) if ext == "txt" || ext == "md" || ext == "markdown" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_escape_quotes() {
        assert_eq!(escape_attr(r#"a"b'c<&>"#), "a&quot;b&#39;c&lt;&amp;&gt;");
        assert_eq!(escape_html("a < b && c"), "a &lt; b &amp;&amp; c");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        assert_eq!(encode_query_value("/a b/ü&x"), "%2Fa%20b%2F%C3%BC%26x");
        assert_eq!(encode_query_value("plain-1.md"), "plain-1.md");
    }

    #[test]
    fn parent_components_are_rejected() {
        assert!(ensure_safe_path("img/logo.png").is_ok());
        assert!(ensure_safe_path("../secret.txt").is_err());
        assert!(ensure_safe_path("a/../../b").is_err());
        assert!(ensure_safe_path("/etc/passwd").is_err());
    }

    #[test]
    fn case_insensitive_find_reports_byte_offsets() {
        assert_eq!(find_ignore_ascii_case("é<HEAD></Head>", "</head>"), Some(8));
        assert_eq!(find_ignore_ascii_case("<body>", "</head>"), None);
        assert_eq!(find_ignore_ascii_case("ab", "abc"), None);
    }

    #[test]
    fn content_types_follow_extension_case_insensitively() {
        assert_eq!(content_type_for(Path::new("x.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("page.htm")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }
}
