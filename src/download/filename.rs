//! Local file names for downloaded URLs.
//!
//! The name is the URL's final path segment, percent-decoded and sanitized
//! so it can never escape the output directory.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

/// Derives the local file name from the URL's final path segment.
///
/// Returns `None` when the path ends in `/` or has no segments at all.
#[must_use]
pub fn file_name_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(
            segment = %last,
            error = %e,
            "URL decoding failed, using raw segment"
        );
        last.into()
    });
    Some(sanitize_filename(&decoded))
}

/// Replaces path separators, reserved characters and control characters,
/// and neutralises `.`/`..` names.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn name_of(url: &str) -> Option<String> {
        file_name_from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_file_name_from_url_uses_last_path_segment() {
        assert_eq!(
            name_of("http://example.com/talks/2024/talk1.pdf").as_deref(),
            Some("talk1.pdf")
        );
    }

    #[test]
    fn test_file_name_from_url_ignores_query() {
        assert_eq!(
            name_of("http://example.com/a/slides.pdf?download=1").as_deref(),
            Some("slides.pdf")
        );
    }

    #[test]
    fn test_file_name_from_url_decodes_percent_escapes() {
        assert_eq!(
            name_of("http://example.com/my%20talk.pdf").as_deref(),
            Some("my talk.pdf")
        );
    }

    #[test]
    fn test_file_name_from_url_encoded_separator_stays_in_segment() {
        assert_eq!(
            name_of("http://example.com/a/..%2F..%2Fetc%2Fpasswd.pdf").as_deref(),
            Some(".._.._etc_passwd.pdf")
        );
    }

    #[test]
    fn test_file_name_from_url_trailing_slash_has_no_name() {
        assert_eq!(name_of("http://example.com/talks/"), None);
        assert_eq!(name_of("http://example.com"), None);
    }

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("file/name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file\\name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file:name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file<name>.pdf"), "file_name_.pdf");
        assert_eq!(sanitize_filename("file|name.pdf"), "file_name.pdf");
    }

    #[test]
    fn test_sanitize_filename_rewrites_dot_segments() {
        assert_eq!(sanitize_filename("."), "_");
        assert_eq!(sanitize_filename(".."), "__");
    }

    #[test]
    fn test_sanitize_filename_preserves_valid_chars() {
        assert_eq!(sanitize_filename("file (1).pdf"), "file (1).pdf");
        assert_eq!(sanitize_filename("日本語.pdf"), "日本語.pdf");
    }
}
