//! Resolution of discovered hrefs into absolute, fetchable URLs.
//!
//! A [`PageSource`] is parsed once from the target page URL and is immutable
//! afterwards. [`PageSource::resolve`] is a pure function of the page and the
//! href, so it can be called from any number of tasks at once.
//!
//! # Example
//!
//! ```
//! use pdfgrab_core::resolver::PageSource;
//!
//! let page = PageSource::parse("example.com/talks/index.html").unwrap();
//! assert_eq!(page.url().as_str(), "http://example.com/talks/index.html");
//! assert_eq!(
//!     page.resolve("../slides/intro.pdf").as_str(),
//!     "http://example.com/slides/intro.pdf"
//! );
//! ```

use thiserror::Error;
use tracing::trace;
use url::Url;

/// Scheme applied to target URLs that do not carry one.
pub const DEFAULT_SCHEME: &str = "http";

/// Errors raised while parsing the target page URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The target could not be parsed even after defaulting the scheme.
    #[error("invalid page URL {input}: {source}")]
    InvalidPageUrl {
        /// The raw input as supplied by the caller.
        input: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The target parsed, but has no host to fetch from.
    #[error("page URL {input} has no host")]
    MissingHost {
        /// The raw input as supplied by the caller.
        input: String,
    },
}

/// The page being scanned, with the directory its relative links resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    url: Url,
    base_dir: String,
}

impl PageSource {
    /// Parses the target page URL, defaulting the scheme to [`DEFAULT_SCHEME`].
    ///
    /// Accepts absolute URLs (`https://host/p`), scheme-relative URLs
    /// (`//host/p`) and bare `host/p` inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the input cannot be turned into a URL with a host.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let trimmed = input.trim();
        let url = match Url::parse(trimmed) {
            Ok(url) if url.has_host() => url,
            // "localhost:8080/x" parses with scheme "localhost" and no host
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
                with_default_scheme(trimmed).map_err(|source| ResolveError::InvalidPageUrl {
                    input: input.to_string(),
                    source,
                })?
            }
            Err(source) => {
                return Err(ResolveError::InvalidPageUrl {
                    input: input.to_string(),
                    source,
                });
            }
        };

        if !url.has_host() {
            return Err(ResolveError::MissingHost {
                input: input.to_string(),
            });
        }

        let base_dir = parent_dir(url.path()).to_string();
        Ok(Self { url, base_dir })
    }

    /// The normalized page URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Directory of the page path that relative hrefs are joined onto.
    #[must_use]
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Resolves an href found on the page into a new absolute URL.
    ///
    /// Absolute hrefs are returned as-is. Scheme-relative hrefs take the page
    /// scheme. Root-relative hrefs replace the page path; other relative hrefs
    /// are joined onto [`base_dir`](Self::base_dir). Dot segments are
    /// collapsed and percent-escapes are left untouched. The query and
    /// fragment come from the href, never from the page.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Url {
        let href = href.trim();

        if let Ok(absolute) = Url::parse(href) {
            trace!(href, "href is absolute");
            return absolute;
        }

        if href.starts_with("//") {
            if let Ok(url) = Url::parse(&format!("{}:{href}", self.url.scheme())) {
                return url;
            }
        }

        let (path_part, query, fragment) = split_href(href);
        let joined = if path_part.starts_with('/') {
            path_part.to_string()
        } else if path_part.is_empty() {
            self.url.path().to_string()
        } else {
            format!("{}/{path_part}", self.base_dir)
        };
        let normalized = normalize_path(&joined);

        let mut resolved = self.url.clone();
        resolved.set_path(&normalized);
        resolved.set_query(query);
        resolved.set_fragment(fragment);
        trace!(href, resolved = %resolved, "resolved relative href");
        resolved
    }
}

fn with_default_scheme(input: &str) -> Result<Url, url::ParseError> {
    if input.starts_with("//") {
        Url::parse(&format!("{DEFAULT_SCHEME}:{input}"))
    } else {
        Url::parse(&format!("{DEFAULT_SCHEME}://{input}"))
    }
}

/// Everything before the last `/` of a URL path, or `/` when that is empty.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Splits an href into its path, query and fragment parts.
fn split_href(href: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match href.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (href, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    (path, query, fragment)
}

/// Lexically cleans an absolute path: drops `.` and empty segments, lets
/// `..` remove the previous segment (never climbing above the root).
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn talks_page() -> PageSource {
        PageSource::parse("http://example.com/talks/index.html").unwrap()
    }

    #[test]
    fn test_parse_keeps_explicit_scheme() {
        let page = PageSource::parse("https://example.com/a/b.html").unwrap();
        assert_eq!(page.url().scheme(), "https");
        assert_eq!(page.base_dir(), "/a");
    }

    #[test]
    fn test_parse_defaults_missing_scheme_to_http() {
        let page = PageSource::parse("example.com/talks/index.html").unwrap();
        assert_eq!(page.url().as_str(), "http://example.com/talks/index.html");
    }

    #[test]
    fn test_parse_scheme_relative_input() {
        let page = PageSource::parse("//example.com/talks/").unwrap();
        assert_eq!(page.url().as_str(), "http://example.com/talks/");
        assert_eq!(page.base_dir(), "/talks");
    }

    #[test]
    fn test_parse_host_with_port_without_scheme() {
        let page = PageSource::parse("localhost:8080/docs/index.html").unwrap();
        assert_eq!(page.url().host_str(), Some("localhost"));
        assert_eq!(page.url().port(), Some(8080));
        assert_eq!(page.base_dir(), "/docs");
    }

    #[test]
    fn test_parse_root_page_has_root_base_dir() {
        let page = PageSource::parse("http://example.com").unwrap();
        assert_eq!(page.base_dir(), "/");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = PageSource::parse("http://");
        assert!(result.is_err(), "expected error, got {result:?}");
    }

    #[test]
    fn test_resolve_absolute_href_unchanged() {
        let page = talks_page();
        let href = "https://cdn.example.org/files/deck.pdf?v=2";
        assert_eq!(page.resolve(href).as_str(), href);
    }

    #[test]
    fn test_resolve_relative_href_joins_page_directory() {
        let page = talks_page();
        assert_eq!(
            page.resolve("talk1.pdf").as_str(),
            "http://example.com/talks/talk1.pdf"
        );
    }

    #[test]
    fn test_resolve_root_relative_href_replaces_path() {
        let page = talks_page();
        assert_eq!(
            page.resolve("/abs/talk2.pdf").as_str(),
            "http://example.com/abs/talk2.pdf"
        );
    }

    #[test]
    fn test_resolve_collapses_dot_segments() {
        let page = talks_page();
        assert_eq!(
            page.resolve("./2024/../2023/./keynote.pdf").as_str(),
            "http://example.com/talks/2023/keynote.pdf"
        );
        assert_eq!(
            page.resolve("../../../../top.pdf").as_str(),
            "http://example.com/top.pdf"
        );
    }

    #[test]
    fn test_resolve_does_not_percent_decode() {
        let page = talks_page();
        assert_eq!(
            page.resolve("my%20talk.pdf").as_str(),
            "http://example.com/talks/my%20talk.pdf"
        );
    }

    #[test]
    fn test_resolve_scheme_relative_href_takes_page_scheme() {
        let page = PageSource::parse("https://example.com/index.html").unwrap();
        assert_eq!(
            page.resolve("//mirror.example.net/a.pdf").as_str(),
            "https://mirror.example.net/a.pdf"
        );
    }

    #[test]
    fn test_resolve_query_comes_from_href_not_page() {
        let page = PageSource::parse("http://example.com/talks/index.html?lang=en#top").unwrap();
        assert_eq!(
            page.resolve("slides.pdf?dl=1").as_str(),
            "http://example.com/talks/slides.pdf?dl=1"
        );
        assert_eq!(
            page.resolve("slides.pdf").as_str(),
            "http://example.com/talks/slides.pdf"
        );
    }

    #[test]
    fn test_resolve_is_pure_across_calls() {
        let page = talks_page();
        let first = page.resolve("a.pdf");
        let _second = page.resolve("/other/b.pdf");
        assert_eq!(first.as_str(), "http://example.com/talks/a.pdf");
        assert_eq!(page.url().as_str(), "http://example.com/talks/index.html");
    }

    #[test]
    fn test_resolve_keeps_port() {
        let page = PageSource::parse("http://127.0.0.1:4000/talks/").unwrap();
        assert_eq!(
            page.resolve("x.pdf").as_str(),
            "http://127.0.0.1:4000/talks/x.pdf"
        );
    }

    #[test]
    fn test_normalize_path_handles_repeated_slashes() {
        assert_eq!(normalize_path("/a//b///c.pdf"), "/a/b/c.pdf");
        assert_eq!(normalize_path("/"), "/");
    }
}
