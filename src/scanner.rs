//! Page scanning: turns an HTML page into a sequence of PDF work items.
//!
//! Reading and tokenizing are split. [`read_page`] drains the response body,
//! decodes it with the page's charset and records how the stream ended;
//! [`pdf_links`] tokenizes the markup and
//! hands back a forward-only iterator that resolves each PDF href only when
//! it is pulled.
//!
//! The parsed document never outlives [`pdf_links`], so the iterator it
//! returns is `Send` and can be held across `.await` points while the
//! coordinator pushes items into the work queue.

use std::collections::HashSet;
use std::sync::LazyLock;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use futures_util::{Stream, StreamExt};
use scraper::{Html, Selector};
use tracing::{debug, trace};
use url::Url;

use crate::resolver::PageSource;

/// Anchors carrying an attribute literally named `href`, wherever it appears.
#[allow(clippy::expect_used)]
static ANCHOR_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid")); // Static pattern, safe to panic

/// Largest page body read before scanning stops (16 MiB).
pub const MAX_PAGE_BYTES: usize = 16 * 1024 * 1024;

/// Suffix identifying a PDF link.
const PDF_SUFFIX: &str = ".pdf";

/// One PDF to download: an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    url: Url,
}

impl WorkItem {
    /// Wraps an absolute URL.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// The URL to fetch.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.url, f)
    }
}

/// How reading the page body ended.
#[derive(Debug)]
pub enum ScanEnd {
    /// The body stream finished normally.
    EndOfStream,
    /// The body stream failed part way; the markup received so far is still scanned.
    Interrupted(Box<dyn std::error::Error + Send + Sync>),
    /// The body exceeded the size limit; the first `limit` bytes are scanned.
    SizeLimit {
        /// Bytes kept.
        limit: usize,
    },
}

impl ScanEnd {
    /// Returns true for a normal end of stream.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// The page markup as read from the network.
#[derive(Debug)]
pub struct PageBody {
    /// Markup received, decoded to UTF-8.
    pub html: String,
    /// Number of raw bytes kept.
    pub bytes: usize,
    /// Encoding the bytes were decoded from.
    pub encoding: &'static Encoding,
    /// How the body stream ended.
    pub end: ScanEnd,
}

/// Reads a page response body to its end, or to [`MAX_PAGE_BYTES`].
///
/// Every terminal condition stops reading the same way; only the recorded
/// [`ScanEnd`] differs. The charset declared in `Content-Type` is used for
/// decoding when present.
pub async fn read_page(response: reqwest::Response) -> PageBody {
    let declared = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(charset_from_content_type);
    read_body_stream(response.bytes_stream(), declared, MAX_PAGE_BYTES).await
}

/// Drains a stream of body chunks, stopping at the first error or after
/// `max_bytes`, then decodes them.
///
/// Without a `declared` encoding, a byte order mark or a guess from the
/// bytes themselves picks one.
pub async fn read_body_stream<S, B, E>(
    stream: S,
    declared: Option<&'static Encoding>,
    max_bytes: usize,
) -> PageBody
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut stream = std::pin::pin!(stream);
    let mut buffer: Vec<u8> = Vec::new();
    let mut end = ScanEnd::EndOfStream;

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                let chunk = chunk.as_ref();
                let room = max_bytes.saturating_sub(buffer.len());
                if chunk.len() > room {
                    buffer.extend_from_slice(&chunk[..room]);
                    end = ScanEnd::SizeLimit { limit: max_bytes };
                    break;
                }
                buffer.extend_from_slice(chunk);
            }
            Err(e) => {
                end = ScanEnd::Interrupted(Box::new(e));
                break;
            }
        }
    }

    let (html, encoding) = decode_page(&buffer, declared);
    debug!(
        bytes = buffer.len(),
        encoding = encoding.name(),
        complete = end.is_end_of_stream(),
        "page body read"
    );
    PageBody {
        html,
        bytes: buffer.len(),
        encoding,
        end,
    }
}

/// Returns the encoding named by the `charset` parameter of a `Content-Type` value.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches('"').as_bytes())
    })
}

fn decode_page(bytes: &[u8], declared: Option<&'static Encoding>) -> (String, &'static Encoding) {
    let encoding = declared.unwrap_or_else(|| {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    });
    // A byte order mark overrides `encoding`.
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "malformed sequences replaced while decoding page");
    }
    (text.into_owned(), used)
}

/// Tokenizes `html` and returns the PDF links it contains, resolved against `page`.
///
/// Links are de-duplicated by resolved URL: when several anchors point at
/// the same PDF, only the first yields a [`WorkItem`].
#[must_use]
pub fn pdf_links<'a>(html: &str, page: &'a PageSource) -> PdfLinks<'a> {
    let document = Html::parse_document(html);
    let hrefs: Vec<String> = document
        .select(&ANCHOR_HREF)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| is_pdf_href(href))
        .map(str::to_string)
        .collect();
    trace!(count = hrefs.len(), "pdf hrefs found");

    PdfLinks {
        hrefs: hrefs.into_iter(),
        page,
        seen: HashSet::new(),
    }
}

/// Returns true when the href's path, ignoring query and fragment, ends in `.pdf`.
#[must_use]
pub fn is_pdf_href(href: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or("").trim_end();
    path.len()
        .checked_sub(PDF_SUFFIX.len())
        .and_then(|start| path.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(PDF_SUFFIX))
}

/// Lazy iterator over the PDF work items of one page.
///
/// Items are resolved when pulled; a URL already yielded is not yielded again.
#[derive(Debug)]
pub struct PdfLinks<'a> {
    hrefs: std::vec::IntoIter<String>,
    page: &'a PageSource,
    seen: HashSet<Url>,
}

impl Iterator for PdfLinks<'_> {
    type Item = WorkItem;

    fn next(&mut self) -> Option<Self::Item> {
        for href in self.hrefs.by_ref() {
            let url = self.page.resolve(&href);
            if self.seen.insert(url.clone()) {
                return Some(WorkItem::new(url));
            }
            debug!(href = %href, url = %url, "duplicate pdf link ignored");
        }
        None
    }
}
