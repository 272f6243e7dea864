//! User-Agent string sent with every request.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/pdfgrab";

/// Default User-Agent for page and PDF requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pdfgrab/{version} (+{PROJECT_UA_URL})")
}
