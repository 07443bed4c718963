//! Declared character-encoding resolution.
//!
//! The declaration is taken from a `<meta http-equiv="Content-Type">` tag when
//! the page has one, otherwise from the HTTP `Content-Type` header.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

#[allow(clippy::expect_used)]
static CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

#[allow(clippy::expect_used)]
static VENDOR_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ms(\d+)$").expect("valid regex"));

/// Resolve the charset the response declares for itself.
///
/// `headers` must use lower-cased names. Returns the normalized (lower-case,
/// vendor-alias corrected) charset name, or `None` when nothing is declared.
pub fn resolve_charset(headers: &HashMap<String, String>, body: &[u8]) -> Option<String> {
    let content_type = meta_content_type(body).or_else(|| headers.get("content-type").cloned())?;
    let charset = charset_from_content_type(&content_type)?;

    debug!(content_type = %content_type, charset = %charset, "Resolved declared charset");
    Some(charset)
}

/// Extract and normalize the `charset=` parameter of a content-type string.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    let raw = CHARSET_RE.captures(content_type)?.get(1)?.as_str();
    Some(normalize_charset(raw))
}

/// Lower-case the name and map `msNNN` vendor names onto `windows-NNN`.
pub fn normalize_charset(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match VENDOR_ALIAS_RE.captures(&lower).and_then(|c| c.get(1)) {
        Some(code) => format!("windows-{}", code.as_str()),
        None => lower,
    }
}

/// `content` of the page's `<meta http-equiv="Content-Type">`, from a lossy
/// provisional parse of the undecoded bytes.
fn meta_content_type(body: &[u8]) -> Option<String> {
    let provisional = String::from_utf8_lossy(body);
    let document = Html::parse_document(&provisional);
    let selector = Selector::parse("meta[http-equiv]").ok()?;

    document
        .select(&selector)
        .find(|el| {
            el.value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"))
        })
        .and_then(|el| el.value().attr("content"))
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}
