//! Branch decisions made on transport signals before and after the body arrives.

use crate::document::Document;
use crate::fetcher::{RawResponse, ResponseHead};
use crate::utils;
use crate::PreviewError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Id of the frame some blog hosts load the real page into.
pub const LAZY_FRAME_ID: &str = "mainFrame";

#[allow(clippy::expect_used)]
static FRAME_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<frame\b[^>]*>").expect("valid regex"));

#[allow(clippy::expect_used)]
static MAIN_FRAME_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\sid\s*=\s*["']?mainFrame(?:["'\s/>]|$)"#).expect("valid regex")
});

#[allow(clippy::expect_used)]
static SRC_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid regex")
});

/// What to do once response headers are in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadDecision {
    /// Not worth reading: degrade to a failed record.
    Fail(String),
    /// A direct media resource with this content type; no HTML parsing.
    Media(String),
    /// Read the body and treat it as HTML.
    ReadBody,
}

pub fn classify_head(head: &ResponseHead) -> HeadDecision {
    if head.status != 200 {
        return HeadDecision::Fail(format!("status {}", head.status));
    }
    if head
        .headers
        .get("content-length")
        .is_some_and(|len| len.trim() == "0")
    {
        return HeadDecision::Fail("empty body".into());
    }

    match head.content_type() {
        Some(content_type) if !is_html(content_type) => {
            debug!(content_type = %content_type, "Direct media response");
            HeadDecision::Media(content_type.to_string())
        }
        _ => HeadDecision::ReadBody,
    }
}

/// A completed response is usable when it is a 200 with a non-empty body.
pub fn check_complete(response: &RawResponse) -> Result<(), PreviewError> {
    if response.head.status != 200 {
        return Err(PreviewError::HttpStatus {
            status: response.head.status,
            url: response.head.final_url.clone(),
        });
    }
    if response.body.is_empty() {
        return Err(PreviewError::EmptyBody(response.head.final_url.clone()));
    }
    Ok(())
}

fn is_html(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("text/html")
}

/// Absolute URL of the page's `frame#mainFrame`, when it has one.
///
/// Relative sources resolve against the origin of `page_url`. A source with a
/// scheme other than `http`/`https` is not a frame worth following.
pub fn lazy_frame_target(document: &Document, text: &str, page_url: &str) -> Option<String> {
    let src = document
        .attr(&format!("frame#{LAZY_FRAME_ID}"), "src")
        .or_else(|| scan_frame_tags(text))
        .map(|src| src.trim().to_string())
        .filter(|src| !src.is_empty())?;

    if let Ok(absolute) = Url::parse(&src) {
        return matches!(absolute.scheme(), "http" | "https").then_some(src);
    }

    let page = Url::parse(page_url).ok()?;
    let origin = utils::origin_of(&page).ok()?;
    origin.join(&src).ok().map(String::from)
}

/// Raw-markup lookup for frames the HTML parser dropped outside a `<frameset>`.
fn scan_frame_tags(text: &str) -> Option<String> {
    FRAME_TAG_RE
        .find_iter(text)
        .map(|tag| tag.as_str())
        .find(|tag| MAIN_FRAME_ID_RE.is_match(tag))
        .and_then(|tag| SRC_ATTR_RE.captures(tag))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
}
