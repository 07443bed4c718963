//! Turn a URL into a link preview card.
//!
//! ```no_run
//! # async fn demo() {
//! let record = link_preview::fetch_preview("https://www.rust-lang.org").await;
//! if !record.load_failed {
//!     println!("{} ({})", record.title, record.media_type);
//! }
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod ad_filter;
mod assembler;
mod charset;
mod classifier;
mod decoder;
mod document;
mod error;
mod extractor;
mod fetcher;
mod images;
#[cfg(feature = "logging")]
mod logging;
mod preview_generator;
mod preview_service;
mod utils;

pub use ad_filter::{AdFilter, NoAdFilter, PatternAdFilter};
pub use charset::{charset_from_content_type, normalize_charset, resolve_charset};
pub use decoder::decode_body;
pub use document::Document;
pub use error::PreviewError;
pub use extractor::{ExtractedMetadata, MetadataExtractor};
pub use fetcher::{
    Fetcher, FetcherConfig, PendingResponse, RawResponse, RequestSpec, ResponseHead, Transport,
};
pub use images::{rank_images, MAX_IMAGE_SIZE, MIN_IMAGE_SIZE};
#[cfg(feature = "logging")]
pub use logging::{format_preview_card, log_preview_card, setup_logging, LogConfig};
pub use preview_generator::{UrlPreviewGenerator, MAX_LAZY_FRAME_HOPS};
pub use preview_service::{PreviewService, PreviewServiceConfig, MAX_CONCURRENT_REQUESTS};

/// Media type reported when a page gives no signal.
pub const DEFAULT_MEDIA_TYPE: &str = "website";

/// The normalized preview of one URL.
///
/// Either `load_failed` is set and every content field is empty or absent,
/// or it is clear and `content_type` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRecord {
    /// The URL the caller asked for, even when a lazy frame was followed.
    pub url: String,
    pub load_failed: bool,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub content_type: String,
    /// Never empty; defaults to [`DEFAULT_MEDIA_TYPE`].
    pub media_type: String,
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<VideoCandidate>>,
    pub audios: Option<Vec<String>>,
    /// Host that served the final response.
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    pub url: String,
    pub secure_url: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl VideoCandidate {
    /// Whether the declared MIME type is a `video/*` one.
    pub fn is_native_video(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|t| t.starts_with("video/"))
    }
}

#[async_trait]
pub trait PreviewGenerator {
    /// Produce the preview for `request`. Every failure is folded into a
    /// `load_failed` record.
    async fn generate_preview(&self, request: RequestSpec) -> PreviewRecord;
}

/// Fetch `target` with the default transport and ad filter.
///
/// The returned future resolves exactly once and never carries an error.
pub async fn fetch_preview(target: impl Into<RequestSpec>) -> PreviewRecord {
    UrlPreviewGenerator::new()
        .generate_preview(target.into())
        .await
}
