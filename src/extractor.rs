use crate::ad_filter::AdFilter;
use crate::document::Document;
use crate::images;
use crate::VideoCandidate;
use tracing::debug;

/// Everything the field extractors pull out of one HTML page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub title: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub media_type: Option<String>,
    pub images: Vec<String>,
    pub videos: Option<Vec<VideoCandidate>>,
    pub audios: Option<Vec<String>>,
}

/// Metadata extractor, responsible for extracting preview information from webpage content
#[derive(Clone)]
pub struct MetadataExtractor;

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Run every field extractor over `document`.
    pub fn extract(&self, document: &Document, ad_filter: &dyn AdFilter) -> ExtractedMetadata {
        let metadata = ExtractedMetadata {
            title: self.extract_title(document),
            description: self.extract_description(document),
            keywords: self.extract_keywords(document),
            media_type: self.extract_media_type(document),
            images: images::rank_images(document, ad_filter),
            videos: self.extract_videos(document),
            audios: self.extract_audios(document),
        };

        debug!(
            title = %metadata.title,
            images = metadata.images.len(),
            videos = metadata.videos.as_ref().map_or(0, Vec::len),
            "Extracted page metadata"
        );
        metadata
    }

    /// `og:title`, then a non-OG `title` meta, then the `<title>` element.
    pub fn extract_title(&self, document: &Document) -> String {
        let non_empty = |s: &String| !s.is_empty();

        document
            .attr("meta[property='og:title']", "content")
            .filter(non_empty)
            .or_else(|| {
                document
                    .attr("meta[property='title']", "content")
                    .filter(non_empty)
            })
            .or_else(|| document.text("title").map(|s| s.trim().to_string()))
            .unwrap_or_default()
    }

    /// First description source that is present at all wins, even when empty.
    pub fn extract_description(&self, document: &Document) -> Option<String> {
        document
            .attr("meta[property='og:description']", "content")
            .or_else(|| document.attr("meta[name='description']", "content"))
            .or_else(|| document.attr("meta[name='Description']", "content"))
    }

    pub fn extract_keywords(&self, document: &Document) -> Vec<String> {
        document
            .attr("meta[name='og:keywords']", "content")
            .or_else(|| document.attr("meta[name='keywords']", "content"))
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `og:type`, then `medium`; `image` is reported as `photo`.
    pub fn extract_media_type(&self, document: &Document) -> Option<String> {
        document
            .attr("meta[property='og:type']", "content")
            .or_else(|| document.attr("meta[name='medium']", "content"))
            .map(|kind| if kind == "image" { "photo".to_string() } else { kind })
    }

    /// `og:video` entries paired by position with `og:video:type` and
    /// `og:video:secure_url`. Width and height come from the first
    /// `og:video:width`/`og:video:height` and apply to every entry.
    pub fn extract_videos(&self, document: &Document) -> Option<Vec<VideoCandidate>> {
        let urls = document.attrs("meta[property='og:video']", "content");
        if urls.is_empty() {
            return None;
        }

        let types = document.attrs("meta[property='og:video:type']", "content");
        let secure_urls = document.attrs("meta[property='og:video:secure_url']", "content");
        let width = document.attr("meta[property='og:video:width']", "content");
        let height = document.attr("meta[property='og:video:height']", "content");

        let candidates = urls.into_iter().enumerate().filter_map(|(index, url)| {
            let url = url?;
            Some(VideoCandidate {
                url: document.resolve(&url),
                secure_url: secure_urls
                    .get(index)
                    .cloned()
                    .flatten()
                    .map(|s| document.resolve(&s)),
                mime_type: types.get(index).cloned().flatten(),
                width: width.clone(),
                height: height.clone(),
            })
        });

        let (mut videos, others): (Vec<_>, Vec<_>) =
            candidates.partition(VideoCandidate::is_native_video);
        videos.extend(others);
        Some(videos)
    }

    pub fn extract_audios(&self, document: &Document) -> Option<Vec<String>> {
        let audios: Vec<String> = document
            .attrs("meta[property='og:audio']", "content")
            .into_iter()
            .flatten()
            .filter(|src| !src.is_empty())
            .map(|src| document.resolve(&src))
            .collect();

        (!audios.is_empty()).then_some(audios)
    }
}
