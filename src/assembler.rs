use crate::extractor::ExtractedMetadata;
use crate::{PreviewRecord, DEFAULT_MEDIA_TYPE};

const HTML_CONTENT_TYPE: &str = "text/html";

/// Record for a target that could not be loaded.
pub fn failed(url: &str, host: Option<String>) -> PreviewRecord {
    PreviewRecord {
        url: url.to_string(),
        load_failed: true,
        title: String::new(),
        description: String::new(),
        keywords: Vec::new(),
        content_type: String::new(),
        media_type: DEFAULT_MEDIA_TYPE.to_string(),
        images: None,
        videos: None,
        audios: None,
        host,
    }
}

/// Record for a target that is itself a media file rather than a page.
/// Images list themselves as their only candidate.
pub fn media(url: &str, resource_url: &str, host: Option<String>, content_type: &str) -> PreviewRecord {
    let is_image = content_type.to_ascii_lowercase().starts_with("image/");

    PreviewRecord {
        url: url.to_string(),
        load_failed: false,
        title: String::new(),
        description: String::new(),
        keywords: Vec::new(),
        content_type: content_type.to_string(),
        media_type: if is_image { "photo" } else { DEFAULT_MEDIA_TYPE }.to_string(),
        images: is_image.then(|| vec![resource_url.to_string()]),
        videos: None,
        audios: None,
        host,
    }
}

/// Record for an HTML page. `url` is the URL the caller asked for, `host`
/// the one that served the page that was finally parsed.
pub fn page(url: &str, host: Option<String>, metadata: ExtractedMetadata) -> PreviewRecord {
    PreviewRecord {
        url: url.to_string(),
        load_failed: false,
        title: metadata.title,
        description: metadata.description.unwrap_or_default(),
        keywords: metadata.keywords,
        content_type: HTML_CONTENT_TYPE.to_string(),
        media_type: metadata
            .media_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
        images: Some(metadata.images),
        videos: metadata.videos,
        audios: metadata.audios,
        host,
    }
}
