//! Image candidate selection.
//!
//! Open Graph images are trusted as-is. Only when a page declares none does
//! the ranker fall back to `link[rel=image_src]`, and then to scanning `<img>`
//! elements, filtering by size and ad status and ordering by area.

use crate::ad_filter::AdFilter;
use crate::document::{attribute, Document};
use std::collections::HashSet;
use std::num::IntErrorKind;
use tracing::debug;

/// Smallest accepted width/height, also the default for a missing attribute.
pub const MIN_IMAGE_SIZE: u32 = 500;
/// Exclusive upper bound for width and height.
pub const MAX_IMAGE_SIZE: u32 = 1080;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageCandidate {
    url: String,
    area: u64,
}

impl ImageCandidate {
    /// `None` unless both dimensions fall in `[MIN_IMAGE_SIZE, MAX_IMAGE_SIZE)`.
    fn accept(url: String, width: i64, height: i64) -> Option<Self> {
        let bounds = i64::from(MIN_IMAGE_SIZE)..i64::from(MAX_IMAGE_SIZE);
        if !bounds.contains(&width) || !bounds.contains(&height) {
            return None;
        }
        Some(Self {
            url,
            area: width.unsigned_abs() * height.unsigned_abs(),
        })
    }
}

/// Ranked, absolute image URLs for a page.
pub fn rank_images(document: &Document, ad_filter: &dyn AdFilter) -> Vec<String> {
    let og_images = og_images(document);
    if !og_images.is_empty() {
        debug!(count = og_images.len(), "Using og:image entries");
        return og_images;
    }

    if let Some(image) = image_src_link(document) {
        debug!(image = %image, "Using link[rel=image_src]");
        return vec![image];
    }

    scan_img_elements(document, ad_filter)
}

/// Non-empty `og:image` contents in document order, resolved.
fn og_images(document: &Document) -> Vec<String> {
    document
        .attrs("meta[property='og:image']", "content")
        .into_iter()
        .flatten()
        .filter(|src| !src.trim().is_empty())
        .map(|src| document.resolve(src.trim()))
        .collect()
}

fn image_src_link(document: &Document) -> Option<String> {
    document
        .attr("link[rel='image_src']", "href")
        .filter(|href| !href.trim().is_empty())
        .map(|href| document.resolve(href.trim()))
}

fn scan_img_elements(document: &Document, ad_filter: &dyn AdFilter) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();

    for img in document.select("img") {
        let Some(src) = attribute(&img, "src").filter(|s| !s.is_empty()) else {
            continue;
        };
        if !seen.insert(src.clone()) {
            continue;
        }

        let width = parse_dimension(attribute(&img, "width").as_deref());
        let height = parse_dimension(attribute(&img, "height").as_deref());
        let url = document.resolve(&src);

        if ad_filter.is_ad_url(&url) {
            debug!(url = %url, "Skipping ad image");
            continue;
        }

        if let Some(candidate) = ImageCandidate::accept(url, width, height) {
            accepted.push(candidate);
        }
    }

    // Stable: equal areas keep discovery order.
    accepted.sort_by(|a, b| b.area.cmp(&a.area));
    accepted.into_iter().map(|c| c.url).collect()
}

/// Integer value of a width/height attribute, `MIN_IMAGE_SIZE` when absent or
/// not an integer. Integers past the `i64` range saturate so they stay out of bounds.
fn parse_dimension(value: Option<&str>) -> i64 {
    let Some(value) = value else {
        return i64::from(MIN_IMAGE_SIZE);
    };
    match value.trim().parse::<i64>() {
        Ok(n) => n,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => i64::from(MIN_IMAGE_SIZE),
        },
    }
}
