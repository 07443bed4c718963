use crate::utils;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

/// A parsed HTML page plus the base URL its relative links resolve against.
///
/// All lookups take a CSS selector string and return owned, explicitly
/// optional values, so extractors never deal with scraper types directly.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parse `text` served from `page_url`. A `<base href>` in the page, when
    /// present, takes over as the resolution base.
    pub fn parse(text: &str, page_url: &str) -> Self {
        let html = Html::parse_document(text);
        let page = Url::parse(page_url).ok();

        let mut document = Self {
            html,
            base_url: page.clone(),
        };
        if let Some(href) = document.attr("base[href]", "href") {
            document.base_url = match &page {
                Some(page) => page.join(&href).ok().or(Some(page.clone())),
                None => Url::parse(&href).ok(),
            };
        }
        document
    }

    /// Matched elements in document order. An invalid selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(e) => {
                warn!(selector = css, error = ?e, "Invalid selector");
                Vec::new()
            }
        }
    }

    /// `name` attribute of the first element matching `css`.
    ///
    /// Only the first match is consulted: if it lacks the attribute the
    /// result is `None` even when a later match carries it.
    pub fn attr(&self, css: &str, name: &str) -> Option<String> {
        self.select(css)
            .first()
            .and_then(|el| attribute(el, name))
    }

    /// `name` attribute of every element matching `css`, index-aligned with the matches.
    pub fn attrs(&self, css: &str, name: &str) -> Vec<Option<String>> {
        self.select(css)
            .iter()
            .map(|el| attribute(el, name))
            .collect()
    }

    /// Text content of the first element matching `css`.
    pub fn text(&self, css: &str) -> Option<String> {
        self.select(css)
            .first()
            .map(|el| el.text().collect::<String>())
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve a possibly relative link against the page's base URL.
    pub fn resolve(&self, href: &str) -> String {
        utils::resolve_url(self.base_url.as_ref(), href)
    }
}

/// Typed attribute accessor over a matched node.
pub fn attribute(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <title> Hello </title>
        <meta property="og:video" content="/a.mp4">
        <meta property="og:video">
        <meta property="og:video" content="/c.mp4">
    </head><body></body></html>"#;

    #[test]
    fn test_attr_reads_first_match_only() {
        let doc = Document::parse(
            r#"<meta name="x"><meta name="x" content="second">"#,
            "https://example.com/",
        );
        assert_eq!(doc.attr("meta[name='x']", "content"), None);
    }

    #[test]
    fn test_attrs_stay_index_aligned() {
        let doc = Document::parse(PAGE, "https://example.com/watch");
        assert_eq!(
            doc.attrs("meta[property='og:video']", "content"),
            vec![Some("/a.mp4".to_string()), None, Some("/c.mp4".to_string())]
        );
    }

    #[test]
    fn test_text_and_resolve() {
        let doc = Document::parse(PAGE, "https://example.com/watch/1");
        assert_eq!(doc.text("title").as_deref(), Some(" Hello "));
        assert_eq!(doc.resolve("b.png"), "https://example.com/watch/b.png");
        assert!(doc.select("meta[[broken").is_empty());
    }

    #[test]
    fn test_base_href_overrides_page_url() {
        let doc = Document::parse(
            r#"<html><head><base href="https://static.example.org/assets/"></head></html>"#,
            "https://example.com/page",
        );
        assert_eq!(doc.resolve("x.png"), "https://static.example.org/assets/x.png");
    }
}
