use std::collections::HashSet;
use url::Url;

/// Oracle deciding whether an image URL is served by an ad network.
pub trait AdFilter: Send + Sync {
    fn is_ad_url(&self, url: &str) -> bool;
}

/// Treats nothing as an ad.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdFilter;

impl AdFilter for NoAdFilter {
    fn is_ad_url(&self, _url: &str) -> bool {
        false
    }
}

const AD_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    "adservice.google.com",
    "amazon-adsystem.com",
    "adnxs.com",
    "adsrvr.org",
    "advertising.com",
    "criteo.com",
    "criteo.net",
    "outbrain.com",
    "taboola.com",
    "pubmatic.com",
    "rubiconproject.com",
    "openx.net",
    "casalemedia.com",
    "scorecardresearch.com",
    "moatads.com",
    "serving-sys.com",
    "adform.net",
];

const AD_PATH_MARKERS: &[&str] = &["/ads/", "/adserver/", "/banners/", "/pagead/", "/adimg/"];

/// Blocklist oracle: a URL is an ad when its host is, or is a subdomain of, a
/// listed ad domain, or its path contains an ad-serving segment.
#[derive(Debug, Clone)]
pub struct PatternAdFilter {
    blocked_domains: HashSet<String>,
    path_markers: Vec<String>,
}

impl Default for PatternAdFilter {
    fn default() -> Self {
        Self {
            blocked_domains: AD_DOMAINS.iter().map(|d| d.to_string()).collect(),
            path_markers: AD_PATH_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl PatternAdFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocked_domain(mut self, domain: impl Into<String>) -> Self {
        self.blocked_domains
            .insert(domain.into().trim().to_ascii_lowercase());
        self
    }

    pub fn with_path_marker(mut self, marker: impl Into<String>) -> Self {
        self.path_markers.push(marker.into().to_ascii_lowercase());
        self
    }

    fn is_domain_blocked(&self, host: &str) -> bool {
        self.blocked_domains
            .iter()
            .any(|blocked| host == blocked || host.ends_with(&format!(".{blocked}")))
    }
}

impl AdFilter for PatternAdFilter {
    fn is_ad_url(&self, url: &str) -> bool {
        // Unparseable or empty URLs fail open.
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if let Some(host) = parsed.host_str() {
            if self.is_domain_blocked(&host.to_ascii_lowercase()) {
                return true;
            }
        }

        let path = parsed.path().to_ascii_lowercase();
        self.path_markers.iter().any(|marker| path.contains(marker.as_str()))
    }
}
