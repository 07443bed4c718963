use thiserror::Error;
use tracing::{error, warn};

/// Failures raised inside the pipeline.
///
/// None of these ever reach a caller of [`crate::fetch_preview`]; the generator
/// logs them and degrades to a `loadFailed` record instead.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Empty response body: {0}")]
    EmptyBody(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl PreviewError {
    pub fn log(&self) {
        match self {
            PreviewError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            PreviewError::FetchError(e) => {
                error!(error = %e, "Content fetch failed");
            }
            PreviewError::TimeoutError(e) => {
                warn!(error = %e, "Request timed out");
            }
            PreviewError::HttpStatus { status, url } => {
                warn!(status = *status, url = %url, "Non-200 response");
            }
            PreviewError::EmptyBody(url) => {
                warn!(url = %url, "Response body was empty");
            }
            PreviewError::ConfigError(e) => {
                error!(error = %e, "Invalid configuration");
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            PreviewError::TimeoutError(format!("{url}: {err}"))
        } else {
            PreviewError::FetchError(format!("{url}: {err}"))
        }
    }
}
