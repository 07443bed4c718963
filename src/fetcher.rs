use crate::utils;
use crate::PreviewError;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// One outbound request, with the transport options that apply to it.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url: String,
    pub timeout: Duration,
    pub follow_redirects: bool,
    /// Hand the body to charset resolution undecoded. When off the body is
    /// read as UTF-8 whatever it declares.
    pub raw_body: bool,
    pub headers: Vec<(String, String)>,
    original_url: Option<String>,
}

impl RequestSpec {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            follow_redirects: true,
            raw_body: true,
            headers: Vec::new(),
            original_url: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_raw_body(mut self, raw: bool) -> Self {
        self.raw_body = raw;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// URL of the page that led here through a lazy frame, if any.
    pub fn original_url(&self) -> Option<&str> {
        self.original_url.as_deref()
    }

    /// The URL the caller asked for: the original one once a hop happened.
    pub fn requested_url(&self) -> &str {
        self.original_url.as_deref().unwrap_or(&self.url)
    }

    /// Same options aimed at `url`. The first URL ever requested is kept as
    /// the original and is not replaced by later hops.
    pub fn redirected_to(&self, url: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.original_url = Some(self.requested_url().to_string());
        next.url = url.into();
        next
    }
}

impl From<&str> for RequestSpec {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for RequestSpec {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// What is known once response headers arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// Lower-cased header names.
    pub headers: HashMap<String, String>,
    /// URL that actually served the response, after transport redirects.
    pub final_url: String,
    pub host: Option<String>,
}

impl ResponseHead {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// A complete response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub head: ResponseHead,
    pub body: Vec<u8>,
}

/// HTTP capability the pipeline runs on.
///
/// `begin` resolves once headers are in. The returned handle is then either
/// drained with [`PendingResponse::finish`] or dropped with
/// [`PendingResponse::abort`]; both consume it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn begin(&self, request: &RequestSpec) -> Result<Box<dyn PendingResponse>, PreviewError>;
}

#[async_trait]
pub trait PendingResponse: Send {
    fn head(&self) -> &ResponseHead;

    async fn finish(self: Box<Self>) -> Result<RawResponse, PreviewError>;

    fn abort(self: Box<Self>);
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    direct_client: Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default()).unwrap_or_else(|e| {
            e.log();
            Self::with_client(Client::new())
        })
    }

    /// Use `client` for every request. Its own redirect policy then applies
    /// regardless of [`RequestSpec::follow_redirects`].
    pub fn with_client(client: Client) -> Self {
        Self {
            direct_client: client.clone(),
            client,
        }
    }

    /// Creates a Fetcher with custom configuration
    pub fn new_with_config(config: FetcherConfig) -> Result<Self, PreviewError> {
        let build = |policy: Policy| {
            let mut builder = Client::builder()
                .user_agent(config.user_agent.as_str())
                .timeout(config.timeout)
                .pool_max_idle_per_host(10)
                .redirect(policy);
            if let Some(headers) = config.headers.clone() {
                builder = builder.default_headers(headers);
            }
            builder
                .build()
                .map_err(|e| PreviewError::ConfigError(format!("HTTP client: {e}")))
        };

        Ok(Self {
            client: build(Policy::limited(config.max_redirects))?,
            direct_client: build(Policy::none())?,
        })
    }
}

#[async_trait]
impl Transport for Fetcher {
    #[instrument(level = "debug", skip(self, request), fields(url = %request.url), err)]
    async fn begin(&self, request: &RequestSpec) -> Result<Box<dyn PendingResponse>, PreviewError> {
        let client = if request.follow_redirects {
            &self.client
        } else {
            &self.direct_client
        };

        let mut builder = client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PreviewError::from_reqwest(e, &request.url))?;

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers
                    .entry(name.as_str().to_ascii_lowercase())
                    .or_insert_with(|| value.to_string());
            }
        }

        let head = ResponseHead {
            status: response.status().as_u16(),
            headers,
            final_url: response.url().to_string(),
            host: utils::host_with_port(response.url()),
        };
        debug!(status = head.status, content_type = ?head.content_type(), "Headers received");

        Ok(Box::new(ReqwestPending { head, response }))
    }
}

struct ReqwestPending {
    head: ResponseHead,
    response: reqwest::Response,
}

#[async_trait]
impl PendingResponse for ReqwestPending {
    fn head(&self) -> &ResponseHead {
        &self.head
    }

    async fn finish(self: Box<Self>) -> Result<RawResponse, PreviewError> {
        let ReqwestPending { head, response } = *self;
        let body = response
            .bytes()
            .await
            .map_err(|e| PreviewError::from_reqwest(e, &head.final_url))?;

        debug!(url = %head.final_url, content_length = body.len(), "Body received");
        Ok(RawResponse {
            head,
            body: body.to_vec(),
        })
    }

    fn abort(self: Box<Self>) {
        debug!(url = %self.head.final_url, "Aborting in-flight response");
        drop(self);
    }
}

/// Client-wide transport settings.
///
/// # Examples
/// ```ignore
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     user_agent: "my-custom-agent/1.0".to_string(),
///     timeout: Duration::from_secs(20),
///     headers: Some(my_custom_headers),
///     max_redirects: 5,
/// })?;
/// ```
pub struct FetcherConfig {
    pub user_agent: String,
    /// Client default, overridden per request by [`RequestSpec::timeout`].
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "link_preview/0.1.0".to_string(),
            timeout: Duration::from_secs(10),
            headers: None,
            max_redirects: 10,
        }
    }
}
