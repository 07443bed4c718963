use crate::ad_filter::{AdFilter, PatternAdFilter};
use crate::fetcher::{RequestSpec, Transport};
use crate::{assembler, utils};
use crate::{Fetcher, PreviewGenerator, PreviewRecord, UrlPreviewGenerator};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

/// PreviewService bounds how many previews are generated at once and offers
/// batch generation on top of [`UrlPreviewGenerator`].
#[derive(Clone)]
pub struct PreviewService {
    pub generator: Arc<UrlPreviewGenerator>,
    // Max Concurrent Requests
    semaphore: Arc<Semaphore>,
}

pub const MAX_CONCURRENT_REQUESTS: usize = 500;

impl Default for PreviewService {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewService {
    pub fn new() -> Self {
        Self::new_with_config(PreviewServiceConfig::new())
    }

    pub fn new_with_config(config: PreviewServiceConfig) -> Self {
        debug!(
            max_concurrent_requests = config.max_concurrent_requests,
            "Initializing PreviewService"
        );

        let transport = config
            .transport
            .unwrap_or_else(|| Arc::new(Fetcher::new()));
        let ad_filter = config
            .ad_filter
            .unwrap_or_else(|| Arc::new(PatternAdFilter::new()));

        Self {
            generator: Arc::new(UrlPreviewGenerator::with_transport(transport, ad_filter)),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
        }
    }

    /// Preview `url` with default request options.
    pub async fn generate_preview(&self, url: &str) -> PreviewRecord {
        self.generate_preview_with_spec(RequestSpec::from(url)).await
    }

    #[instrument(level = "debug", skip(self, request), fields(url = %request.url))]
    pub async fn generate_preview_with_spec(&self, request: RequestSpec) -> PreviewRecord {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!(error = %e, "Concurrency limiter closed");
                let host = utils::pickup_host_from_url(&request.url);
                return assembler::failed(request.requested_url(), host);
            }
        };

        self.generator.generate_preview(request).await
    }

    /// Preview every URL concurrently; records come back in input order.
    pub async fn generate_previews(&self, urls: &[&str]) -> Vec<PreviewRecord> {
        let futures: Vec<_> = urls.iter().map(|url| self.generate_preview(url)).collect();
        futures::future::join_all(futures).await
    }
}

pub struct PreviewServiceConfig {
    pub max_concurrent_requests: usize,
    pub transport: Option<Arc<dyn Transport>>,
    pub ad_filter: Option<Arc<dyn AdFilter>>,
}

impl Default for PreviewServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewServiceConfig {
    pub fn new() -> Self {
        Self {
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
            transport: None,
            ad_filter: None,
        }
    }

    pub fn with_fetcher(self, fetcher: Fetcher) -> Self {
        self.with_transport(Arc::new(fetcher))
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_ad_filter(mut self, ad_filter: Arc<dyn AdFilter>) -> Self {
        self.ad_filter = Some(ad_filter);
        self
    }

    pub fn with_max_concurrent_requests(mut self, max_concurrent_requests: usize) -> Self {
        self.max_concurrent_requests = max_concurrent_requests;
        self
    }
}
