use crate::ad_filter::{AdFilter, PatternAdFilter};
use crate::classifier::{self, HeadDecision};
use crate::fetcher::{RawResponse, RequestSpec, Transport};
use crate::{assembler, charset, decoder, utils};
use crate::{
    Document, Fetcher, MetadataExtractor, PreviewError, PreviewGenerator, PreviewRecord,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Lazy-frame redirects followed per preview. A page still pointing at a
/// frame after that is extracted as it is.
pub const MAX_LAZY_FRAME_HOPS: usize = 1;

enum Step {
    Done(PreviewRecord),
    Follow(String),
}

#[derive(Clone)]
pub struct UrlPreviewGenerator {
    transport: Arc<dyn Transport>,
    ad_filter: Arc<dyn AdFilter>,
    extractor: MetadataExtractor,
}

impl Default for UrlPreviewGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlPreviewGenerator {
    pub fn new() -> Self {
        Self::new_with_fetcher(Fetcher::new())
    }

    pub fn new_with_fetcher(fetcher: Fetcher) -> Self {
        Self::with_transport(Arc::new(fetcher), Arc::new(PatternAdFilter::new()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, ad_filter: Arc<dyn AdFilter>) -> Self {
        Self {
            transport,
            ad_filter,
            extractor: MetadataExtractor::new(),
        }
    }

    /// One transport round trip, ending in a record or a frame to follow.
    async fn run_once(&self, request: &RequestSpec, may_follow: bool) -> Step {
        let requested = request.requested_url();

        if let Err(e) = Url::parse(&request.url) {
            PreviewError::from(e).log();
            return Step::Done(assembler::failed(requested, None));
        }

        let pending = match self.transport.begin(request).await {
            Ok(pending) => pending,
            Err(e) => {
                e.log();
                let host = utils::pickup_host_from_url(&request.url);
                return Step::Done(assembler::failed(requested, host));
            }
        };

        let host = pending.head().host.clone();
        match classifier::classify_head(pending.head()) {
            HeadDecision::Fail(reason) => {
                warn!(url = %request.url, reason = %reason, "Load failed");
                pending.abort();
                return Step::Done(assembler::failed(requested, host));
            }
            HeadDecision::Media(content_type) => {
                pending.abort();
                return Step::Done(assembler::media(
                    requested,
                    &request.url,
                    host,
                    &content_type,
                ));
            }
            HeadDecision::ReadBody => {}
        }

        let response = match pending.finish().await {
            Ok(response) => response,
            Err(e) => {
                e.log();
                return Step::Done(assembler::failed(requested, host));
            }
        };

        if let Err(e) = classifier::check_complete(&response) {
            e.log();
            return Step::Done(assembler::failed(requested, host));
        }

        self.handle_html(request, &response, may_follow)
    }

    // Kept synchronous: the parsed document must not live across an await.
    fn handle_html(&self, request: &RequestSpec, response: &RawResponse, may_follow: bool) -> Step {
        let declared = if request.raw_body {
            charset::resolve_charset(&response.head.headers, &response.body)
        } else {
            None
        };
        let text = decoder::decode_body(&response.body, declared.as_deref());
        let document = Document::parse(&text, &response.head.final_url);

        if may_follow {
            if let Some(target) =
                classifier::lazy_frame_target(&document, &text, &response.head.final_url)
            {
                return Step::Follow(target);
            }
        }

        let metadata = self.extractor.extract(&document, self.ad_filter.as_ref());
        Step::Done(assembler::page(
            request.requested_url(),
            response.head.host.clone(),
            metadata,
        ))
    }
}

#[async_trait]
impl PreviewGenerator for UrlPreviewGenerator {
    #[instrument(level = "debug", skip(self, request), fields(url = %request.url))]
    async fn generate_preview(&self, request: RequestSpec) -> PreviewRecord {
        let mut request = request;
        let mut hops = 0;

        loop {
            match self.run_once(&request, hops < MAX_LAZY_FRAME_HOPS).await {
                Step::Done(record) => {
                    debug!(
                        url = %record.url,
                        load_failed = record.load_failed,
                        media_type = %record.media_type,
                        "Preview ready"
                    );
                    return record;
                }
                Step::Follow(target) => {
                    debug!(from = %request.url, to = %target, "Following lazy frame");
                    request = request.redirected_to(target);
                    hops += 1;
                }
            }
        }
    }
}
