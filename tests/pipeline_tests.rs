use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use link_preview::{
    NoAdFilter, PendingResponse, PreviewError, PreviewGenerator, PreviewService,
    PreviewServiceConfig, RawResponse, RequestSpec, ResponseHead, Transport, UrlPreviewGenerator,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Begin(String),
    Finish(String),
    Abort(String),
}

#[derive(Clone)]
struct Route {
    head: ResponseHead,
    body: Vec<u8>,
}

/// In-memory transport answering from a fixed route table and recording
/// every checkpoint it goes through.
#[derive(Clone, Default)]
struct ScriptedTransport {
    routes: HashMap<String, Route>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl ScriptedTransport {
    fn route(self, url: &str, status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
        let host = url::Url::parse(url).unwrap().host_str().unwrap().to_string();
        self.route_served_by(url, url, &host, status, content_type, body)
    }

    fn route_served_by(
        mut self,
        url: &str,
        final_url: &str,
        host: &str,
        status: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Self {
        let mut headers = HashMap::new();
        if let Some(content_type) = content_type {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
        self.routes.insert(
            url.to_string(),
            Route {
                head: ResponseHead {
                    status,
                    headers,
                    final_url: final_url.to_string(),
                    host: Some(host.to_string()),
                },
                body: body.to_vec(),
            },
        );
        self
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn generator(&self) -> UrlPreviewGenerator {
        UrlPreviewGenerator::with_transport(Arc::new(self.clone()), Arc::new(NoAdFilter))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn begin(&self, request: &RequestSpec) -> Result<Box<dyn PendingResponse>, PreviewError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Begin(request.url.clone()));

        let route = self
            .routes
            .get(&request.url)
            .cloned()
            .ok_or_else(|| PreviewError::FetchError(format!("connection refused: {}", request.url)))?;

        Ok(Box::new(ScriptedPending {
            url: request.url.clone(),
            route,
            events: self.events.clone(),
        }))
    }
}

struct ScriptedPending {
    url: String,
    route: Route,
    events: Arc<Mutex<Vec<Event>>>,
}

#[async_trait]
impl PendingResponse for ScriptedPending {
    fn head(&self) -> &ResponseHead {
        &self.route.head
    }

    async fn finish(self: Box<Self>) -> Result<RawResponse, PreviewError> {
        let ScriptedPending { url, route, events } = *self;
        events.lock().unwrap().push(Event::Finish(url));
        Ok(RawResponse {
            head: route.head,
            body: route.body,
        })
    }

    fn abort(self: Box<Self>) {
        self.events.lock().unwrap().push(Event::Abort(self.url.clone()));
    }
}

const HTML: Option<&str> = Some("text/html; charset=utf-8");

#[tokio::test]
async fn test_og_title_wins_over_title_element() {
    let transport = ScriptedTransport::default().route(
        "https://example.com/post",
        200,
        HTML,
        br#"<html><head>
            <title>Document Title</title>
            <meta property="title" content="Meta Title">
            <meta property="og:title" content="Open Graph Title">
            <meta name="description" content="About the post">
            <meta name="keywords" content="a, b">
        </head></html>"#,
    );

    let record = transport
        .generator()
        .generate_preview("https://example.com/post".into())
        .await;

    assert!(!record.load_failed);
    assert_eq!(record.title, "Open Graph Title");
    assert_eq!(record.description, "About the post");
    assert_eq!(record.keywords, vec!["a", "b"]);
    assert_eq!(record.content_type, "text/html");
    assert_eq!(record.media_type, "website");
    assert_eq!(record.images, Some(vec![]));
    assert_eq!(record.videos, None);
    assert_eq!(record.host.as_deref(), Some("example.com"));
}

#[tokio::test]
async fn test_title_element_fallback() {
    let transport = ScriptedTransport::default().route(
        "https://example.com/",
        200,
        HTML,
        b"<html><head><title>Example</title></head><body></body></html>",
    );
    let record = transport
        .generator()
        .generate_preview("https://example.com/".into())
        .await;
    assert_eq!(record.title, "Example");
}

#[tokio::test]
async fn test_non_200_and_empty_body_fail_regardless_of_headers() {
    let transport = ScriptedTransport::default()
        .route("https://example.com/500", 500, HTML, b"<title>oops</title>")
        .route("https://example.com/404.png", 404, Some("image/png"), b"png")
        .route("https://example.com/empty", 200, HTML, b"");
    let generator = transport.generator();

    for url in [
        "https://example.com/500",
        "https://example.com/404.png",
        "https://example.com/empty",
    ] {
        let record = generator.generate_preview(url.into()).await;
        assert!(record.load_failed, "{url} should fail");
        assert_eq!(record.url, url);
        assert!(record.title.is_empty());
        assert!(record.description.is_empty());
        assert!(record.keywords.is_empty());
        assert!(record.content_type.is_empty());
        assert_eq!(record.media_type, "website");
        assert_eq!(record.images, None);
        assert_eq!(record.videos, None);
        assert_eq!(record.audios, None);
        assert_eq!(record.host.as_deref(), Some("example.com"));
    }
}

#[tokio::test]
async fn test_transport_error_degrades_to_failed_record() {
    let transport = ScriptedTransport::default();
    let record = transport
        .generator()
        .generate_preview("https://unreachable.example.org:8443/x".into())
        .await;

    assert!(record.load_failed);
    assert_eq!(record.host.as_deref(), Some("unreachable.example.org:8443"));
}

#[tokio::test]
async fn test_malformed_url_fails_without_touching_transport() {
    let transport = ScriptedTransport::default();
    let record = transport
        .generator()
        .generate_preview("not a url".into())
        .await;

    assert!(record.load_failed);
    assert_eq!(record.url, "not a url");
    assert_eq!(record.host, None);
    assert!(transport.events().is_empty());
}

#[tokio::test]
async fn test_non_http_frame_src_extracts_page_itself() {
    let page = br#"<html><head><title>Shell</title></head>
        <frameset><frame id="mainFrame" src="javascript:void(0)"></frameset></html>"#;
    let transport = ScriptedTransport::default().route(
        "https://blog.example.com/user/1",
        200,
        Some("text/html; charset=utf-8"),
        page,
    );
    let record = transport
        .generator()
        .generate_preview("https://blog.example.com/user/1".into())
        .await;

    assert!(!record.load_failed);
    assert_eq!(record.title, "Shell");
    assert_eq!(
        transport.events(),
        vec![
            Event::Begin("https://blog.example.com/user/1".into()),
            Event::Finish("https://blog.example.com/user/1".into()),
        ]
    );
}

#[tokio::test]
async fn test_ms949_charset_decodes_as_windows_949() {
    let mut body = b"<html><head><title>".to_vec();
    body.extend_from_slice(&[0xBE, 0xC8, 0xB3, 0xE7]);
    body.extend_from_slice(b"</title></head></html>");

    let transport = ScriptedTransport::default().route(
        "https://blog.example.kr/",
        200,
        Some("text/html; charset=ms949"),
        &body,
    );
    let record = transport
        .generator()
        .generate_preview("https://blog.example.kr/".into())
        .await;

    assert!(!record.load_failed);
    assert_eq!(record.title, "안녕");
}

#[tokio::test]
async fn test_meta_charset_declaration_used() {
    let mut body =
        br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=iso-8859-1"><title>caf"#
            .to_vec();
    body.push(0xE9);
    body.extend_from_slice(b"</title></head></html>");

    let transport =
        ScriptedTransport::default().route("https://example.fr/", 200, Some("text/html"), &body);
    let record = transport
        .generator()
        .generate_preview("https://example.fr/".into())
        .await;
    assert_eq!(record.title, "café");
}

#[tokio::test]
async fn test_undeclared_charset_falls_back_to_utf8() {
    let transport = ScriptedTransport::default().route(
        "https://example.com/",
        200,
        Some("text/html"),
        "<title>naïve ✓</title>".as_bytes(),
    );
    let record = transport
        .generator()
        .generate_preview("https://example.com/".into())
        .await;
    assert_eq!(record.title, "naïve ✓");
}

#[tokio::test]
async fn test_raw_body_off_ignores_declared_charset() {
    let transport = ScriptedTransport::default().route(
        "https://example.com/",
        200,
        Some("text/html; charset=iso-8859-1"),
        "<title>naïve</title>".as_bytes(),
    );
    let record = transport
        .generator()
        .generate_preview(RequestSpec::new("https://example.com/").with_raw_body(false))
        .await;
    assert_eq!(record.title, "naïve");
}

#[tokio::test]
async fn test_direct_image_skips_html_path() {
    let transport = ScriptedTransport::default().route(
        "https://cdn.example.com/cat.png",
        200,
        Some("image/png"),
        b"\x89PNG",
    );
    let record = transport
        .generator()
        .generate_preview("https://cdn.example.com/cat.png".into())
        .await;

    assert!(!record.load_failed);
    assert_eq!(record.media_type, "photo");
    assert_eq!(record.content_type, "image/png");
    assert_eq!(
        record.images,
        Some(vec!["https://cdn.example.com/cat.png".to_string()])
    );
    assert_eq!(
        transport.events(),
        vec![
            Event::Begin("https://cdn.example.com/cat.png".into()),
            Event::Abort("https://cdn.example.com/cat.png".into()),
        ]
    );
}

#[tokio::test]
async fn test_direct_non_image_media() {
    let transport = ScriptedTransport::default().route(
        "https://example.com/report.pdf",
        200,
        Some("application/pdf"),
        b"%PDF",
    );
    let record = transport
        .generator()
        .generate_preview("https://example.com/report.pdf".into())
        .await;

    assert!(!record.load_failed);
    assert_eq!(record.content_type, "application/pdf");
    assert_eq!(record.media_type, "website");
    assert_eq!(record.images, None);
}

#[tokio::test]
async fn test_lazy_frame_followed_once() {
    let transport = ScriptedTransport::default()
        .route(
            "https://blog.example.com/user",
            200,
            HTML,
            br#"<html><frameset><frame id="mainFrame" src="/real"></frameset></html>"#,
        )
        .route_served_by(
            "https://blog.example.com/real",
            "https://post.example.com/real",
            "post.example.com",
            200,
            HTML,
            br#"<html><head><meta property="og:title" content="The Real Post">
                <meta property="og:image" content="/cover.jpg"></head></html>"#,
        );

    let record = transport
        .generator()
        .generate_preview("https://blog.example.com/user".into())
        .await;

    assert_eq!(record.url, "https://blog.example.com/user");
    assert_eq!(record.host.as_deref(), Some("post.example.com"));
    assert_eq!(record.title, "The Real Post");
    assert_eq!(
        record.images,
        Some(vec!["https://post.example.com/cover.jpg".to_string()])
    );
    assert_eq!(
        transport.events(),
        vec![
            Event::Begin("https://blog.example.com/user".into()),
            Event::Finish("https://blog.example.com/user".into()),
            Event::Begin("https://blog.example.com/real".into()),
            Event::Finish("https://blog.example.com/real".into()),
        ]
    );
}

#[tokio::test]
async fn test_lazy_frame_hops_are_bounded() {
    let transport = ScriptedTransport::default()
        .route(
            "https://loop.example.com/a",
            200,
            HTML,
            br#"<frameset><frame id="mainFrame" src="/b"></frameset>"#,
        )
        .route(
            "https://loop.example.com/b",
            200,
            HTML,
            br#"<head><title>B</title></head><frameset><frame id="mainFrame" src="/a"></frameset>"#,
        );

    let record = transport
        .generator()
        .generate_preview("https://loop.example.com/a".into())
        .await;

    assert!(!record.load_failed);
    assert_eq!(record.url, "https://loop.example.com/a");
    assert_eq!(record.title, "B");
    let begins = transport
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Begin(_)))
        .count();
    assert_eq!(begins, 2);
}

#[tokio::test]
async fn test_failed_hop_reports_original_url() {
    let transport = ScriptedTransport::default().route(
        "https://blog.example.com/user",
        200,
        HTML,
        br#"<frameset><frame id="mainFrame" src="/gone"></frameset>"#,
    );
    let record = transport
        .generator()
        .generate_preview("https://blog.example.com/user".into())
        .await;

    assert!(record.load_failed);
    assert_eq!(record.url, "https://blog.example.com/user");
}

#[tokio::test]
async fn test_img_scan_ranking_through_pipeline() {
    let transport = ScriptedTransport::default().route(
        "https://example.com/gallery",
        200,
        HTML,
        br#"<body>
            <img src="a.png" width="600" height="600">
            <img src="b.png" width="800" height="900">
            <img src="c.png" width="1080" height="1080">
            <img src="d.png" width="400" height="400">
        </body>"#,
    );
    let record = transport
        .generator()
        .generate_preview("https://example.com/gallery".into())
        .await;

    assert_eq!(
        record.images,
        Some(vec![
            "https://example.com/b.png".to_string(),
            "https://example.com/a.png".to_string()
        ])
    );
}

#[tokio::test]
async fn test_videos_and_audios_through_pipeline() {
    let transport = ScriptedTransport::default().route(
        "https://video.example.com/watch",
        200,
        HTML,
        br#"<head>
            <meta property="og:type" content="video.movie">
            <meta property="og:video" content="https://video.example.com/player.swf">
            <meta property="og:video:type" content="application/x-shockwave-flash">
            <meta property="og:video" content="https://video.example.com/movie.mp4">
            <meta property="og:video:type" content="video/mp4">
            <meta property="og:audio" content="/track.mp3">
        </head>"#,
    );
    let record = transport
        .generator()
        .generate_preview("https://video.example.com/watch".into())
        .await;

    let videos = record.videos.expect("videos");
    assert_eq!(videos[0].mime_type.as_deref(), Some("video/mp4"));
    assert_eq!(videos[1].mime_type.as_deref(), Some("application/x-shockwave-flash"));
    assert_eq!(record.media_type, "video.movie");
    assert_eq!(
        record.audios,
        Some(vec!["https://video.example.com/track.mp3".to_string()])
    );
}

#[tokio::test]
async fn test_service_batch_keeps_input_order() {
    let transport = ScriptedTransport::default()
        .route("https://one.example.com/", 200, HTML, b"<title>One</title>")
        .route("https://two.example.com/", 200, HTML, b"<title>Two</title>");
    let service = PreviewService::new_with_config(
        PreviewServiceConfig::new()
            .with_transport(Arc::new(transport))
            .with_ad_filter(Arc::new(NoAdFilter))
            .with_max_concurrent_requests(1),
    );

    let records = service
        .generate_previews(&[
            "https://two.example.com/",
            "https://missing.example.com/",
            "https://one.example.com/",
        ])
        .await;

    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.title.as_str(), r.load_failed))
        .collect();
    assert_eq!(summary, vec![("Two", false), ("", true), ("One", false)]);
}
