//! In-process HTTP server serving generated images and a fake results page

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-route request counters
#[derive(Default)]
pub struct Hits {
    pub flaky: AtomicUsize,
    pub unavailable: AtomicUsize,
    pub garbage: AtomicUsize,
    pub once: AtomicUsize,
}

#[derive(Clone)]
struct ServerState {
    base: String,
    hits: Arc<Hits>,
}

pub struct TestServer {
    pub base: String,
    pub hits: Arc<Hits>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

fn image_response(content_type: &'static str, body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

fn jpeg(width: u32, height: u32) -> Response {
    image_response(
        "image/jpeg",
        encode(&DynamicImage::new_rgb8(width, height), ImageFormat::Jpeg),
    )
}

async fn photo() -> Response {
    jpeg(100, 100)
}

async fn large_png() -> Response {
    image_response(
        "image/png",
        encode(&DynamicImage::new_rgba8(640, 480), ImageFormat::Png),
    )
}

async fn small_png() -> Response {
    image_response(
        "image/png",
        encode(&DynamicImage::new_rgba8(99, 120), ImageFormat::Png),
    )
}

async fn gif() -> Response {
    image_response(
        "image/gif",
        encode(&DynamicImage::new_rgba8(200, 200), ImageFormat::Gif),
    )
}

async fn mislabeled() -> Response {
    let body = encode(&DynamicImage::new_rgb8(300, 300), ImageFormat::Jpeg);
    ([(header::CONTENT_TYPE, "text/html")], body).into_response()
}

async fn missing() -> Response {
    (StatusCode::NOT_FOUND, "not here").into_response()
}

async fn garbage(State(state): State<ServerState>) -> Response {
    state.hits.garbage.fetch_add(1, Ordering::SeqCst);
    image_response("image/jpeg", b"this is not a jpeg".to_vec())
}

async fn unavailable(State(state): State<ServerState>) -> Response {
    state.hits.unavailable.fetch_add(1, Ordering::SeqCst);
    (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response()
}

/// Fails twice, then serves a PNG with alpha
async fn flaky(State(state): State<ServerState>) -> Response {
    let hit = state.hits.flaky.fetch_add(1, Ordering::SeqCst);
    if hit < 2 {
        return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
    }
    image_response(
        "image/png",
        encode(&DynamicImage::new_rgba8(150, 150), ImageFormat::Png),
    )
}

/// Serves an image to the first request only
async fn once(State(state): State<ServerState>) -> Response {
    if state.hits.once.fetch_add(1, Ordering::SeqCst) == 0 {
        return jpeg(200, 200);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "gone").into_response()
}

async fn search_page(State(state): State<ServerState>) -> Response {
    let base = &state.base;
    let html = format!(
        r#"<html><body>
            <img src="/static/logo.png">
            <img src="{base}/photo.jpg">
            <img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">
            <img src="{base}/small.png">
            <img src="{base}/large.png">
            <img src="{base}/missing.jpg">
        </body></html>"#
    );
    ([(header::CONTENT_TYPE, "text/html")], html).into_response()
}

async fn degraded_page(State(state): State<ServerState>) -> Response {
    let base = &state.base;
    let html = format!(
        r#"<html><body>
            <img src="{base}/photo.jpg">
            <img src="{base}/once.jpg">
        </body></html>"#
    );
    ([(header::CONTENT_TYPE, "text/html")], html).into_response()
}

async fn broken_page() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "search is down").into_response()
}

/// Bind to an ephemeral port and serve until the test runtime shuts down
pub async fn spawn() -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    let hits = Arc::new(Hits::default());

    let state = ServerState {
        base: base.clone(),
        hits: hits.clone(),
    };

    let app = Router::new()
        .route("/photo.jpg", get(photo))
        .route("/large.png", get(large_png))
        .route("/small.png", get(small_png))
        .route("/anim.gif", get(gif))
        .route("/mislabeled.jpg", get(mislabeled))
        .route("/missing.jpg", get(missing))
        .route("/garbage.jpg", get(garbage))
        .route("/unavailable.jpg", get(unavailable))
        .route("/flaky.png", get(flaky))
        .route("/once.jpg", get(once))
        .route("/search", get(search_page))
        .route("/degraded", get(degraded_page))
        .route("/broken", get(broken_page))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });

    TestServer { base, hits }
}

/// An address nothing listens on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/photo.jpg", addr)
}
