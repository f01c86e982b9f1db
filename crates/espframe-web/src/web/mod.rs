//! Web UI module.

use askama::Template;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use espframe_client::DeviceReply;
use espframe_image::{SelectedFile, PIXEL_COUNT};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::{ActionError, AppState};

/// Page script, compiled in so the UI needs no network beyond the daemon.
const PAGE_SCRIPT: &str = include_str!("../../static/espframe.js");

/// Main index page template.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    device_url: String,
}

/// Status partial template.
#[derive(Template)]
#[template(path = "partials/status.html")]
struct StatusTemplate {
    ready: bool,
    device_url: String,
}

/// Preview partial template.
#[derive(Template)]
#[template(path = "partials/preview.html")]
struct PreviewTemplate {
    timestamp: u128,
    pixels: usize,
}

/// Outcome message partial template.
#[derive(Template)]
#[template(path = "partials/notice.html")]
struct NoticeTemplate {
    kind: &'static str,
    text: String,
}

impl NoticeTemplate {
    /// Device replies are echoed verbatim, whatever they say.
    fn reply(reply: &DeviceReply) -> Self {
        Self {
            kind: "reply",
            text: format!("Response: {}", reply.body),
        }
    }

    fn error(err: &ActionError) -> Self {
        let kind = match err {
            ActionError::NoBufferReady => "prompt",
            ActionError::Transport(_) => "transport-failure",
            ActionError::Decode(e) if e.is_decode_failure() => "decode-failure",
            ActionError::Decode(_) | ActionError::Form(_) | ActionError::Internal(_) => "error",
        };
        Self {
            kind,
            text: err.to_string(),
        }
    }
}

/// Creates the web router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_image_bytes = state.config().web.max_image_bytes;

    Router::new()
        // Main page
        .route("/", get(index))
        .route("/static/espframe.js", get(page_script))
        // Canvas preview image
        .route("/preview.png", get(preview_png))
        // Partials
        .route("/status", get(status))
        .route("/preview", get(preview_get))
        // Actions
        .route(
            "/image",
            post(image_select).layer(DefaultBodyLimit::max(max_image_bytes)),
        )
        .route("/upload", post(upload))
        .route("/sync-time", post(sync_time))
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

/// Renders a template, turning template errors into a 500.
fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render template: {}", e),
        )
            .into_response(),
    }
}

/// Renders an error notice into the notice area, whatever the request target.
fn notice_error(err: &ActionError) -> Response {
    let mut response = render(NoticeTemplate::error(err));
    response.headers_mut().insert(
        header::HeaderName::from_static("x-target"),
        header::HeaderValue::from_static("#notice"),
    );
    response
}

fn timestamp() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// GET / - Main page
async fn index(State(state): State<Arc<AppState>>) -> Response {
    render(IndexTemplate {
        device_url: state.device_url(),
    })
}

/// GET /static/espframe.js - Page script
async fn page_script() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        PAGE_SCRIPT,
    )
        .into_response()
}

/// GET /preview.png - Canvas as PNG
async fn preview_png(State(state): State<Arc<AppState>>) -> Response {
    match state.preview_png().await {
        Ok(png_data) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            png_data,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to generate PNG: {}", e),
        )
            .into_response(),
    }
}

/// GET /status - Readiness partial
async fn status(State(state): State<Arc<AppState>>) -> Response {
    render(StatusTemplate {
        ready: state.has_bitmap(),
        device_url: state.device_url(),
    })
}

/// GET /preview - Preview image partial
async fn preview_get(State(state): State<Arc<AppState>>) -> Response {
    let pixels = state.bitmap().map(|b| b.len()).unwrap_or(0);
    render(PreviewTemplate {
        timestamp: timestamp(),
        pixels,
    })
}

/// Pulls the `file` part out of the form, if the browser sent one.
async fn read_selection(multipart: &mut Multipart) -> Result<Option<SelectedFile>, ActionError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ActionError::Form(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ActionError::Form(e.to_string()))?;
        return Ok(Some(SelectedFile::new(name, bytes.to_vec())));
    }
    Ok(None)
}

/// POST /image - Convert the chosen file
async fn image_select(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let selection = match read_selection(&mut multipart).await {
        Ok(selection) => selection,
        Err(e) => {
            warn!("Bad image form: {}", e);
            return notice_error(&e);
        }
    };

    match state.select_image(selection).await {
        Ok(true) => render(PreviewTemplate {
            timestamp: timestamp(),
            pixels: PIXEL_COUNT,
        }),
        // Nothing chosen: leave the page as it is
        Ok(false) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => notice_error(&e),
    }
}

/// POST /upload - Send the frame to the device
async fn upload(State(state): State<Arc<AppState>>) -> Response {
    match state.upload().await {
        Ok(reply) => render(NoticeTemplate::reply(&reply)),
        Err(e) => notice_error(&e),
    }
}

/// POST /sync-time - Set the device clock
async fn sync_time(State(state): State<Arc<AppState>>) -> Response {
    match state.sync_time().await {
        Ok((_, reply)) => render(NoticeTemplate::reply(&reply)),
        Err(e) => notice_error(&e),
    }
}
