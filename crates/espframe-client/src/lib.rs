//! HTTP client for the espframe device.
//!
//! The device exposes two endpoints: `/upload` takes a raw RGB565 frame and
//! `/settime` takes the current epoch time as a form field. Both answer with
//! a plain-text status that is passed through untouched.

mod clock;
mod error;

pub use clock::SessionClock;
pub use error::{Error, Result};

use espframe_image::Bitmap565;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Body, Url};
use tracing::{debug, info, warn};

/// Address of the device on its own access point.
pub const DEFAULT_DEVICE_URL: &str = "http://192.168.4.1";

/// Frame upload endpoint.
pub const UPLOAD_PATH: &str = "/upload";

/// Clock set endpoint.
pub const SETTIME_PATH: &str = "/settime";

const OCTET_STREAM: &str = "application/octet-stream";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// What the device answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReply {
    /// HTTP status code, informational only.
    pub status: u16,
    /// Response body, shown to the user as-is.
    pub body: String,
}

/// HTTP client for a single device.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base: Url,
}

impl DeviceClient {
    /// Creates a client for the device at the default address.
    pub fn default_device() -> Result<Self> {
        Self::new(DEFAULT_DEVICE_URL)
    }

    /// Creates a client for the device at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidAddress {
            url: base_url.to_string(),
            reason,
        };

        let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        if base.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        let http = reqwest::Client::builder().build().map_err(Error::Client)?;
        debug!("Device client targeting {}", base);

        Ok(Self { http, base })
    }

    /// Returns the device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Sends a frame to the device in a single request.
    pub async fn upload(&self, bitmap: &Bitmap565) -> Result<DeviceReply> {
        let body = bitmap.to_bytes();
        info!("Uploading {} bytes to device", body.len());
        self.post(UPLOAD_PATH, OCTET_STREAM, body).await
    }

    /// Sets the device clock to `epoch_ms` milliseconds since the Unix epoch.
    pub async fn sync_time(&self, epoch_ms: i64) -> Result<DeviceReply> {
        info!("Synchronising device time to {}", epoch_ms);
        self.post(SETTIME_PATH, FORM_URLENCODED, format!("t={}", epoch_ms))
            .await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| Error::InvalidAddress {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    async fn post(
        &self,
        path: &str,
        content_type: &'static str,
        body: impl Into<Body>,
    ) -> Result<DeviceReply> {
        let url = self.endpoint(path)?;
        let transport = |source| Error::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let text = response.text().await.map_err(transport)?;

        if status.is_success() {
            debug!("{} answered {}: {}", url, status, text);
        } else {
            warn!("{} answered {}: {}", url, status, text);
        }

        Ok(DeviceReply {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode, Uri},
        routing::post,
        Router,
    };
    use espframe_image::{FRAME_BYTES, PIXEL_COUNT};
    use std::sync::{Arc, Mutex};

    /// A request as seen by the fake device: path, content type, body.
    type Seen = (String, String, Vec<u8>);

    #[derive(Clone)]
    struct FakeDevice {
        seen: Arc<Mutex<Vec<Seen>>>,
        status: StatusCode,
        reply: &'static str,
    }

    async fn record(
        State(device): State<FakeDevice>,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, &'static str) {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        device
            .seen
            .lock()
            .unwrap()
            .push((uri.path().to_string(), content_type, body.to_vec()));
        (device.status, device.reply)
    }

    async fn spawn_device(status: StatusCode, reply: &'static str) -> (String, FakeDevice) {
        let device = FakeDevice {
            seen: Arc::new(Mutex::new(Vec::new())),
            status,
            reply,
        };
        let app = Router::new()
            .route("/upload", post(record))
            .route("/settime", post(record))
            .with_state(device.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), device)
    }

    async fn refused_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert!(matches!(
            DeviceClient::new("not a url"),
            Err(Error::InvalidAddress { .. })
        ));
        assert!(matches!(
            DeviceClient::new("ftp://192.168.4.1"),
            Err(Error::InvalidAddress { .. })
        ));
        let client = DeviceClient::default_device().unwrap();
        assert_eq!(client.base_url().as_str(), "http://192.168.4.1/");
    }

    #[tokio::test]
    async fn test_upload_sends_raw_frame() {
        let (url, device) = spawn_device(StatusCode::OK, "Upload OK").await;
        let client = DeviceClient::new(&url).unwrap();

        let reply = client.upload(&Bitmap565::solid(0xF800)).await.unwrap();
        assert_eq!(reply.body, "Upload OK");
        assert_eq!(reply.status, 200);

        let seen = device.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (path, content_type, body) = &seen[0];
        assert_eq!(path, "/upload");
        assert_eq!(content_type, "application/octet-stream");
        assert_eq!(body.len(), FRAME_BYTES);
        assert_eq!(body.len(), 2 * PIXEL_COUNT);
        assert!(body
            .chunks_exact(2)
            .all(|px| u16::from_le_bytes([px[0], px[1]]) == 0xF800));
    }

    #[tokio::test]
    async fn test_device_error_is_passed_through() {
        let (url, _device) =
            spawn_device(StatusCode::INTERNAL_SERVER_ERROR, "Flash write failed").await;
        let client = DeviceClient::new(&url).unwrap();

        let reply = client.upload(&Bitmap565::solid(0)).await.unwrap();
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, "Flash write failed");
    }

    #[tokio::test]
    async fn test_sync_time_sends_form_field() {
        let (url, device) = spawn_device(StatusCode::OK, "Time set").await;
        let client = DeviceClient::new(&url).unwrap();
        let clock = SessionClock::new();

        let first = clock.now_ms();
        client.sync_time(first).await.unwrap();
        let second = clock.now_ms();
        let reply = client.sync_time(second).await.unwrap();
        assert_eq!(reply.body, "Time set");

        let seen = device.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let sent: Vec<i64> = seen
            .iter()
            .map(|(path, content_type, body)| {
                assert_eq!(path, "/settime");
                assert_eq!(content_type, "application/x-www-form-urlencoded");
                let body = std::str::from_utf8(body).unwrap();
                body.strip_prefix("t=").unwrap().parse().unwrap()
            })
            .collect();
        assert_eq!(sent, vec![first, second]);
        assert!(sent[1] >= sent[0]);
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct() {
        let client = DeviceClient::new(&refused_url().await).unwrap();

        let err = client.upload(&Bitmap565::solid(0)).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));

        let err = client.sync_time(0).await.unwrap_err();
        match err {
            Error::Transport { url, .. } => assert!(url.ends_with("/settime")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
