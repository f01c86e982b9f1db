//! Application state management.
//!
//! One session: one canvas, one slot holding the last encoded frame, one
//! device. Every user action goes through a method here.

use anyhow::Result;
use espframe_client::{DeviceClient, DeviceReply, SessionClock};
use espframe_image::{acquire, convert, Bitmap565, CanvasSurface, SelectedFile};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

/// Why a user action produced no device reply.
#[derive(Error, Debug)]
pub enum ActionError {
    /// Upload requested before any image was converted.
    #[error("Upload an image first.")]
    NoBufferReady,

    /// The chosen file is not a usable image.
    #[error("Could not use image: {0}")]
    Decode(#[from] espframe_image::Error),

    /// The device could not be reached.
    #[error("Failed to send: {0}")]
    Transport(#[from] espframe_client::Error),

    /// The browser sent a malformed form.
    #[error("Invalid form data: {0}")]
    Form(String),

    /// A background task died.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Shared application state.
pub struct AppState {
    /// Configuration
    config: Config,

    /// Device HTTP client
    device: DeviceClient,

    /// Clock for time sync requests
    clock: SessionClock,

    /// Staging canvas, also the live preview
    canvas: Mutex<CanvasSurface>,

    /// Last encoded frame, replaced whole on each conversion
    bitmap: RwLock<Option<Arc<Bitmap565>>>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: Config) -> Result<Self> {
        let device = DeviceClient::new(&config.device.url)?;
        info!("Target device: {}", device.base_url());

        Ok(Self {
            config,
            device,
            clock: SessionClock::new(),
            canvas: Mutex::new(CanvasSurface::new()),
            bitmap: RwLock::new(None),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the device base URL.
    pub fn device_url(&self) -> String {
        self.device.base_url().to_string()
    }

    /// Returns true once a frame is ready for upload.
    pub fn has_bitmap(&self) -> bool {
        self.bitmap.read().unwrap().is_some()
    }

    /// Returns the current frame, if any.
    pub fn bitmap(&self) -> Option<Arc<Bitmap565>> {
        self.bitmap.read().unwrap().clone()
    }

    /// Decodes, rasterizes and encodes the user's selection.
    ///
    /// Returns `Ok(false)` when nothing was selected. On failure the previous
    /// frame and preview are kept.
    pub async fn select_image(
        self: &Arc<Self>,
        selection: Option<SelectedFile>,
    ) -> Result<bool, ActionError> {
        let state = Arc::clone(self);
        let converted = tokio::task::spawn_blocking(move || -> espframe_image::Result<bool> {
            let Some(image) = acquire(selection)? else {
                return Ok(false);
            };
            let mut canvas = state.canvas.lock().unwrap();
            let bitmap = convert(image, &mut canvas)?;
            // Slot changes under the canvas guard so preview and frame agree
            *state.bitmap.write().unwrap() = Some(Arc::new(bitmap));
            Ok(true)
        })
        .await
        .map_err(|e| ActionError::Internal(e.to_string()))?;

        converted.map_err(|e| {
            warn!("Image rejected: {}", e);
            e.into()
        })
    }

    /// Sends the current frame to the device.
    pub async fn upload(&self) -> Result<DeviceReply, ActionError> {
        // Take the Arc and drop the guard before awaiting
        let Some(bitmap) = self.bitmap() else {
            info!("Upload requested with no image converted");
            return Err(ActionError::NoBufferReady);
        };

        self.device.upload(&bitmap).await.map_err(|e| {
            warn!("Upload failed: {}", e);
            ActionError::Transport(e)
        })
    }

    /// Sets the device clock to the current time.
    pub async fn sync_time(&self) -> Result<(i64, DeviceReply), ActionError> {
        let now_ms = self.clock.now_ms();
        let reply = self.device.sync_time(now_ms).await.map_err(|e| {
            warn!("Time sync failed: {}", e);
            ActionError::Transport(e)
        })?;
        Ok((now_ms, reply))
    }

    /// Returns the current canvas as PNG bytes.
    pub async fn preview_png(self: &Arc<Self>) -> Result<Vec<u8>, ActionError> {
        let state = Arc::clone(self);
        let encoded = tokio::task::spawn_blocking(move || state.canvas.lock().unwrap().to_png())
            .await
            .map_err(|e| ActionError::Internal(e.to_string()))?;
        Ok(encoded?)
    }
}
