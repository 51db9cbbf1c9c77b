use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, WindowError};
use crate::lifecycle::Lifecycle;
use crate::owner::WindowOwner;
use crate::runtime::{OpenRequest, Runtime, UiMessage, WindowKey, WindowShared};

/// Parameters for a new window.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Client-area width in pixels.
    pub width: u32,
    /// Client-area height in pixels.
    pub height: u32,
    pub title: String,
    /// How long to wait for the UI thread to create the native window.
    /// `None` waits forever.
    pub ready_timeout: Option<Duration>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 600,
            height: 600,
            title: "LiteDraw".to_owned(),
            ready_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Ask `runtime` for a window and return once it answers marshaled calls.
///
/// The window is registered with `lifecycle` only after its native handle
/// exists, so a failed creation never counts as a closed window.
pub fn open_window(
    runtime: Arc<dyn Runtime>,
    lifecycle: Arc<Lifecycle>,
    config: WindowConfig,
) -> Result<WindowOwner> {
    let shared = Arc::new(WindowShared::new(config.width, config.height)?);
    let key = WindowKey::next();
    let (reply_tx, reply_rx) = mpsc::sync_channel(1);

    debug!(?key, width = config.width, height = config.height, "opening window");
    runtime.post(UiMessage::Open(OpenRequest {
        key,
        config: config.clone(),
        shared: Arc::clone(&shared),
        lifecycle,
        reply: reply_tx,
    }))?;

    let reply = match config.ready_timeout {
        Some(limit) => reply_rx.recv_timeout(limit).map_err(|_| {
            WindowError::CreationFailed(format!("no answer from the UI thread within {limit:?}"))
        })?,
        None => reply_rx
            .recv()
            .map_err(|_| WindowError::CreationFailed("UI thread went away".into()))?,
    };
    let ui_thread = reply?;

    let owner = WindowOwner::new(
        key,
        runtime,
        shared,
        ui_thread,
        (config.width, config.height),
        config.title,
        config.ready_timeout,
    );
    owner.wait_until_ready()?;
    Ok(owner)
}
