//! Off-screen runtime: one thread per window, no native window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Once};
use std::thread;

use parking_lot::Mutex;
use tiny_skia::Pixmap;
use tracing::{debug, trace};

use crate::bootstrap::WindowConfig;
use crate::error::{Result, WindowError};
use crate::runtime::{OpenRequest, Runtime, Screen, UiMessage, WindowKey};
use crate::ui;

static CONFIGURE: Once = Once::new();
static THREAD_SEQ: AtomicUsize = AtomicUsize::new(0);

type Senders = Arc<Mutex<HashMap<WindowKey, Sender<UiMessage>>>>;

/// Keeps the last presented frame instead of showing it.
struct HeadlessScreen {
    frame: Option<Pixmap>,
    title: String,
    position: (i32, i32),
    copied: Arc<Mutex<Vec<Pixmap>>>,
}

impl HeadlessScreen {
    fn new(config: &WindowConfig, copied: Arc<Mutex<Vec<Pixmap>>>) -> Self {
        HeadlessScreen {
            frame: None,
            title: config.title.clone(),
            position: (0, 0),
            copied,
        }
    }
}

impl Screen for HeadlessScreen {
    fn present(&mut self, frame: &Pixmap) {
        match &mut self.frame {
            Some(shown) if shown.width() == frame.width() && shown.height() == frame.height() => {
                shown.data_mut().copy_from_slice(frame.data());
            }
            shown => *shown = Some(frame.clone()),
        }
    }

    fn set_title(&mut self, title: &str) {
        trace!(from = %self.title, to = %title, "title changed");
        self.title = title.to_owned();
    }

    fn position(&self) -> (i32, i32) {
        self.position
    }

    fn read_back(&self) -> Option<Pixmap> {
        self.frame.clone()
    }

    fn copy_image(&mut self, frame: &Pixmap) -> Result<()> {
        self.copied.lock().push(frame.clone());
        Ok(())
    }
}

/// Runs every window on its own thread, pumping an mpsc queue.
///
/// Nothing reaches the screen, but marshaling, input translation and the
/// lifecycle behave exactly as with [`crate::WinitRuntime`]. Handy for tests
/// and off-screen automation. Ctrl+C copies are collected instead of reaching
/// the system clipboard.
#[derive(Clone, Default)]
pub struct HeadlessRuntime {
    senders: Senders,
    copied: Arc<Mutex<Vec<Pixmap>>>,
}

impl HeadlessRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of windows whose threads are still pumping.
    pub fn live_windows(&self) -> usize {
        self.senders.lock().len()
    }

    /// Frames copied with Ctrl+C in any of this runtime's windows, oldest first.
    pub fn copied_frames(&self) -> Vec<Pixmap> {
        self.copied.lock().clone()
    }

    fn spawn(&self, request: OpenRequest) -> Result<()> {
        let key = request.key;
        let (tx, rx) = mpsc::channel();
        self.senders.lock().insert(key, tx);

        let senders = Arc::clone(&self.senders);
        let copied = Arc::clone(&self.copied);
        let name = format!("litedraw-ui-{}", THREAD_SEQ.fetch_add(1, Ordering::Relaxed));
        let spawned = thread::Builder::new()
            .name(name)
            .spawn(move || window_thread(request, rx, senders, copied));
        if let Err(e) = spawned {
            self.senders.lock().remove(&key);
            return Err(WindowError::CreationFailed(e.to_string()));
        }
        Ok(())
    }
}

fn window_thread(
    request: OpenRequest,
    rx: Receiver<UiMessage>,
    senders: Senders,
    copied: Arc<Mutex<Vec<Pixmap>>>,
) {
    CONFIGURE.call_once(|| debug!("headless runtime started"));
    let key = request.key;

    let opened = ui::open(request, |config| {
        Ok(Box::new(HeadlessScreen::new(config, copied)) as Box<dyn Screen>)
    });
    if opened {
        while ui::contains(key) {
            match rx.recv() {
                Ok(message) => ui::dispatch(message),
                Err(_) => break,
            }
        }
        ui::detach(key);
    }

    senders.lock().remove(&key);
    trace!(?key, "window thread finished");
}

impl Runtime for HeadlessRuntime {
    fn post(&self, message: UiMessage) -> Result<()> {
        if let UiMessage::Open(request) = message {
            return self.spawn(request);
        }
        let key = message.key();
        let senders = self.senders.lock();
        let tx = senders.get(&key).ok_or(WindowError::Cancelled)?;
        tx.send(message).map_err(|_| WindowError::Cancelled)
    }
}
