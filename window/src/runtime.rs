//! Types shared by the UI-thread runtimes and the window owner.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;
use tiny_skia::Pixmap;

use crate::bootstrap::WindowConfig;
use crate::clipboard;
use crate::error::{Result, WindowError};
use crate::handlers::Handlers;
use crate::lifecycle::Lifecycle;
use crate::events::RawInput;

static NEXT_WINDOW_KEY: AtomicU64 = AtomicU64::new(1);

/// Runtime-independent window identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKey(u64);

impl WindowKey {
    pub(crate) fn next() -> Self {
        WindowKey(NEXT_WINDOW_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle of one window. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WindowPhase {
    /// UI thread asked to create the native window.
    Starting = 0,
    /// Handle exists and the UI thread answers marshaled calls.
    Ready = 1,
    /// At least one frame has been presented.
    Running = 2,
    Closed = 3,
}

impl WindowPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WindowPhase::Starting,
            1 => WindowPhase::Ready,
            2 => WindowPhase::Running,
            _ => WindowPhase::Closed,
        }
    }
}

/// State both the owner (any thread) and the UI thread touch.
pub(crate) struct WindowShared {
    /// Backing canvas: the last staged frame. Read for presents and Ctrl+C.
    pub canvas: Mutex<Pixmap>,
    pub handlers: Mutex<Handlers>,
    phase: AtomicU8,
    handle_created: AtomicBool,
}

impl WindowShared {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let canvas = Pixmap::new(width, height).ok_or_else(|| {
            WindowError::CreationFailed(format!("invalid window size {width}x{height}"))
        })?;
        Ok(WindowShared {
            canvas: Mutex::new(canvas),
            handlers: Mutex::new(Handlers::default()),
            phase: AtomicU8::new(WindowPhase::Starting as u8),
            handle_created: AtomicBool::new(false),
        })
    }

    pub fn phase(&self) -> WindowPhase {
        WindowPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn advance(&self, phase: WindowPhase) {
        self.phase.fetch_max(phase as u8, Ordering::AcqRel);
    }

    pub fn handle_created(&self) -> bool {
        self.handle_created.load(Ordering::Acquire)
    }

    pub fn mark_handle_created(&self) {
        self.handle_created.store(true, Ordering::Release);
    }
}

/// Work marshaled onto the UI thread, run against the window's screen.
pub type Task = Box<dyn FnOnce(&mut dyn Screen) + Send>;

/// Request to create a window on a UI thread.
pub struct OpenRequest {
    pub(crate) key: WindowKey,
    pub(crate) config: WindowConfig,
    pub(crate) shared: Arc<WindowShared>,
    pub(crate) lifecycle: Arc<Lifecycle>,
    /// One-shot rendezvous: the UI thread answers with its id once the
    /// native handle exists.
    pub(crate) reply: SyncSender<Result<ThreadId>>,
}

/// Messages a UI thread consumes, in FIFO order.
pub enum UiMessage {
    Open(OpenRequest),
    Run {
        key: WindowKey,
        task: Task,
    },
    Input {
        key: WindowKey,
        input: RawInput,
    },
    Close {
        key: WindowKey,
        done: Option<SyncSender<()>>,
    },
}

impl UiMessage {
    pub fn key(&self) -> WindowKey {
        match self {
            UiMessage::Open(req) => req.key,
            UiMessage::Run { key, .. } | UiMessage::Input { key, .. } | UiMessage::Close { key, .. } => {
                *key
            }
        }
    }
}

/// The native side of one window. Lives on, and is only touched from, its UI thread.
pub trait Screen {
    /// Copy `frame` onto the visible client area.
    fn present(&mut self, frame: &Pixmap);

    fn set_title(&mut self, title: &str);

    /// Outer position of the window on the desktop.
    fn position(&self) -> (i32, i32);

    /// What the screen currently shows, for runtimes that can read it back.
    fn read_back(&self) -> Option<Pixmap> {
        None
    }

    /// Put `frame` on the clipboard. Runs on Ctrl+C with the backing canvas.
    fn copy_image(&mut self, frame: &Pixmap) -> Result<()> {
        clipboard::copy_image(frame)
    }
}

/// A UI-thread runtime that windows can be opened on and work marshaled to.
///
/// Implemented by [`crate::WinitRuntime`] and [`crate::HeadlessRuntime`].
pub trait Runtime: Send + Sync {
    /// Queue `message` for the UI thread that owns its window. Fails with
    /// [`WindowError::Cancelled`] when that thread is gone.
    fn post(&self, message: UiMessage) -> Result<()>;
}
