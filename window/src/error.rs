use thiserror::Error;

/// Errors surfaced by the window runtime.
#[derive(Debug, Error)]
pub enum WindowError {
    /// The target window is gone; the marshaled work did not run.
    #[error("window is closed")]
    Cancelled,

    /// A blocking call issued from inside another marshaled action on the
    /// same window; waiting would deadlock.
    #[error("nested blocking call on the window's own thread")]
    Reentrant,

    #[error("window creation failed: {0}")]
    CreationFailed(String),

    #[error("event loop error: {0}")]
    EventLoop(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),
}

impl WindowError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WindowError::Cancelled)
    }
}

pub type Result<T, E = WindowError> = std::result::Result<T, E>;
