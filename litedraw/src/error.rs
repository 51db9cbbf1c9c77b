use litedraw_canvas::CanvasError;
use litedraw_window::WindowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Window(#[from] WindowError),
}

impl Error {
    /// The window was closed before the call could reach it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Window(e) if e.is_cancelled())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
