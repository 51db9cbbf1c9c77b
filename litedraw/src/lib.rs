//! Simple immediate-mode drawing in a window.
//!
//! ```no_run
//! use litedraw::{Color, LiteDraw};
//!
//! let draw = LiteDraw::new()?;
//! draw.set_color(Color::BLUE);
//! draw.filled_circle(300, 300, 100);
//! draw.show()?;
//! litedraw::run();
//! # Ok::<(), litedraw::Error>(())
//! ```
//!
//! Drawing goes to an off-screen buffer; [`LiteDraw::show`] copies it to the
//! window. The window lives on a background UI thread, and event callbacks
//! run there with a handle to the same [`LiteDraw`]. Closing the last window
//! ends the process.

mod angle;
mod draw;
mod error;

pub use angle::Angle;
pub use draw::{run, Builder, DrawingState, LiteDraw, DEFAULT_FONT_SIZE};
pub use error::{Error, Result};

pub use litedraw_canvas::{Alignment, CanvasError, Color, Font, Image, Pen, TextFormat, Transform};
pub use litedraw_window::{
    HandlerId, HeadlessRuntime, Key, KeyEvent, KeyPressEvent, Lifecycle, Modifiers, MouseButton,
    MouseEvent, MoveEvent, NamedKey, RawInput, Runtime, WindowError, WinitRuntime,
};
