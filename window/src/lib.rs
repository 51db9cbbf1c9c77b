//! Window runtime for litedraw.
//!
//! A window lives on a UI thread owned by a [`Runtime`]: the process-wide
//! winit event loop ([`WinitRuntime`]) or a thread per window without any
//! native surface ([`HeadlessRuntime`]). [`open_window`] returns a
//! [`WindowOwner`], the handle every other thread uses to marshal work onto
//! that UI thread, present frames and subscribe to input.
//!
//! A [`Lifecycle`] counts open windows; by default closing the last one ends
//! the process.

mod bootstrap;
mod clipboard;
mod error;
mod events;
mod handlers;
mod headless;
mod lifecycle;
mod owner;
mod runtime;
mod ui;
mod winit_rt;

pub use bootstrap::{open_window, WindowConfig};
pub use error::{Result, WindowError};
pub use events::{
    is_copy_chord, EventKind, InputTracker, Key, KeyEvent, KeyPressEvent, Modifiers, MouseButton,
    MouseEvent, MoveEvent, NamedKey, RawInput, WindowEvent, DOUBLE_CLICK_DISTANCE,
    DOUBLE_CLICK_TIME, WHEEL_DELTA,
};
pub use handlers::{Handler, HandlerId};
pub use headless::HeadlessRuntime;
pub use lifecycle::Lifecycle;
pub use owner::{WindowOwner, POLL_INTERVAL};
pub use runtime::{OpenRequest, Runtime, Screen, Task, UiMessage, WindowKey, WindowPhase};
pub use winit_rt::WinitRuntime;
