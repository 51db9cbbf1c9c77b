//! Off-screen canvas for litedraw.
//!
//! A [`Buffer`] owns a premultiplied RGBA pixmap sized to a window's client
//! area. [`Buffer::surface`] hands out an immediate-mode [`Surface`] for
//! lines, curves, fills, text and image blits; [`Buffer::copy_to`] blits the
//! finished frame onto another pixmap (the window's backing canvas).
//!
//! Rasterization is tiny-skia; glyphs come from fontdue.

mod bitmap;
mod buffer;
mod color;
mod error;
mod helpers;
mod path;
mod text;

pub use bitmap::Image;
pub use buffer::{Buffer, Surface};
pub use color::{Color, Pen};
pub use error::{CanvasError, Result};
pub use helpers::{centered_rect, to_degrees};
pub use text::{Alignment, Font, TextFormat};

pub use tiny_skia::{Pixmap, Transform};
