use std::borrow::Cow;

use tiny_skia::Pixmap;

use crate::error::{Result, WindowError};

/// Put `frame` on the system clipboard as an image.
pub(crate) fn copy_image(frame: &Pixmap) -> Result<()> {
    let mut bytes = Vec::with_capacity(frame.data().len());
    for px in frame.pixels() {
        let c = px.demultiply();
        bytes.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let mut clipboard = arboard::Clipboard::new().map_err(|e| WindowError::Clipboard(e.to_string()))?;
    clipboard
        .set_image(arboard::ImageData {
            width: frame.width() as usize,
            height: frame.height() as usize,
            bytes: Cow::Owned(bytes),
        })
        .map_err(|e| WindowError::Clipboard(e.to_string()))
}
