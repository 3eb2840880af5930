use danmaku_core::{Clipboard, ClipboardError};

fn unavailable(err: &arboard::Error) -> ClipboardError {
    ClipboardError::Unavailable(err.to_string())
}

/// The system clipboard. Opened on first use, so a headless session only
/// fails when something is actually copied.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().map_err(|e| unavailable(&e))?,
        };
        let result = clipboard.set_text(text).map_err(|e| unavailable(&e));
        self.inner = Some(clipboard);
        result
    }
}
