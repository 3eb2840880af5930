//! Browser implementations of the engine's host traits.

use std::cell::RefCell;
use std::rc::Rc;

use danmaku_core::{AudioError, AudioHandle, AudioOutput, Clipboard, ClipboardError, Clock};
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Log a promise rejection without blocking the frame.
fn watch(promise: Promise, what: &'static str) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = JsFuture::from(promise).await {
            web_sys::console::warn_2(&format!("danmaku: {what} rejected").into(), &err);
        }
    });
}

pub struct DateClock;

impl Clock for DateClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// One `<audio>` element per voice overlay.
pub struct HtmlAudio;

impl AudioOutput for HtmlAudio {
    fn open(&mut self, src: &str) -> Result<Box<dyn AudioHandle>, AudioError> {
        let element = HtmlAudioElement::new_with_src(src).map_err(|err| AudioError::Open {
            src: src.to_string(),
            reason: describe(&err),
        })?;
        element.set_preload("auto");
        Ok(Box::new(HtmlAudioHandle {
            element,
            failure: Rc::default(),
        }))
    }
}

struct HtmlAudioHandle {
    element: HtmlAudioElement,
    /// Set when a play promise rejects, e.g. a 404 or blocked autoplay.
    failure: Rc<RefCell<Option<String>>>,
}

impl AudioHandle for HtmlAudioHandle {
    fn play(&mut self) -> Result<(), AudioError> {
        let promise = self
            .element
            .play()
            .map_err(|err| AudioError::Playback(describe(&err)))?;
        self.failure.replace(None);
        let failure = Rc::clone(&self.failure);
        let element = self.element.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                web_sys::console::warn_2(&"danmaku: audio playback rejected".into(), &err);
                // A later play() may already be running.
                if element.paused() {
                    failure.replace(Some(describe(&err)));
                }
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(err) = self.element.pause() {
            web_sys::console::warn_2(&"danmaku: audio pause failed".into(), &err);
        }
    }

    fn has_ended(&self) -> bool {
        self.element.ended()
    }

    fn take_failure(&mut self) -> Option<AudioError> {
        self.failure.take().map(AudioError::Playback)
    }
}

impl Drop for HtmlAudioHandle {
    fn drop(&mut self) {
        // Detaching the source lets the browser drop the decoded media.
        if let Err(err) = self.element.pause() {
            web_sys::console::warn_2(&"danmaku: audio pause failed".into(), &err);
        }
        if let Err(err) = self.element.remove_attribute("src") {
            web_sys::console::warn_2(&"danmaku: audio release failed".into(), &err);
        }
        self.element.load();
    }
}

/// `navigator.clipboard.writeText`, looked up dynamically since it is absent
/// on insecure origins.
pub struct NavigatorClipboard;

impl Clipboard for NavigatorClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let unavailable = |what: &str| ClipboardError::Unavailable(what.to_string());
        let window = web_sys::window().ok_or_else(|| unavailable("no window"))?;
        let clipboard = Reflect::get(&window.navigator(), &"clipboard".into())
            .ok()
            .filter(|v| !v.is_undefined())
            .ok_or_else(|| unavailable("navigator.clipboard is not available"))?;
        let write = Reflect::get(&clipboard, &"writeText".into())
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| unavailable("clipboard.writeText is not a function"))?;
        let result = write
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(|err| ClipboardError::Unavailable(describe(&err)))?;
        if let Ok(promise) = result.dyn_into::<Promise>() {
            watch(promise, "clipboard write");
        }
        Ok(())
    }
}
