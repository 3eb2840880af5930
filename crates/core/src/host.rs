//! Seams between the engine and whatever it runs inside.
//!
//! The engine never reads a clock, measures text, plays audio or touches a
//! clipboard directly. A host (browser bridge, terminal, desktop window, test)
//! hands it a [`Host`] bundle at construction.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{AudioError, ClipboardError};

/// Wall-clock source, in milliseconds. Only differences matter.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Monotonic clock measured from construction.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    pub fn set(&self, ms: f64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

/// Measures the advance width of a string rendered at `font_size`.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f64) -> f64;
}

/// Font-free estimate: ASCII glyphs are narrow, everything else (CJK, kana,
/// emoji) is treated as full-width.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMeasure {
    pub narrow_em: f64,
    pub wide_em: f64,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self {
            narrow_em: 0.55,
            wide_em: 1.0,
        }
    }
}

impl TextMeasure for ApproxMeasure {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars()
            .map(|c| {
                if c.is_ascii() {
                    self.narrow_em
                } else {
                    self.wide_em
                }
            })
            .sum::<f64>()
            * font_size
    }
}

/// Opens playable audio for voice overlays.
pub trait AudioOutput {
    fn open(&mut self, src: &str) -> Result<Box<dyn AudioHandle>, AudioError>;
}

/// One loaded audio resource.
///
/// Dropping the handle must stop playback and release the resource.
pub trait AudioHandle {
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    /// True once playback has run to the end on its own.
    fn has_ended(&self) -> bool;
    /// A failure reported after `play` returned, such as a rejected browser
    /// play promise. Taking it clears it.
    fn take_failure(&mut self) -> Option<AudioError> {
        None
    }
}

/// For hosts without audio. Voice overlays still render, their toggle just
/// reports the failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudio;

impl AudioOutput for NoAudio {
    fn open(&mut self, _src: &str) -> Result<Box<dyn AudioHandle>, AudioError> {
        Err(AudioError::Unsupported)
    }
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-process clipboard. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard(Rc<RefCell<Option<String>>>);

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.0.borrow().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        *self.0.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

/// Everything the engine borrows from its environment.
pub struct Host {
    pub clock: Box<dyn Clock>,
    pub measure: Box<dyn TextMeasure>,
    pub audio: Box<dyn AudioOutput>,
    pub clipboard: Box<dyn Clipboard>,
}

impl Host {
    /// A host with approximate text metrics, no audio and an in-memory clipboard.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            measure: Box::new(ApproxMeasure::default()),
            audio: Box::new(NoAudio),
            clipboard: Box::new(MemoryClipboard::default()),
        }
    }

    pub fn with_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    pub fn with_audio(mut self, audio: impl AudioOutput + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }
}
