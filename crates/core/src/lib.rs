//! Scrolling-overlay ("danmaku") engine.
//!
//! [`Engine`] lays timed text and voice overlays into horizontal lanes,
//! moves them right to left once per frame and turns the result into
//! [`danmaku_protocol::RenderCommand`]s. Hovering an overlay freezes it and
//! opens an [`interaction::ActionPanel`] with like, copy and report actions.
//! Everything environmental (clock, text metrics, audio, clipboard) comes in
//! through the traits in [`host`].

pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod host;
pub mod interaction;
pub mod model;
pub mod playback;
pub mod views;
pub mod voice;

pub use config::{EngineConfig, PanelConfig};
pub use engine::{ActionCallback, Engine, EngineState, FrameOutput};
pub use error::{AudioError, ClipboardError, ConfigError};
pub use feed::{Cue, CueSheet, FeedError};
pub use host::{
    ApproxMeasure, AudioHandle, AudioOutput, Clipboard, Clock, Host, ManualClock,
    MemoryClipboard, NoAudio, TextMeasure,
};
#[cfg(not(target_arch = "wasm32"))]
pub use host::SystemClock;
pub use interaction::{ActionPanel, ClickOutcome, HoverState, PanelAction};
pub use model::{Overlay, OverlayId, OverlayKey, OverlaySpec};
pub use playback::Playback;
pub use voice::VoiceAttachment;
