use std::fmt;

use danmaku_protocol::{Color, Rect, SharedStr};
use serde::{Deserialize, Serialize};

use crate::voice::VoiceAttachment;

/// Engine-local handle of a live overlay. Keys are never reused within one
/// engine, and a larger key was added later (is drawn on top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlayKey(pub u64);

/// Identity of the stored record an overlay was created from. Only overlays
/// with an identity can be liked, copied from the panel, or reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(pub SharedStr);

impl From<&str> for OverlayId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for OverlayId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How an overlay moves across the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Motion {
    /// Linear right-to-left travel at constant speed.
    #[default]
    Scroll,
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

/// Everything a caller supplies to emit one overlay.
///
/// Field names follow the stored danmaku records, so a record fetched for a
/// video deserializes straight into a spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySpec {
    pub text: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, rename = "type")]
    pub kind: Motion,
    #[serde(default)]
    pub is_voice: bool,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default, alias = "likes")]
    pub like_count: u32,
    #[serde(default, alias = "_id")]
    pub id: Option<OverlayId>,
}

impl OverlaySpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: default_color(),
            kind: Motion::Scroll,
            is_voice: false,
            audio_url: None,
            like_count: 0,
            id: None,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn likes(mut self, like_count: u32) -> Self {
        self.like_count = like_count;
        self
    }

    pub fn identity(mut self, id: impl Into<OverlayId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn voice(mut self, audio_url: impl Into<String>) -> Self {
        self.is_voice = true;
        self.audio_url = Some(audio_url.into());
        self
    }
}

/// Glyph size grows by one step per ten likes.
pub fn glyph_size_for(base_font_size: f64, like_count: u32) -> f64 {
    base_font_size + f64::from(like_count / 10)
}

/// Box height relative to glyph size, leaving room for descenders.
const BOX_HEIGHT_EM: f64 = 1.2;

/// One overlay in flight.
#[derive(Debug)]
pub struct Overlay {
    pub key: OverlayKey,
    pub text: SharedStr,
    pub color: Color,
    pub motion: Motion,
    pub lane: usize,
    pub x: f64,
    /// Text baseline, fixed for the overlay's lifetime.
    pub y: f64,
    /// Pixels per frame.
    pub speed: f64,
    pub like_count: u32,
    pub glyph_size: f64,
    /// Total width: text plus the voice toggle when present.
    pub width: f64,
    pub opacity: f64,
    pub identity: Option<OverlayId>,
    pub voice: Option<VoiceAttachment>,
    pub frozen: bool,
    /// Width reserved in front of the text for the voice toggle.
    pub(crate) button_width: f64,
}

impl Overlay {
    pub fn is_interactive(&self) -> bool {
        self.identity.is_some()
    }

    /// Fully past the left edge.
    pub fn has_exited(&self) -> bool {
        self.x + self.width <= 0.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y - self.glyph_size,
            self.width,
            self.glyph_size * BOX_HEIGHT_EM,
        )
    }

    /// Hit area of the play/pause toggle at the leading edge.
    pub fn voice_button(&self) -> Option<Rect> {
        self.voice.as_ref()?;
        let bounds = self.bounds();
        Some(Rect::new(bounds.x, bounds.y, self.button_width, bounds.h))
    }

    /// Left end of the text baseline.
    pub fn text_x(&self) -> f64 {
        self.x + self.button_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_size_steps_every_ten_likes() {
        assert!((glyph_size_for(24.0, 0) - 24.0).abs() < f64::EPSILON);
        assert!((glyph_size_for(24.0, 9) - 24.0).abs() < f64::EPSILON);
        assert!((glyph_size_for(24.0, 10) - 25.0).abs() < f64::EPSILON);
        assert!((glyph_size_for(24.0, 37) - 27.0).abs() < f64::EPSILON);
    }

    #[test]
    fn spec_from_stored_record() {
        let json = r##"{
            "_id": "65f1a2",
            "text": "前方高能",
            "color": "#FF0000",
            "type": "scroll",
            "likes": 12,
            "isVoice": true,
            "audioUrl": "/uploads/voice/1.webm"
        }"##;
        let spec: OverlaySpec =
            serde_json::from_str(json).unwrap_or_else(|_| OverlaySpec::new("broken"));
        assert_eq!(spec.text, "前方高能");
        assert_eq!(spec.like_count, 12);
        assert_eq!(spec.id, Some(OverlayId::from("65f1a2")));
        assert!(spec.is_voice);
        assert_eq!(spec.audio_url.as_deref(), Some("/uploads/voice/1.webm"));
    }

    #[test]
    fn spec_defaults() {
        let spec: OverlaySpec =
            serde_json::from_str(r#"{"text": "hi"}"#).unwrap_or_else(|_| OverlaySpec::new(""));
        assert_eq!(spec, OverlaySpec::new("hi"));
    }

    #[test]
    fn stored_motion_kinds() {
        let spec: OverlaySpec = serde_json::from_str(r#"{"text": "x", "type": "scroll"}"#)
            .unwrap_or_else(|_| OverlaySpec::new("broken"));
        assert_eq!(spec.kind, Motion::Scroll);
        assert!(serde_json::from_str::<OverlaySpec>(r#"{"text": "x", "type": "top"}"#).is_err());
    }
}
