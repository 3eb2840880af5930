use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Color, Point, Rect};

/// A single, stateless render instruction.
///
/// The engine emits a `Vec<RenderCommand>` for every frame. Renderers consume
/// this list sequentially, back to front — each command carries all the data
/// it needs, so a renderer never has to look at engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Wipe a region back to transparent (the video shows through).
    ClearRect { rect: Rect },

    /// Draw a filled rectangle, optionally with a border and a centered label.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<SharedStr>,
    },

    /// Draw a UI text string (toast, panel captions) at a position.
    DrawText {
        position: Point,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw one overlay's text. `position` is the left end of the baseline.
    ///
    /// Overlay colors are chosen by the people who post them, so the fill is
    /// a literal color rather than a theme token. The outline keeps light
    /// text readable over bright video.
    DrawOverlayText {
        position: Point,
        text: SharedStr,
        fill: Color,
        outline: ThemeToken,
        font_size: f64,
        bold: bool,
        opacity: f64,
    },

    /// Draw a small glyph icon fitted into `rect`.
    DrawIcon {
        rect: Rect,
        icon: Icon,
        color: ThemeToken,
    },

    /// Begin a logical group (an overlay, the action panel). Renderers may use
    /// this for batching or accessibility.
    BeginGroup {
        id: SharedStr,
        label: Option<SharedStr>,
    },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Vector icons the engine asks renderers to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Icon {
    /// Right-pointing triangle.
    Play,
    /// Filled square.
    Pause,
}

/// Pointer shape the host should show over the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorIcon {
    #[default]
    Default,
    Pointer,
}

impl CursorIcon {
    /// CSS `cursor` property value.
    pub fn as_css(self) -> &'static str {
        match self {
            CursorIcon::Default => "default",
            CursorIcon::Pointer => "pointer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_text_serializes_with_literal_fill() {
        let cmd = RenderCommand::DrawOverlayText {
            position: Point::new(800.0, 27.0),
            text: "hello".into(),
            fill: Color::WHITE,
            outline: ThemeToken::OverlayOutline,
            font_size: 24.0,
            bold: true,
            opacity: 1.0,
        };
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert!(json.contains("DrawOverlayText"));
        assert!(json.contains("\"hello\""));
        assert!(json.contains("OverlayOutline"));
    }

    #[test]
    fn cursor_css_names() {
        assert_eq!(CursorIcon::Default.as_css(), "default");
        assert_eq!(CursorIcon::Pointer.as_css(), "pointer");
    }
}
