use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Overlays
    OverlayOutline,
    HoverHighlight,
    HoverBorder,

    // Voice toggle
    VoiceButtonBackground,
    VoiceButtonIcon,

    // Action panel
    PanelBackground,
    PanelBorder,
    PanelButton,
    PanelText,

    // Toast
    ToastBackground,
    ToastText,
}
