use danmaku_protocol::ThemeToken;

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
    .to_color32()
}

/// Backdrop standing in for the video under the overlays.
pub fn stage(mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => ResolvedColor::rgb(0x11, 0x11, 0x1b), // Crust
        ThemeMode::Light => ResolvedColor::rgb(0x4c, 0x4f, 0x69),
    }
    .to_color32()
}

fn resolve_dark(token: ThemeToken) -> ResolvedColor {
    // Catppuccin Mocha palette
    use ThemeToken::*;
    match token {
        OverlayOutline => ResolvedColor::rgb(0, 0, 0),
        HoverHighlight => ResolvedColor::rgba(0xcd, 0xd6, 0xf4, 25),
        HoverBorder => ResolvedColor::rgba(0xcd, 0xd6, 0xf4, 150),

        VoiceButtonBackground => ResolvedColor::rgba(0x18, 0x18, 0x25, 200), // Mantle
        VoiceButtonIcon => ResolvedColor::rgb(0xcd, 0xd6, 0xf4),              // Text

        PanelBackground => ResolvedColor::rgba(0x18, 0x18, 0x25, 235), // Mantle
        PanelBorder => ResolvedColor::rgb(0x45, 0x47, 0x5a),           // Surface1
        PanelButton => ResolvedColor::rgb(0x31, 0x32, 0x44),           // Surface0
        PanelText => ResolvedColor::rgb(0xcd, 0xd6, 0xf4),

        ToastBackground => ResolvedColor::rgba(0x11, 0x11, 0x1b, 200),
        ToastText => ResolvedColor::rgb(0xcd, 0xd6, 0xf4),
    }
}

fn resolve_light(token: ThemeToken) -> ResolvedColor {
    use ThemeToken::*;
    match token {
        OverlayOutline => ResolvedColor::rgb(0, 0, 0),
        HoverHighlight => ResolvedColor::rgba(255, 255, 255, 40),
        HoverBorder => ResolvedColor::rgba(255, 255, 255, 170),

        VoiceButtonBackground => ResolvedColor::rgba(255, 255, 255, 210),
        VoiceButtonIcon => ResolvedColor::rgb(40, 40, 50),

        PanelBackground => ResolvedColor::rgba(250, 250, 252, 240),
        PanelBorder => ResolvedColor::rgb(210, 210, 215),
        PanelButton => ResolvedColor::rgb(230, 230, 235),
        PanelText => ResolvedColor::rgb(40, 40, 50),

        ToastBackground => ResolvedColor::rgba(255, 255, 255, 220),
        ToastText => ResolvedColor::rgb(40, 40, 50),
    }
}

/// Catppuccin Mocha dark visuals for egui widgets.
pub fn dark_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::dark();
    v.panel_fill = egui::Color32::from_rgb(0x18, 0x18, 0x25);
    v.window_fill = egui::Color32::from_rgb(0x1e, 0x1e, 0x2e);
    v.extreme_bg_color = egui::Color32::from_rgb(0x11, 0x11, 0x1b);
    v.widgets.inactive.bg_fill = egui::Color32::from_rgb(0x45, 0x47, 0x5a);
    v.widgets.hovered.bg_fill = egui::Color32::from_rgb(0x58, 0x5b, 0x70);
    v.widgets.active.bg_fill = egui::Color32::from_rgb(0x89, 0xb4, 0xfa);
    v.selection.bg_fill = egui::Color32::from_rgba_unmultiplied(0x89, 0xb4, 0xfa, 60);
    v.error_fg_color = egui::Color32::from_rgb(0xf3, 0x8b, 0xa8);
    v
}

pub fn light_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::light();
    v.panel_fill = egui::Color32::from_rgb(250, 250, 252);
    v.window_fill = egui::Color32::from_rgb(255, 255, 255);
    v.widgets.active.bg_fill = egui::Color32::from_rgb(50, 110, 220);
    v.selection.bg_fill = egui::Color32::from_rgba_unmultiplied(50, 110, 220, 50);
    v.error_fg_color = egui::Color32::from_rgb(211, 47, 47);
    v
}

pub fn visuals(mode: ThemeMode) -> egui::Visuals {
    match mode {
        ThemeMode::Dark => dark_visuals(),
        ThemeMode::Light => light_visuals(),
    }
}
