//! Frame composition: engine state in, render commands out.

pub mod overlays;
pub mod panel;
pub mod toast;

use danmaku_protocol::{RenderCommand, Viewport};

use crate::config::EngineConfig;
use crate::interaction::ActionPanel;
use crate::model::{Overlay, OverlayKey};

pub use overlays::render_overlays;
pub use panel::render_panel;
pub use toast::{Toast, render_toast};

/// Everything one frame draws, bottom to top: clear, overlays, panel, toast.
pub fn render_frame(
    viewport: &Viewport,
    overlays: &[Overlay],
    hovered: Option<OverlayKey>,
    panel: Option<&ActionPanel>,
    toast: Option<&Toast>,
    config: &EngineConfig,
) -> Vec<RenderCommand> {
    let mut commands = vec![RenderCommand::ClearRect {
        rect: viewport.rect(),
    }];
    commands.extend(render_overlays(overlays, hovered, config));
    if let Some(panel) = panel {
        commands.extend(render_panel(panel, &config.panel));
    }
    if let Some(toast) = toast {
        commands.extend(render_toast(toast, viewport));
    }
    commands
}
