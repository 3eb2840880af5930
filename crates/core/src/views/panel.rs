use danmaku_protocol::{Point, RenderCommand, TextAlign, ThemeToken};

use crate::config::PanelConfig;
use crate::interaction::ActionPanel;

/// Render the action panel: a bordered strip with one captioned button per
/// action.
pub fn render_panel(panel: &ActionPanel, config: &PanelConfig) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(3 + panel.buttons.len() * 2);

    commands.push(RenderCommand::BeginGroup {
        id: "action-panel".into(),
        label: Some("Actions".into()),
    });
    commands.push(RenderCommand::DrawRect {
        rect: panel.rect,
        color: ThemeToken::PanelBackground,
        border_color: Some(ThemeToken::PanelBorder),
        label: None,
    });

    for (action, rect) in &panel.buttons {
        commands.push(RenderCommand::DrawRect {
            rect: *rect,
            color: ThemeToken::PanelButton,
            border_color: None,
            label: None,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(
                rect.x + rect.w / 2.0,
                rect.y + rect.h / 2.0 + config.font_size / 3.0,
            ),
            text: action.label().into(),
            color: ThemeToken::PanelText,
            font_size: config.font_size,
            align: TextAlign::Center,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OverlayKey;
    use danmaku_protocol::{Rect, Viewport};

    #[test]
    fn captions_follow_button_order() {
        let cfg = PanelConfig::default();
        let panel = ActionPanel::anchored(
            OverlayKey(1),
            Rect::new(100.0, 3.0, 80.0, 28.8),
            &Viewport::new(800.0, 300.0),
            &cfg,
        );
        let cmds = render_panel(&panel, &cfg);
        let captions: Vec<&str> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(captions, vec!["Like", "Copy", "Report"]);
        assert!(matches!(cmds.last(), Some(RenderCommand::EndGroup)));
    }
}
