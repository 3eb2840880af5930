use danmaku_protocol::{Point, Rect, RenderCommand, SharedStr, ThemeToken};

use crate::config::EngineConfig;
use crate::model::{Overlay, OverlayKey};

/// Inset of the play/pause glyph inside its button.
const ICON_INSET: f64 = 0.25;

/// Render live overlays back to front, in insertion order.
///
/// The hovered overlay gets a highlight box behind its text. Voice overlays
/// get their toggle at the leading edge, which moves with the overlay.
pub fn render_overlays(
    overlays: &[Overlay],
    hovered: Option<OverlayKey>,
    config: &EngineConfig,
) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(overlays.len() * 4);

    for overlay in overlays {
        commands.push(RenderCommand::BeginGroup {
            id: SharedStr::from(format!("overlay-{}", overlay.key.0)),
            label: Some(overlay.text.clone()),
        });

        if hovered == Some(overlay.key) {
            commands.push(RenderCommand::DrawRect {
                rect: overlay.bounds(),
                color: ThemeToken::HoverHighlight,
                border_color: Some(ThemeToken::HoverBorder),
                label: None,
            });
        }

        if let (Some(voice), Some(button)) = (&overlay.voice, overlay.voice_button()) {
            commands.push(RenderCommand::DrawRect {
                rect: button,
                color: ThemeToken::VoiceButtonBackground,
                border_color: None,
                label: None,
            });
            commands.push(RenderCommand::DrawIcon {
                rect: icon_rect(button),
                icon: voice.icon(),
                color: ThemeToken::VoiceButtonIcon,
            });
        }

        commands.push(RenderCommand::DrawOverlayText {
            position: Point::new(overlay.text_x(), overlay.y),
            text: overlay.text.clone(),
            fill: overlay.color,
            outline: ThemeToken::OverlayOutline,
            font_size: overlay.glyph_size,
            bold: config.bold,
            opacity: overlay.opacity,
        });

        commands.push(RenderCommand::EndGroup);
    }

    commands
}

/// Square icon box centered in the button.
fn icon_rect(button: Rect) -> Rect {
    let side = button.w.min(button.h) * (1.0 - 2.0 * ICON_INSET);
    Rect::new(
        button.x + (button.w - side) / 2.0,
        button.y + (button.h - side) / 2.0,
        side,
        side,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::VoiceAttachment;
    use crate::voice::testing::ScriptedAudio;
    use danmaku_protocol::{Color, Icon};

    fn overlay(key: u64, x: f64) -> Overlay {
        Overlay {
            key: OverlayKey(key),
            text: "弹幕".into(),
            color: Color::WHITE,
            motion: crate::model::Motion::Scroll,
            lane: 0,
            x,
            y: 27.0,
            speed: 3.0,
            like_count: 0,
            glyph_size: 24.0,
            width: 48.0,
            opacity: 1.0,
            identity: None,
            voice: None,
            frozen: false,
            button_width: 0.0,
        }
    }

    #[test]
    fn one_group_per_overlay_in_insertion_order() {
        let cmds = render_overlays(
            &[overlay(0, 100.0), overlay(1, 200.0)],
            None,
            &EngineConfig::default(),
        );
        let ids: Vec<&str> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::BeginGroup { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["overlay-0", "overlay-1"]);
        assert_eq!(cmds.len(), 6);
    }

    #[test]
    fn hovered_overlay_gets_highlight_behind_text() {
        let cmds = render_overlays(&[overlay(7, 100.0)], Some(OverlayKey(7)), &EngineConfig::default());
        assert!(matches!(
            cmds[1],
            RenderCommand::DrawRect {
                color: ThemeToken::HoverHighlight,
                ..
            }
        ));
        assert!(matches!(cmds[2], RenderCommand::DrawOverlayText { .. }));
    }

    #[test]
    fn text_is_drawn_at_baseline() {
        let cmds = render_overlays(&[overlay(0, 123.0)], None, &EngineConfig::default());
        let Some(RenderCommand::DrawOverlayText {
            position,
            font_size,
            bold,
            ..
        }) = cmds.get(1)
        else {
            panic!("expected overlay text, got {cmds:?}");
        };
        assert!((position.x - 123.0).abs() < f64::EPSILON);
        assert!((position.y - 27.0).abs() < f64::EPSILON);
        assert!((font_size - 24.0).abs() < f64::EPSILON);
        assert!(*bold);
    }

    #[test]
    fn icon_is_centered_square() {
        let r = icon_rect(Rect::new(10.0, 0.0, 28.0, 28.8));
        assert!((r.w - r.h).abs() < f64::EPSILON);
        assert!((r.x + r.w / 2.0 - 24.0).abs() < 1e-9);
    }

    #[test]
    fn voice_toggle_leads_the_text() {
        let mut audio = ScriptedAudio::default();
        let mut o = overlay(3, 100.0);
        o.voice = Some(VoiceAttachment::open(&mut audio, "v.webm"));
        o.button_width = 28.0;
        o.width += 28.0;

        let cmds = render_overlays(std::slice::from_ref(&o), None, &EngineConfig::default());
        assert!(matches!(
            cmds[1],
            RenderCommand::DrawRect {
                color: ThemeToken::VoiceButtonBackground,
                ..
            }
        ));
        assert!(matches!(cmds[2], RenderCommand::DrawIcon { icon: Icon::Play, .. }));
        let RenderCommand::DrawOverlayText { position, .. } = &cmds[3] else {
            panic!("expected overlay text, got {cmds:?}");
        };
        assert!((position.x - 128.0).abs() < f64::EPSILON);

        if let Some(voice) = o.voice.as_mut() {
            voice.toggle();
        }
        let cmds = render_overlays(std::slice::from_ref(&o), None, &EngineConfig::default());
        assert!(matches!(cmds[2], RenderCommand::DrawIcon { icon: Icon::Pause, .. }));
    }
}
