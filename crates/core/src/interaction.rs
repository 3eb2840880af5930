//! Hover inspection of moving overlays.
//!
//! The action panel is drawn below the overlay it belongs to, so the pointer
//! has to cross empty space to reach it. The hover state machine bridges that
//! gap with a grace deadline instead of a timer:
//!
//! ```text
//! Idle -> Hovered -> PendingHide -> Idle
//!            ^  \         |
//!            |   \-> PanelHovered -> Idle
//!            +--------------------+
//! ```

use danmaku_protocol::{Point, Rect, Viewport};

use crate::config::PanelConfig;
use crate::model::{Overlay, OverlayId, OverlayKey};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    /// Pointer is over the overlay; it is frozen and its panel is shown.
    Hovered(OverlayKey),
    /// Pointer left the overlay; hide unless it comes back before `deadline`.
    PendingHide { key: OverlayKey, deadline: f64 },
    /// Pointer is over the action panel.
    PanelHovered(OverlayKey),
}

impl HoverState {
    /// The overlay currently frozen by hover, if any.
    pub fn target(&self) -> Option<OverlayKey> {
        match *self {
            HoverState::Idle => None,
            HoverState::Hovered(key)
            | HoverState::PendingHide { key, .. }
            | HoverState::PanelHovered(key) => Some(key),
        }
    }
}

/// What the pointer is over right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PointerInput {
    Over {
        /// Topmost overlay under the pointer and whether it is interactive.
        hit: Option<(OverlayKey, bool)>,
        in_panel: bool,
    },
    /// Pointer left the render surface.
    Left,
}

/// Outcome of one state-machine step. `release` must be unfrozen and its
/// panel hidden before `capture` is frozen and given a panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Transition {
    pub next: HoverState,
    pub release: Option<OverlayKey>,
    pub capture: Option<OverlayKey>,
}

impl Transition {
    fn stay(state: HoverState) -> Self {
        Self {
            next: state,
            release: None,
            capture: None,
        }
    }

    fn hide(key: OverlayKey) -> Self {
        Self {
            next: HoverState::Idle,
            release: Some(key),
            capture: None,
        }
    }
}

pub(crate) fn step(state: HoverState, input: PointerInput, now: f64, grace_ms: f64) -> Transition {
    let pending = |key| HoverState::PendingHide {
        key,
        deadline: now + grace_ms,
    };
    if let (PointerInput::Over { in_panel: true, .. }, Some(key)) = (input, state.target()) {
        return Transition::stay(HoverState::PanelHovered(key));
    }
    match input {
        PointerInput::Left => match state {
            HoverState::Hovered(key) => Transition::stay(pending(key)),
            HoverState::PanelHovered(key) => Transition::hide(key),
            HoverState::PendingHide { .. } | HoverState::Idle => Transition::stay(state),
        },
        PointerInput::Over { hit: Some((key, interactive)), .. } => {
            if state.target() == Some(key) {
                return Transition::stay(HoverState::Hovered(key));
            }
            Transition {
                next: if interactive {
                    HoverState::Hovered(key)
                } else {
                    HoverState::Idle
                },
                release: state.target(),
                capture: interactive.then_some(key),
            }
        }
        PointerInput::Over { hit: None, .. } => match state {
            HoverState::Hovered(key) => Transition::stay(pending(key)),
            HoverState::PanelHovered(key) => Transition::hide(key),
            HoverState::PendingHide { .. } | HoverState::Idle => Transition::stay(state),
        },
    }
}

/// Resolve an expired grace window.
pub(crate) fn expire(state: HoverState, now: f64) -> Transition {
    match state {
        HoverState::PendingHide { key, deadline } if now >= deadline => Transition::hide(key),
        _ => Transition::stay(state),
    }
}

/// Topmost overlay containing `p`: the most recently added wins.
pub(crate) fn hit_test(overlays: &[Overlay], p: Point) -> Option<&Overlay> {
    overlays.iter().rev().find(|o| o.bounds().contains(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Like,
    Copy,
    Report,
}

impl PanelAction {
    pub const ALL: [PanelAction; 3] = [PanelAction::Like, PanelAction::Copy, PanelAction::Report];

    pub fn label(self) -> &'static str {
        match self {
            PanelAction::Like => "Like",
            PanelAction::Copy => "Copy",
            PanelAction::Report => "Report",
        }
    }
}

/// The like / copy / report surface bound to the hovered overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPanel {
    pub target: OverlayKey,
    pub rect: Rect,
    pub buttons: [(PanelAction, Rect); 3],
}

impl ActionPanel {
    /// Lay the panel out just below `anchor`, or just above it when there is
    /// no room below. Horizontally it starts at the anchor's left edge and is
    /// pushed back inside the viewport.
    pub fn anchored(
        target: OverlayKey,
        anchor: Rect,
        viewport: &Viewport,
        config: &PanelConfig,
    ) -> Self {
        let count = PanelAction::ALL.len() as f64;
        let w = count * config.button_width + (count - 1.0) * config.spacing + 2.0 * config.padding;
        let h = config.button_height + 2.0 * config.padding;

        let x = anchor.x.min(viewport.width - w).max(0.0);
        let below = anchor.bottom() + config.offset;
        let y = if below + h <= viewport.height {
            below
        } else {
            (anchor.y - config.offset - h).max(0.0)
        };

        let buttons = PanelAction::ALL.map(|action| {
            let i = action as usize as f64;
            let bx = x + config.padding + i * (config.button_width + config.spacing);
            (
                action,
                Rect::new(bx, y + config.padding, config.button_width, config.button_height),
            )
        });

        Self {
            target,
            rect: Rect::new(x, y, w, h),
            buttons,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.rect.contains(p)
    }

    pub fn button_at(&self, p: Point) -> Option<PanelAction> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(p))
            .map(|(action, _)| *action)
    }
}

/// What a click did, for hosts that want to react (analytics, UI feedback).
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Liked(OverlayId),
    Copied { ok: bool },
    Reported(OverlayId),
    VoiceToggled { key: OverlayKey, playing: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: OverlayKey = OverlayKey(1);
    const B: OverlayKey = OverlayKey(2);

    fn over(hit: Option<(OverlayKey, bool)>) -> PointerInput {
        PointerInput::Over {
            hit,
            in_panel: false,
        }
    }

    #[test]
    fn hovering_captures_interactive_overlay() {
        let t = step(HoverState::Idle, over(Some((A, true))), 0.0, 300.0);
        assert_eq!(t.next, HoverState::Hovered(A));
        assert_eq!(t.capture, Some(A));
        assert_eq!(t.release, None);
    }

    #[test]
    fn non_interactive_overlay_is_never_captured() {
        let t = step(HoverState::Idle, over(Some((A, false))), 0.0, 300.0);
        assert_eq!(t.next, HoverState::Idle);
        assert_eq!(t.capture, None);

        let t = step(HoverState::Hovered(B), over(Some((A, false))), 0.0, 300.0);
        assert_eq!(t.next, HoverState::Idle);
        assert_eq!(t.release, Some(B));
    }

    #[test]
    fn switching_overlays_releases_previous_immediately() {
        let t = step(HoverState::Hovered(A), over(Some((B, true))), 0.0, 300.0);
        assert_eq!(t.next, HoverState::Hovered(B));
        assert_eq!(t.release, Some(A));
        assert_eq!(t.capture, Some(B));
    }

    #[test]
    fn leaving_overlay_defers_hide() {
        let t = step(HoverState::Hovered(A), over(None), 1000.0, 300.0);
        assert_eq!(
            t.next,
            HoverState::PendingHide {
                key: A,
                deadline: 1300.0
            }
        );
        assert_eq!(t.release, None);

        assert_eq!(expire(t.next, 1299.0).next, t.next);
        let done = expire(t.next, 1300.0);
        assert_eq!(done.next, HoverState::Idle);
        assert_eq!(done.release, Some(A));
    }

    #[test]
    fn pending_hide_is_not_extended_by_further_moves() {
        let pending = HoverState::PendingHide {
            key: A,
            deadline: 1300.0,
        };
        assert_eq!(step(pending, over(None), 1200.0, 300.0).next, pending);
        assert_eq!(step(pending, PointerInput::Left, 1200.0, 300.0).next, pending);
    }

    #[test]
    fn returning_to_overlay_cancels_pending_hide() {
        let pending = HoverState::PendingHide {
            key: A,
            deadline: 1300.0,
        };
        let t = step(pending, over(Some((A, true))), 1100.0, 300.0);
        assert_eq!(t.next, HoverState::Hovered(A));
        assert_eq!(t.release, None);
        assert_eq!(t.capture, None);
    }

    #[test]
    fn entering_panel_cancels_pending_hide_and_leaving_it_hides_now() {
        let pending = HoverState::PendingHide {
            key: A,
            deadline: 1300.0,
        };
        let in_panel = PointerInput::Over {
            hit: None,
            in_panel: true,
        };
        let t = step(pending, in_panel, 1100.0, 300.0);
        assert_eq!(t.next, HoverState::PanelHovered(A));
        assert_eq!(expire(t.next, 5000.0).next, HoverState::PanelHovered(A));

        let t = step(HoverState::PanelHovered(A), over(None), 1200.0, 300.0);
        assert_eq!(t.next, HoverState::Idle);
        assert_eq!(t.release, Some(A));

        let t = step(HoverState::PanelHovered(A), PointerInput::Left, 1200.0, 300.0);
        assert_eq!(t.next, HoverState::Idle);
    }

    #[test]
    fn panel_is_ignored_without_a_target() {
        let in_panel = PointerInput::Over {
            hit: None,
            in_panel: true,
        };
        assert_eq!(step(HoverState::Idle, in_panel, 0.0, 300.0).next, HoverState::Idle);
    }

    #[test]
    fn panel_sits_below_anchor_and_inside_viewport() {
        let cfg = PanelConfig::default();
        let vp = Viewport::new(800.0, 300.0);
        let panel = ActionPanel::anchored(A, Rect::new(700.0, 3.0, 100.0, 28.8), &vp, &cfg);
        assert!(panel.rect.right() <= 800.0);
        assert!((panel.rect.y - (3.0 + 28.8 + cfg.offset)).abs() < 1e-9);
        let like = panel.buttons[0].1;
        assert_eq!(
            panel.button_at(Point::new(like.x + 1.0, like.y + 1.0)),
            Some(PanelAction::Like)
        );
        let report = panel.buttons[2].1;
        assert_eq!(
            panel.button_at(Point::new(report.x + 1.0, report.y + 1.0)),
            Some(PanelAction::Report)
        );
    }

    #[test]
    fn panel_flips_above_near_bottom() {
        let cfg = PanelConfig::default();
        let vp = Viewport::new(800.0, 300.0);
        let panel = ActionPanel::anchored(A, Rect::new(10.0, 270.0, 100.0, 28.8), &vp, &cfg);
        assert!(panel.rect.bottom() <= 270.0);
    }
}
