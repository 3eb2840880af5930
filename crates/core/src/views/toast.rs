use danmaku_protocol::{Point, Rect, RenderCommand, SharedStr, TextAlign, ThemeToken, Viewport};

const PADDING_X: f64 = 12.0;
const MARGIN_BOTTOM: f64 = 24.0;

/// A short status message shown at the bottom of the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: SharedStr,
    /// Measured text width at `font_size`.
    pub text_width: f64,
    pub font_size: f64,
    pub expires_at: f64,
}

pub fn render_toast(toast: &Toast, viewport: &Viewport) -> Vec<RenderCommand> {
    let w = toast.text_width + 2.0 * PADDING_X;
    let h = toast.font_size * 2.0;
    let rect = Rect::new(
        (viewport.width - w) / 2.0,
        (viewport.height - h - MARGIN_BOTTOM).max(0.0),
        w,
        h,
    );

    vec![
        RenderCommand::DrawRect {
            rect,
            color: ThemeToken::ToastBackground,
            border_color: None,
            label: None,
        },
        RenderCommand::DrawText {
            position: Point::new(
                rect.x + rect.w / 2.0,
                rect.y + rect.h / 2.0 + toast.font_size / 3.0,
            ),
            text: toast.text.clone(),
            color: ThemeToken::ToastText,
            font_size: toast.font_size,
            align: TextAlign::Center,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_is_centered_horizontally() {
        let toast = Toast {
            text: "Copied".into(),
            text_width: 40.0,
            font_size: 14.0,
            expires_at: 0.0,
        };
        let cmds = render_toast(&toast, &Viewport::new(800.0, 300.0));
        let RenderCommand::DrawRect { rect, .. } = &cmds[0] else {
            panic!("expected toast box, got {cmds:?}");
        };
        assert!((rect.x + rect.w / 2.0 - 400.0).abs() < 1e-9);
        assert!(rect.bottom() <= 300.0);
    }
}
