use danmaku_core::TextMeasure;
use danmaku_protocol::{Icon, RenderCommand, TextAlign};
use egui::{Align2, Color32, CornerRadius, FontId, Pos2, Rect, Stroke, StrokeKind};

use crate::theme::{self, ThemeMode};

/// Offsets the outline is stamped at around overlay text.
const OUTLINE: [(f32, f32); 8] = [
    (-1.5, -1.5),
    (0.0, -1.5),
    (1.5, -1.5),
    (-1.5, 0.0),
    (1.5, 0.0),
    (-1.5, 1.5),
    (0.0, 1.5),
    (1.5, 1.5),
];

/// Share of the font size that hangs below the baseline.
const DESCENT: f32 = 0.22;

fn to_rect(r: danmaku_protocol::Rect, offset: Pos2) -> Rect {
    Rect::from_min_size(
        Pos2::new(r.x as f32 + offset.x, r.y as f32 + offset.y),
        egui::vec2(r.w as f32, r.h as f32),
    )
}

fn fade(opacity: f64) -> f32 {
    opacity.clamp(0.0, 1.0) as f32
}

fn literal(color: danmaku_protocol::Color, opacity: f64) -> Color32 {
    let [r, g, b, a] = color.to_rgba8();
    Color32::from_rgba_unmultiplied(r, g, b, a).gamma_multiply(fade(opacity))
}

/// Render a list of `RenderCommand` into an egui `Painter`.
///
/// `offset` is the top-left pixel position of the overlay surface.
pub fn render_commands(
    painter: &egui::Painter,
    commands: &[RenderCommand],
    offset: Pos2,
    mode: ThemeMode,
) {
    for cmd in commands {
        match cmd {
            RenderCommand::ClearRect { rect } => {
                let stage = theme::stage(mode);
                painter.rect_filled(to_rect(*rect, offset), CornerRadius::ZERO, stage);
            }

            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
            } => {
                let egui_rect = to_rect(*rect, offset);
                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }
                let fill = theme::resolve(*color, mode);
                painter.rect_filled(egui_rect, CornerRadius::same(3), fill);
                if let Some(bc) = border_color {
                    painter.rect_stroke(
                        egui_rect,
                        CornerRadius::same(3),
                        Stroke::new(1.0, theme::resolve(*bc, mode)),
                        StrokeKind::Inside,
                    );
                }
                if let Some(label) = label {
                    painter.text(
                        egui_rect.center(),
                        Align2::CENTER_CENTER,
                        label.as_ref(),
                        FontId::proportional((egui_rect.height() * 0.6).max(8.0)),
                        theme::resolve(danmaku_protocol::ThemeToken::PanelText, mode),
                    );
                }
            }

            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let size = *font_size as f32;
                let anchor = match align {
                    TextAlign::Left => Align2::LEFT_BOTTOM,
                    TextAlign::Center => Align2::CENTER_BOTTOM,
                    TextAlign::Right => Align2::RIGHT_BOTTOM,
                };
                let baseline = Pos2::new(
                    position.x as f32 + offset.x,
                    position.y as f32 + offset.y + size * DESCENT,
                );
                painter.text(
                    baseline,
                    anchor,
                    text.as_ref(),
                    FontId::proportional(size),
                    theme::resolve(*color, mode),
                );
            }

            RenderCommand::DrawOverlayText {
                position,
                text,
                fill,
                outline,
                font_size,
                opacity,
                ..
            } => {
                let size = *font_size as f32;
                let origin = Pos2::new(
                    position.x as f32 + offset.x,
                    position.y as f32 + offset.y + size * DESCENT,
                );
                let font = FontId::proportional(size);
                let stroke = theme::resolve(*outline, mode).gamma_multiply(fade(*opacity));
                for (dx, dy) in OUTLINE {
                    painter.text(
                        origin + egui::vec2(dx, dy),
                        Align2::LEFT_BOTTOM,
                        text.as_ref(),
                        font.clone(),
                        stroke,
                    );
                }
                painter.text(
                    origin,
                    Align2::LEFT_BOTTOM,
                    text.as_ref(),
                    font,
                    literal(*fill, *opacity),
                );
            }

            RenderCommand::DrawIcon { rect, icon, color } => {
                let r = to_rect(*rect, offset);
                let fill = theme::resolve(*color, mode);
                match icon {
                    Icon::Play => {
                        painter.add(egui::Shape::convex_polygon(
                            vec![r.left_top(), r.right_center(), r.left_bottom()],
                            fill,
                            Stroke::NONE,
                        ));
                    }
                    Icon::Pause => {
                        painter.rect_filled(r, CornerRadius::ZERO, fill);
                    }
                }
            }

            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {
                // Groups are semantic; no visual effect in egui
            }
        }
    }
}

/// Text widths from egui's own font atlas, so hit boxes match painted glyphs.
pub struct EguiMeasure {
    ctx: egui::Context,
}

impl EguiMeasure {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl TextMeasure for EguiMeasure {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        let painter = egui::Painter::new(
            self.ctx.clone(),
            egui::LayerId::background(),
            Rect::EVERYTHING,
        );
        let galley = painter.layout_no_wrap(
            text.to_string(),
            FontId::proportional(font_size as f32),
            Color32::WHITE,
        );
        f64::from(galley.size().x)
    }
}
