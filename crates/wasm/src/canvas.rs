use danmaku_core::TextMeasure;
use danmaku_core::host::ApproxMeasure;
use danmaku_protocol::{Icon, Rect, RenderCommand, TextAlign, ThemeToken};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Stroke width of the dark outline around overlay text.
const OUTLINE_WIDTH: f64 = 3.0;

fn css(token: ThemeToken) -> &'static str {
    use ThemeToken::*;
    match token {
        OverlayOutline => "#000000",
        HoverHighlight => "rgba(255, 255, 255, 0.12)",
        HoverBorder => "rgba(255, 255, 255, 0.6)",
        VoiceButtonBackground => "rgba(0, 0, 0, 0.55)",
        VoiceButtonIcon => "#ffffff",
        PanelBackground => "rgba(24, 24, 37, 0.92)",
        PanelBorder => "rgba(205, 214, 244, 0.35)",
        PanelButton => "rgba(69, 71, 90, 0.95)",
        PanelText => "#cdd6f4",
        ToastBackground => "rgba(0, 0, 0, 0.75)",
        ToastText => "#ffffff",
    }
}

fn font(size: f64, family: &str, bold: bool) -> String {
    if bold {
        format!("bold {size}px {family}")
    } else {
        format!("{size}px {family}")
    }
}

fn report(result: Result<(), JsValue>) {
    if let Err(err) = result {
        web_sys::console::warn_2(&"danmaku: canvas call failed".into(), &err);
    }
}

/// Replays render commands onto a 2D canvas context.
pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    family: String,
}

impl CanvasRenderer {
    pub fn new(ctx: CanvasRenderingContext2d, family: &str) -> Self {
        Self {
            ctx,
            family: family.to_string(),
        }
    }

    /// Map logical pixels onto a backing store `dpr` times larger.
    pub fn set_scale(&self, dpr: f64) {
        report(self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0));
    }

    pub fn draw(&self, commands: &[RenderCommand]) {
        let ctx = &self.ctx;
        for cmd in commands {
            match cmd {
                RenderCommand::ClearRect { rect } => {
                    ctx.clear_rect(rect.x, rect.y, rect.w, rect.h);
                }
                RenderCommand::DrawRect {
                    rect,
                    color,
                    border_color,
                    label,
                } => {
                    ctx.set_fill_style_str(css(*color));
                    ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
                    if let Some(border) = border_color {
                        ctx.set_line_width(1.0);
                        ctx.set_stroke_style_str(css(*border));
                        ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
                    }
                    if let Some(label) = label {
                        let size = (rect.h * 0.6).max(8.0);
                        ctx.set_font(&font(size, &self.family, false));
                        ctx.set_text_align("center");
                        ctx.set_fill_style_str(css(ThemeToken::PanelText));
                        report(ctx.fill_text(
                            label,
                            rect.x + rect.w / 2.0,
                            rect.y + rect.h / 2.0 + size / 3.0,
                        ));
                    }
                }
                RenderCommand::DrawText {
                    position,
                    text,
                    color,
                    font_size,
                    align,
                } => {
                    ctx.set_font(&font(*font_size, &self.family, false));
                    ctx.set_text_align(match align {
                        TextAlign::Left => "left",
                        TextAlign::Center => "center",
                        TextAlign::Right => "right",
                    });
                    ctx.set_fill_style_str(css(*color));
                    report(ctx.fill_text(text, position.x, position.y));
                }
                RenderCommand::DrawOverlayText {
                    position,
                    text,
                    fill,
                    outline,
                    font_size,
                    bold,
                    opacity,
                } => {
                    ctx.save();
                    ctx.set_global_alpha(*opacity);
                    ctx.set_font(&font(*font_size, &self.family, *bold));
                    ctx.set_text_align("left");
                    ctx.set_line_join("round");
                    ctx.set_line_width(OUTLINE_WIDTH);
                    ctx.set_stroke_style_str(css(*outline));
                    report(ctx.stroke_text(text, position.x, position.y));
                    ctx.set_fill_style_str(&fill.to_css());
                    report(ctx.fill_text(text, position.x, position.y));
                    ctx.restore();
                }
                RenderCommand::DrawIcon { rect, icon, color } => {
                    ctx.set_fill_style_str(css(*color));
                    draw_icon(ctx, *rect, *icon);
                }
                RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
            }
        }
    }
}

fn draw_icon(ctx: &CanvasRenderingContext2d, rect: Rect, icon: Icon) {
    match icon {
        Icon::Play => {
            ctx.begin_path();
            ctx.move_to(rect.x, rect.y);
            ctx.line_to(rect.right(), rect.y + rect.h / 2.0);
            ctx.line_to(rect.x, rect.bottom());
            ctx.close_path();
            ctx.fill();
        }
        Icon::Pause => ctx.fill_rect(rect.x, rect.y, rect.w, rect.h),
    }
}

/// Text metrics from the canvas itself, so hit boxes match drawn glyphs.
pub struct CanvasMeasure {
    ctx: CanvasRenderingContext2d,
    family: String,
    bold: bool,
}

impl CanvasMeasure {
    pub fn new(ctx: CanvasRenderingContext2d, family: &str, bold: bool) -> Self {
        Self {
            ctx,
            family: family.to_string(),
            bold,
        }
    }
}

impl TextMeasure for CanvasMeasure {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        self.ctx.set_font(&font(font_size, &self.family, self.bold));
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(err) => {
                web_sys::console::warn_2(&"danmaku: measureText failed".into(), &err);
                ApproxMeasure::default().measure(text, font_size)
            }
        }
    }
}
