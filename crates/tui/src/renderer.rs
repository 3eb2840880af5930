use danmaku_core::TextMeasure;
use danmaku_protocol::{Icon, Rect as SurfaceRect, RenderCommand, TextAlign, ThemeToken};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
};

/// Logical pixels covered by one terminal cell.
pub const CELL_W: f64 = 8.0;
pub const CELL_H: f64 = 16.0;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::OverlayOutline => Color::Black,
        ThemeToken::HoverHighlight => Color::Rgb(49, 50, 68),
        ThemeToken::HoverBorder => Color::Gray,
        ThemeToken::VoiceButtonBackground => Color::Rgb(40, 40, 40),
        ThemeToken::VoiceButtonIcon => Color::White,
        ThemeToken::PanelBackground => Color::Rgb(24, 24, 37),
        ThemeToken::PanelBorder => Color::Rgb(88, 91, 112),
        ThemeToken::PanelButton => Color::Rgb(69, 71, 90),
        ThemeToken::PanelText => Color::Rgb(205, 214, 244),
        ThemeToken::ToastBackground => Color::Rgb(30, 30, 30),
        ThemeToken::ToastText => Color::White,
    }
}

/// Display width of `text` in terminal cells.
pub fn cells(text: &str) -> usize {
    Line::raw(text).width()
}

fn char_cells(ch: char) -> usize {
    let mut utf8 = [0u8; 4];
    cells(ch.encode_utf8(&mut utf8))
}

/// Widths in whole cells, so overlay hit boxes line up with the grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMeasure;

impl TextMeasure for CellMeasure {
    fn measure(&self, text: &str, _font_size: f64) -> f64 {
        cells(text) as f64 * CELL_W
    }
}

/// Row holding a line of text whose baseline sits at `y`.
fn text_row(y: f64, font_size: f64) -> i64 {
    ((y - font_size * 0.4) / CELL_H).floor() as i64
}

struct Grid<'a> {
    buf: &'a mut Buffer,
    area: Rect,
}

impl Grid<'_> {
    /// Snap a surface rect to cells, clipped to the area. At least one cell
    /// wide and tall when it overlaps at all.
    fn cells_of(&self, rect: SurfaceRect) -> Option<Rect> {
        let x0 = (rect.x / CELL_W).round() as i64;
        let y0 = (rect.y / CELL_H).round() as i64;
        let x1 = ((rect.right() / CELL_W).round() as i64).max(x0 + 1);
        let y1 = ((rect.bottom() / CELL_H).round() as i64).max(y0 + 1);
        let (w, h) = (i64::from(self.area.width), i64::from(self.area.height));
        let (x0, y0, x1, y1) = (x0.max(0), y0.max(0), x1.min(w), y1.min(h));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect::new(
            self.area.x + x0 as u16,
            self.area.y + y0 as u16,
            (x1 - x0) as u16,
            (y1 - y0) as u16,
        ))
    }

    fn clear(&mut self, rect: SurfaceRect) {
        let Some(r) = self.cells_of(rect) else {
            return;
        };
        for y in r.top()..r.bottom() {
            for x in r.left()..r.right() {
                self.buf[(x, y)].reset();
            }
        }
    }

    fn fill(&mut self, rect: SurfaceRect, color: Color) {
        if let Some(r) = self.cells_of(rect) {
            self.buf.set_style(r, Style::default().bg(color));
        }
    }

    /// Write `text` starting at grid column `col`, dropping whatever falls
    /// off either side.
    fn text(&mut self, col: i64, row: i64, text: &str, style: Style) {
        if row < 0 || row >= i64::from(self.area.height) {
            return;
        }
        let mut col = col;
        let mut rest = text;
        let mut chars = text.chars();
        while col < 0 {
            let Some(ch) = chars.next() else {
                return;
            };
            col += char_cells(ch) as i64;
            rest = chars.as_str();
        }
        let width = i64::from(self.area.width);
        if col >= width {
            return;
        }
        self.buf.set_stringn(
            self.area.x + col as u16,
            self.area.y + row as u16,
            rest,
            (width - col) as usize,
            style,
        );
    }
}

/// Paint one frame of render commands into `area` of the buffer.
pub fn draw_commands(buf: &mut Buffer, area: Rect, commands: &[RenderCommand]) {
    let mut grid = Grid { buf, area };
    for cmd in commands {
        match cmd {
            RenderCommand::ClearRect { rect } => grid.clear(*rect),
            RenderCommand::DrawRect {
                rect, color, label, ..
            } => {
                grid.fill(*rect, theme_to_color(*color));
                if let Some(label) = label {
                    let col = ((rect.x + rect.w / 2.0) / CELL_W).round() as i64
                        - (cells(label) / 2) as i64;
                    let row = ((rect.y + rect.h / 2.0) / CELL_H).floor() as i64;
                    let style = Style::default().fg(theme_to_color(ThemeToken::PanelText));
                    grid.text(col, row, label, style);
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let anchor = (position.x / CELL_W).round() as i64;
                let width = cells(text) as i64;
                let col = match align {
                    TextAlign::Left => anchor,
                    TextAlign::Center => anchor - width / 2,
                    TextAlign::Right => anchor - width,
                };
                let style = Style::default().fg(theme_to_color(*color));
                grid.text(col, text_row(position.y, *font_size), text, style);
            }
            RenderCommand::DrawOverlayText {
                position,
                text,
                fill,
                font_size,
                bold,
                ..
            } => {
                let [r, g, b, _] = fill.to_rgba8();
                let mut style = Style::default().fg(Color::Rgb(r, g, b));
                if *bold {
                    style = style.add_modifier(Modifier::BOLD);
                }
                let col = (position.x / CELL_W).round() as i64;
                grid.text(col, text_row(position.y, *font_size), text, style);
            }
            RenderCommand::DrawIcon { rect, icon, color } => {
                let symbol = match icon {
                    Icon::Play => "▶",
                    Icon::Pause => "■",
                };
                let col = ((rect.x + rect.w / 2.0) / CELL_W).floor() as i64;
                let row = ((rect.y + rect.h / 2.0) / CELL_H).floor() as i64;
                grid.text(col, row, symbol, Style::default().fg(theme_to_color(*color)));
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku_protocol::{Color as Fill, Point};

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    fn overlay_text(x: f64, y: f64, text: &str) -> RenderCommand {
        RenderCommand::DrawOverlayText {
            position: Point::new(x, y),
            text: text.into(),
            fill: Fill::WHITE,
            outline: ThemeToken::OverlayOutline,
            font_size: CELL_H,
            bold: true,
            opacity: 1.0,
        }
    }

    #[test]
    fn measure_counts_wide_glyphs_twice() {
        assert!((CellMeasure.measure("ab", 24.0) - 16.0).abs() < f64::EPSILON);
        assert!((CellMeasure.measure("弹幕", 24.0) - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overlay_text_lands_on_its_lane_row() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        // Second lane: baseline at lane * 16 + 8 + 8.
        draw_commands(&mut buf, area, &[overlay_text(16.0, 32.0, "hi")]);
        assert_eq!(row_text(&buf, 1).trim(), "hi");
        assert!(buf[(2, 1)].modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn text_is_clipped_at_the_left_edge() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        draw_commands(&mut buf, area, &[overlay_text(-16.0, 16.0, "hello")]);
        assert_eq!(row_text(&buf, 0).trim_end(), "llo");
    }

    #[test]
    fn clear_resets_cells() {
        let area = Rect::new(0, 1, 4, 2);
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 3));
        draw_commands(&mut buf, area, &[overlay_text(0.0, 16.0, "abcd")]);
        assert_eq!(row_text(&buf, 1), "abcd");
        let clear = RenderCommand::ClearRect {
            rect: SurfaceRect::new(0.0, 0.0, 32.0, 32.0),
        };
        draw_commands(&mut buf, area, &[clear]);
        assert_eq!(row_text(&buf, 1), "    ");
    }
}
