use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use danmaku_core::{
    ClickOutcome, CueSheet, Engine, EngineConfig, Host, OverlaySpec, Playback, SystemClock,
};
use danmaku_protocol::RenderCommand;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Rect, Size},
    style::{Color, Style},
    widgets::Block,
};

use crate::clipboard::SystemClipboard;
use crate::renderer::{self, CELL_H, CELL_W, CellMeasure};

const FRAME: Duration = Duration::from_millis(16);
const SEEK_SECS: f64 = 5.0;
const STATUS_TTL: Duration = Duration::from_secs(3);

const PALETTE: [(&str, &str); 6] = [
    ("white", "#FFFFFF"),
    ("red", "#FF5555"),
    ("yellow", "#F1FA8C"),
    ("green", "#50FA7B"),
    ("cyan", "#8BE9FD"),
    ("pink", "#FF79C6"),
];

/// Engine settings scaled to the terminal grid: one lane per row.
pub fn terminal_config() -> EngineConfig {
    let mut config = EngineConfig {
        lane_height: CELL_H,
        base_font_size: CELL_H,
        min_gap: 4.0 * CELL_W,
        voice_button_width: 2.0 * CELL_W,
        toast_font_size: CELL_H,
        ..EngineConfig::default()
    };
    config.panel.button_width = 7.0 * CELL_W;
    config.panel.button_height = CELL_H;
    config.panel.spacing = CELL_W;
    config.panel.padding = 0.0;
    config.panel.offset = 0.0;
    config.panel.font_size = CELL_H;
    config
}

pub fn run(config: EngineConfig, sheet: CueSheet) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = Player::new(config, sheet).run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

enum Mode {
    Watch,
    Compose(String),
}

struct Player {
    engine: Engine,
    playback: Playback,
    mode: Mode,
    color: usize,
    status: Option<(String, Instant)>,
    /// Overlay surface in terminal cells.
    area: Rect,
}

/// Rows between the header and the status line.
fn surface_area(size: Size) -> Rect {
    Rect::new(0, 1, size.width, size.height.saturating_sub(2))
}

fn timestamp(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

impl Player {
    fn new(config: EngineConfig, sheet: CueSheet) -> Self {
        let host = Host::new(SystemClock::new())
            .with_measure(CellMeasure)
            .with_clipboard(SystemClipboard::default());
        let mut engine = Engine::new(config, host);
        engine.start();
        let mut playback = Playback::new(sheet);
        playback.play(&mut engine);
        Self {
            engine,
            playback,
            mode: Mode::Watch,
            color: 0,
            status: None,
            area: Rect::default(),
        }
    }

    fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        let mut last = Instant::now();
        loop {
            let area = surface_area(terminal.size()?);
            if area != self.area {
                self.area = area;
                self.engine.init(
                    f64::from(area.width) * CELL_W,
                    f64::from(area.height) * CELL_H,
                );
            }

            let now = Instant::now();
            self.playback
                .advance((now - last).as_secs_f64(), &mut self.engine);
            last = now;
            let out = self.engine.frame();
            terminal.draw(|frame| self.draw(frame, &out.commands))?;

            let deadline = now + FRAME;
            while let Some(timeout) = deadline.checked_duration_since(Instant::now()) {
                if !event::poll(timeout)? {
                    break;
                }
                if self.handle(event::read()?) == Flow::Quit {
                    return Ok(());
                }
            }
        }
    }

    fn draw(&self, frame: &mut Frame, commands: &[RenderCommand]) {
        let full = frame.area();

        let header_area = Rect::new(0, 0, full.width, full.height.min(1));
        let state = if self.playback.is_playing() { "▶" } else { "⏸" };
        let header = Block::default()
            .title(format!(
                " danmaku {state} {} / {} | {} on screen | space play | ←→ seek | enter send | q quit ",
                timestamp(self.playback.position()),
                timestamp(self.playback.duration()),
                self.engine.overlays().len(),
            ))
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(header, header_area);

        renderer::draw_commands(frame.buffer_mut(), self.area, commands);

        if full.height < 2 {
            return;
        }
        let footer_area = Rect::new(0, full.height - 1, full.width, 1);
        let (name, hex) = PALETTE[self.color];
        let footer = match &self.mode {
            Mode::Compose(text) => {
                let fg = danmaku_protocol::Color::from_hex(hex)
                    .map(|c| {
                        let [r, g, b, _] = c.to_rgba8();
                        Color::Rgb(r, g, b)
                    })
                    .unwrap_or(Color::White);
                Block::default()
                    .title(format!(
                        " say ({name}): {text}█   tab color | enter send | esc cancel"
                    ))
                    .style(Style::default().fg(fg).bg(Color::Black))
            }
            Mode::Watch => {
                let message = self
                    .status
                    .as_ref()
                    .filter(|(_, at)| at.elapsed() < STATUS_TTL)
                    .map_or("", |(text, _)| text.as_str());
                Block::default()
                    .title(format!(" {message}"))
                    .style(Style::default().fg(Color::Gray).bg(Color::Black))
            }
        };
        frame.render_widget(footer, footer_area);
    }

    fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
            Event::Mouse(mouse) => {
                self.on_mouse(mouse);
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        if let Mode::Compose(text) = &mut self.mode {
            match key.code {
                KeyCode::Esc => self.mode = Mode::Watch,
                KeyCode::Enter => {
                    let text = text.trim().to_string();
                    self.mode = Mode::Watch;
                    if !text.is_empty() {
                        self.send(text);
                    }
                }
                KeyCode::Tab => self.color = (self.color + 1) % PALETTE.len(),
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) => text.push(c),
                _ => {}
            }
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char(' ') => self.playback.toggle(&mut self.engine),
            KeyCode::Left => self.playback.seek_by(-SEEK_SECS, &mut self.engine),
            KeyCode::Right => self.playback.seek_by(SEEK_SECS, &mut self.engine),
            KeyCode::Enter => self.mode = Mode::Compose(String::new()),
            _ => {}
        }
        Flow::Continue
    }

    /// Center of the cell under the mouse, in surface pixels.
    fn surface_point(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let a = self.area;
        let inside = column >= a.x && column < a.right() && row >= a.y && row < a.bottom();
        inside.then(|| {
            (
                f64::from(column - a.x) * CELL_W + CELL_W / 2.0,
                f64::from(row - a.y) * CELL_H + CELL_H / 2.0,
            )
        })
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        let Some((x, y)) = self.surface_point(mouse.column, mouse.row) else {
            self.engine.pointer_leave();
            return;
        };
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => self.engine.pointer_move(x, y),
            MouseEventKind::Down(MouseButton::Left) => {
                self.engine.pointer_move(x, y);
                if let Some(outcome) = self.engine.click(x, y) {
                    self.on_click(outcome);
                }
            }
            _ => {}
        }
    }

    fn on_click(&mut self, outcome: ClickOutcome) {
        let message = match outcome {
            ClickOutcome::Liked(id) => {
                let likes = self
                    .engine
                    .overlays()
                    .iter()
                    .find(|o| o.identity.as_ref() == Some(&id))
                    .map_or(0, |o| o.like_count);
                self.engine.update_likes(&id, likes + 1);
                format!("liked {id} ({})", likes + 1)
            }
            ClickOutcome::Copied { ok: true } => "copied to clipboard".to_string(),
            ClickOutcome::Copied { ok: false } => "clipboard unavailable".to_string(),
            ClickOutcome::Reported(id) => {
                tracing::info!(%id, "overlay reported");
                format!("reported {id}")
            }
            ClickOutcome::VoiceToggled { .. } => "voice playback is not available here".to_string(),
        };
        self.status = Some((message, Instant::now()));
    }

    fn send(&mut self, text: String) {
        let (_, hex) = PALETTE[self.color];
        let spec = OverlaySpec::new(text).color(hex);
        self.playback.send(spec, &mut self.engine);
        tracing::debug!(at = self.playback.position(), "overlay sent");
        self.status = Some(("sent".to_string(), Instant::now()));
    }
}
