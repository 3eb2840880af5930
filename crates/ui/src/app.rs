use std::cell::RefCell;
use std::rc::Rc;

use danmaku_core::{
    ClickOutcome, Clipboard, ClipboardError, CueSheet, Engine, EngineConfig, Host, OverlayId,
    OverlaySpec, Playback, SystemClock,
};
use danmaku_protocol::CursorIcon;
use eframe::egui;

use crate::renderer::{self, EguiMeasure};
use crate::theme::{self, ThemeMode};

const SEEK_SECS: f64 = 5.0;
/// Seconds a status message stays in the bottom bar.
const STATUS_SECS: f64 = 3.0;

/// Format playback seconds as `mm:ss`.
fn timestamp(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `#RRGGBB` for a picked color, the form stored records use.
fn hex(color: egui::Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

/// Panel actions queued by the engine callbacks, applied after the click
/// returns.
enum Pending {
    Like(OverlayId),
    Report(OverlayId),
}

/// Copies through egui's platform output.
pub struct EguiClipboard {
    ctx: egui::Context,
}

impl Clipboard for EguiClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.ctx.copy_text(text.to_string());
        Ok(())
    }
}

/// Desktop player: a simulated video timeline with the overlay surface on top.
pub struct PlayerApp {
    engine: Engine,
    playback: Playback,
    pending: Rc<RefCell<Vec<Pending>>>,
    theme_mode: ThemeMode,
    /// Send form.
    draft: String,
    draft_color: egui::Color32,
    status: Option<(String, f64)>,
    error: Option<String>,
    /// Last surface size handed to `Engine::init`.
    surface: egui::Vec2,
    pointer_inside: bool,
    last_time: Option<f64>,
}

impl PlayerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: EngineConfig, sheet: CueSheet) -> Self {
        cc.egui_ctx.set_visuals(theme::dark_visuals());
        let host = Host::new(SystemClock::new())
            .with_measure(EguiMeasure::new(cc.egui_ctx.clone()))
            .with_clipboard(EguiClipboard {
                ctx: cc.egui_ctx.clone(),
            });
        Self::with_host(config, host, sheet)
    }

    fn with_host(config: EngineConfig, host: Host, sheet: CueSheet) -> Self {
        let mut engine = Engine::new(config, host);
        let pending = Rc::new(RefCell::new(Vec::new()));
        let likes = Rc::clone(&pending);
        let reports = Rc::clone(&pending);
        engine.set_callbacks(
            Box::new(move |id: &OverlayId| likes.borrow_mut().push(Pending::Like(id.clone()))),
            Box::new(move |id: &OverlayId| reports.borrow_mut().push(Pending::Report(id.clone()))),
        );
        engine.start();

        let mut playback = Playback::new(sheet);
        playback.play(&mut engine);

        Self {
            engine,
            playback,
            pending,
            theme_mode: ThemeMode::Dark,
            draft: String::new(),
            draft_color: egui::Color32::WHITE,
            status: None,
            error: None,
            surface: egui::Vec2::ZERO,
            pointer_inside: false,
            last_time: None,
        }
    }

    fn load(&mut self, sheet: CueSheet) {
        tracing::info!(cues = sheet.len(), "cue sheet opened");
        self.engine.clear();
        self.playback = Playback::new(sheet);
        self.playback.play(&mut self.engine);
    }

    fn open_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Cue sheet", &["json"])
            .pick_file()
        else {
            return;
        };
        let loaded = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|data| CueSheet::from_json(&data).map_err(|e| e.to_string()));
        match loaded {
            Ok(sheet) => {
                self.error = None;
                self.load(sheet);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to open cue sheet");
                self.error = Some(format!("Failed to open {}: {e}", path.display()));
            }
        }
    }

    fn set_status(&mut self, text: String) {
        self.status = Some((text, self.last_time.unwrap_or(0.0)));
    }

    fn send(&mut self) {
        let text = self.draft.trim();
        if text.is_empty() {
            return;
        }
        let spec = OverlaySpec::new(text).color(hex(self.draft_color));
        self.playback.send(spec, &mut self.engine);
        self.draft.clear();
    }

    fn apply_pending(&mut self) {
        let pending: Vec<Pending> = self.pending.borrow_mut().drain(..).collect();
        for action in pending {
            match action {
                Pending::Like(id) => {
                    let likes = self
                        .engine
                        .overlays()
                        .iter()
                        .find(|o| o.identity.as_ref() == Some(&id))
                        .map_or(0, |o| o.like_count)
                        + 1;
                    self.engine.update_likes(&id, likes);
                    self.set_status(format!("Liked ({likes})"));
                }
                Pending::Report(id) => {
                    tracing::info!(%id, "overlay reported");
                    self.set_status("Reported".to_string());
                }
            }
        }
    }

    fn on_click(&mut self, outcome: ClickOutcome) {
        match outcome {
            ClickOutcome::VoiceToggled { .. } => {
                self.set_status("Voice playback is not available here".to_string());
            }
            // Likes and reports arrive through the callbacks; copy shows a toast.
            ClickOutcome::Liked(_) | ClickOutcome::Reported(_) | ClickOutcome::Copied { .. } => {}
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (space, left, right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        if space {
            self.playback.toggle(&mut self.engine);
        }
        if left {
            self.playback.seek_by(-SEEK_SECS, &mut self.engine);
        }
        if right {
            self.playback.seek_by(SEEK_SECS, &mut self.engine);
        }
    }

    fn surface_ui(&mut self, ui: &mut egui::Ui, dt: f64) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click());

        if rect.size() != self.surface {
            self.surface = rect.size();
            self.engine.set_dpr(f64::from(ui.ctx().pixels_per_point()));
            self.engine
                .init(f64::from(rect.width()), f64::from(rect.height()));
        }

        match response.hover_pos() {
            Some(pos) => {
                let local = pos - rect.min;
                self.engine.pointer_move(f64::from(local.x), f64::from(local.y));
                self.pointer_inside = true;
            }
            None if self.pointer_inside => {
                self.engine.pointer_leave();
                self.pointer_inside = false;
            }
            None => {}
        }

        if response.clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            let local = pos - rect.min;
            if let Some(outcome) = self.engine.click(f64::from(local.x), f64::from(local.y)) {
                self.on_click(outcome);
            }
            self.apply_pending();
        }

        self.playback.advance(dt, &mut self.engine);
        let out = self.engine.frame();
        renderer::render_commands(ui.painter(), &out.commands, rect.min, self.theme_mode);

        if out.cursor == CursorIcon::Pointer {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        if out.reschedule {
            ui.ctx().request_repaint();
        }
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        let dt = self.last_time.map_or(0.0, |t| now - t);
        self.last_time = Some(now);
        if self
            .status
            .as_ref()
            .is_some_and(|(_, at)| now - at > STATUS_SECS)
        {
            self.status = None;
        }

        self.handle_keys(ctx);

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("danmaku");
                ui.separator();

                if ui.button("📂 Open").clicked() {
                    self.open_dialog();
                }

                let play_label = if self.playback.is_playing() {
                    "⏸ Pause"
                } else {
                    "▶ Play"
                };
                if ui.button(play_label).clicked() {
                    self.playback.toggle(&mut self.engine);
                }

                let mut position = self.playback.position();
                let slider = ui.add(
                    egui::Slider::new(&mut position, 0.0..=self.playback.duration())
                        .show_value(false),
                );
                if slider.changed() {
                    self.playback.seek(position, &mut self.engine);
                }
                ui.label(format!(
                    "{} / {}",
                    timestamp(self.playback.position()),
                    timestamp(self.playback.duration())
                ));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_label = match self.theme_mode {
                        ThemeMode::Dark => "🌙 Dark",
                        ThemeMode::Light => "☀ Light",
                    };
                    if ui.button(theme_label).clicked() {
                        self.theme_mode = self.theme_mode.toggled();
                        ctx.set_visuals(theme::visuals(self.theme_mode));
                    }
                });
            });
        });

        // Send form and status
        egui::TopBottomPanel::bottom("send").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let edit = ui.add(
                    egui::TextEdit::singleline(&mut self.draft)
                        .hint_text("Send a danmaku")
                        .desired_width(320.0),
                );
                ui.color_edit_button_srgba(&mut self.draft_color);
                let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Send").clicked() || submitted {
                    self.send();
                }
                ui.separator();

                if let Some(err) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                } else if let Some((status, _)) = &self.status {
                    ui.label(status);
                } else {
                    ui.label(format!(
                        "{} on screen | {} cues",
                        self.engine.overlays().len(),
                        self.playback.sheet().len()
                    ));
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.surface_ui(ui, dt));
    }
}
