use danmaku_protocol::{Color, CursorIcon, Point, RenderCommand, Viewport};

use crate::config::EngineConfig;
use crate::host::Host;
use crate::interaction::{
    self, ActionPanel, ClickOutcome, HoverState, PanelAction, PointerInput, Transition,
};
use crate::model::{
    AllocPolicy, LaneTable, Overlay, OverlayId, OverlayKey, OverlaySpec, glyph_size_for,
};
use crate::views::{self, Toast};
use crate::voice::VoiceAttachment;

/// Called with the identity of the overlay a panel action targeted.
pub type ActionCallback = Box<dyn FnMut(&OverlayId)>;

/// Whether the host should keep driving frames, and whether they move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Paused,
}

/// Result of one frame.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub commands: Vec<RenderCommand>,
    pub cursor: CursorIcon,
    /// Schedule another frame. False once the engine is stopped.
    pub reschedule: bool,
}

/// The overlay engine: lane table, live overlays, hover and the action panel.
///
/// The host owns scheduling. It calls [`Engine::frame`] once per display
/// refresh while [`FrameOutput::reschedule`] is true and forwards pointer
/// events as they arrive.
pub struct Engine {
    config: EngineConfig,
    viewport: Viewport,
    lanes: LaneTable,
    /// Insertion order, which is also paint order.
    overlays: Vec<Overlay>,
    next_key: u64,
    running: bool,
    paused: bool,
    hover: HoverState,
    panel: Option<ActionPanel>,
    pointer: Option<Point>,
    toast: Option<Toast>,
    on_like: Option<ActionCallback>,
    on_report: Option<ActionCallback>,
    host: Host,
}

impl Engine {
    /// An engine with an empty surface. Call [`Engine::init`] once the
    /// surface size is known.
    pub fn new(config: EngineConfig, host: Host) -> Self {
        let viewport = Viewport::new(0.0, 0.0);
        Self {
            lanes: LaneTable::new(&viewport, config.lane_height),
            config,
            viewport,
            overlays: Vec::new(),
            next_key: 0,
            running: false,
            paused: false,
            hover: HoverState::Idle,
            panel: None,
            pointer: None,
            toast: None,
            on_like: None,
            on_report: None,
            host,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Size the surface and rebuild the lane table. Live overlays keep their
    /// lane index and position even if the lane no longer exists.
    pub fn init(&mut self, width: f64, height: f64) {
        let dpr = self.viewport.dpr;
        self.viewport = Viewport { width, height, dpr };
        self.lanes = LaneTable::new(&self.viewport, self.config.lane_height);
        if let Some(target) = self.panel.as_ref().map(|panel| panel.target)
            && let Some(overlay) = self.overlays.iter().find(|o| o.key == target)
        {
            self.panel = Some(ActionPanel::anchored(
                overlay.key,
                overlay.bounds(),
                &self.viewport,
                &self.config.panel,
            ));
        }
        tracing::debug!(width, height, lanes = self.lanes.len(), "surface initialized");
    }

    /// Record the device pixel ratio hosts use to size the backing store.
    pub fn set_dpr(&mut self, dpr: f64) {
        self.viewport.dpr = dpr;
    }

    pub fn start(&mut self) {
        if !self.running {
            tracing::debug!(paused = self.paused, "engine started");
        }
        self.running = true;
    }

    /// Stop asking for frames. Overlays stay where they are.
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!("engine stopped");
        }
        self.running = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn state(&self) -> EngineState {
        match (self.running, self.paused) {
            (false, _) => EngineState::Stopped,
            (true, true) => EngineState::Paused,
            (true, false) => EngineState::Running,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drop every overlay and forget lane occupancy. Running and paused flags
    /// are left alone.
    pub fn clear(&mut self) {
        let dropped = self.overlays.len();
        self.overlays.clear();
        self.lanes.reset();
        self.hover = HoverState::Idle;
        self.panel = None;
        tracing::debug!(dropped, "overlays cleared");
    }

    /// Emit one overlay at the right edge.
    pub fn add(&mut self, spec: OverlaySpec) -> OverlayKey {
        let key = OverlayKey(self.next_key);
        self.next_key += 1;

        let color = Color::from_hex(&spec.color).unwrap_or_else(|err| {
            tracing::warn!(%err, "invalid overlay color, drawing white");
            Color::WHITE
        });

        let voice = match (spec.is_voice, spec.audio_url.as_deref()) {
            (true, Some(src)) if !src.is_empty() => {
                Some(VoiceAttachment::open(self.host.audio.as_mut(), src))
            }
            (true, _) => {
                tracing::warn!(key = key.0, "voice overlay without audio url, drawing as text");
                None
            }
            (false, _) => None,
        };
        let button_width = if voice.is_some() {
            self.config.voice_button_width
        } else {
            0.0
        };

        let glyph_size = glyph_size_for(self.config.base_font_size, spec.like_count);
        let width = self.measure_width(&spec.text, glyph_size, button_width);
        let now = self.host.clock.now_ms();
        let policy = self.alloc_policy();
        let lane = self.lanes.allocate(key, width, now, &policy);
        let y = self.lanes.baseline(lane, glyph_size);

        tracing::debug!(key = key.0, lane, width, "overlay emitted");
        self.overlays.push(Overlay {
            key,
            text: spec.text.into(),
            color,
            motion: spec.kind,
            lane,
            x: self.viewport.width,
            y,
            speed: self.config.speed,
            like_count: spec.like_count,
            glyph_size,
            width,
            opacity: 1.0,
            identity: spec.id,
            voice,
            frozen: false,
            button_width,
        });
        key
    }

    /// Set the like count of every live overlay with `identity`, resizing
    /// their glyphs. Returns how many overlays changed.
    pub fn update_likes(&mut self, identity: &OverlayId, like_count: u32) -> usize {
        let target = self.hover.target();
        let mut updated = 0;
        for overlay in self
            .overlays
            .iter_mut()
            .filter(|o| o.identity.as_ref() == Some(identity))
        {
            overlay.like_count = like_count;
            overlay.glyph_size = glyph_size_for(self.config.base_font_size, like_count);
            overlay.width = (self.host.measure.measure(&overlay.text, overlay.glyph_size)
                + overlay.button_width)
                .max(1.0);
            self.lanes.resize(overlay.lane, overlay.key, overlay.width);
            if target == Some(overlay.key) {
                self.panel = Some(ActionPanel::anchored(
                    overlay.key,
                    overlay.bounds(),
                    &self.viewport,
                    &self.config.panel,
                ));
            }
            updated += 1;
        }
        tracing::debug!(%identity, like_count, updated, "likes updated");
        updated
    }

    pub fn set_callbacks(&mut self, on_like: ActionCallback, on_report: ActionCallback) {
        self.on_like = Some(on_like);
        self.on_report = Some(on_report);
    }

    /// Advance one frame and paint it.
    pub fn frame(&mut self) -> FrameOutput {
        let now = self.host.clock.now_ms();
        self.tick(now);
        FrameOutput {
            commands: self.render(),
            cursor: self.cursor(),
            reschedule: self.running,
        }
    }

    /// Paint the current state without advancing.
    pub fn render(&self) -> Vec<RenderCommand> {
        views::render_frame(
            &self.viewport,
            &self.overlays,
            self.hover.target(),
            self.panel.as_ref(),
            self.toast.as_ref(),
            &self.config,
        )
    }

    fn tick(&mut self, now: f64) {
        let expired = interaction::expire(self.hover, now);
        self.apply(expired);

        if self.running && !self.paused {
            for overlay in self.overlays.iter_mut().filter(|o| !o.frozen) {
                overlay.x -= overlay.speed;
                self.lanes.track(overlay.lane, overlay.key, overlay.x);
            }
        }

        self.overlays.retain(|o| {
            let exited = o.has_exited();
            if exited {
                tracing::debug!(key = o.key.0, "overlay exited");
            }
            !exited
        });
        if let Some(target) = self.hover.target()
            && !self.overlays.iter().any(|o| o.key == target)
        {
            self.hover = HoverState::Idle;
            self.panel = None;
        }

        for voice in self.overlays.iter_mut().filter_map(|o| o.voice.as_mut()) {
            if voice.poll() {
                tracing::debug!(src = voice.src(), "voice playback finished");
            }
        }

        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
        }

        if let Some(p) = self.pointer {
            self.evaluate_hover(p, now);
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let p = Point::new(x, y);
        self.pointer = Some(p);
        let now = self.host.clock.now_ms();
        self.evaluate_hover(p, now);
    }

    /// The pointer left the render surface.
    pub fn pointer_leave(&mut self) {
        self.pointer = None;
        let now = self.host.clock.now_ms();
        let t = interaction::step(
            self.hover,
            PointerInput::Left,
            now,
            self.config.hover_grace_ms,
        );
        self.apply(t);
    }

    /// Route a click: panel buttons first, then voice toggles front to back.
    pub fn click(&mut self, x: f64, y: f64) -> Option<ClickOutcome> {
        let p = Point::new(x, y);
        if let Some(panel) = &self.panel
            && panel.contains(p)
        {
            let target = panel.target;
            let action = panel.button_at(p)?;
            return self.run_action(action, target);
        }

        let overlay = self
            .overlays
            .iter_mut()
            .rev()
            .find(|o| o.voice_button().is_some_and(|r| r.contains(p)))?;
        let key = overlay.key;
        let playing = overlay.voice.as_mut()?.toggle();
        Some(ClickOutcome::VoiceToggled { key, playing })
    }

    pub fn cursor(&self) -> CursorIcon {
        let over_voice = self.pointer.is_some_and(|p| {
            self.overlays
                .iter()
                .any(|o| o.voice_button().is_some_and(|r| r.contains(p)))
        });
        let over_panel = self
            .pointer
            .zip(self.panel.as_ref())
            .is_some_and(|(p, panel)| panel.contains(p));
        if matches!(self.hover, HoverState::Hovered(_)) || over_panel || over_voice {
            CursorIcon::Pointer
        } else {
            CursorIcon::Default
        }
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay(&self, key: OverlayKey) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.key == key)
    }

    pub fn lanes(&self) -> &LaneTable {
        &self.lanes
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn panel(&self) -> Option<&ActionPanel> {
        self.panel.as_ref()
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    fn alloc_policy(&self) -> AllocPolicy {
        AllocPolicy {
            min_gap: self.config.min_gap,
            staleness_ms: self.config.staleness_ms,
        }
    }

    fn measure_width(&self, text: &str, glyph_size: f64, button_width: f64) -> f64 {
        (self.host.measure.measure(text, glyph_size) + button_width).max(1.0)
    }

    fn evaluate_hover(&mut self, p: Point, now: f64) {
        let in_panel = self.panel.as_ref().is_some_and(|panel| panel.contains(p));
        let hit = interaction::hit_test(&self.overlays, p).map(|o| (o.key, o.is_interactive()));
        let t = interaction::step(
            self.hover,
            PointerInput::Over { hit, in_panel },
            now,
            self.config.hover_grace_ms,
        );
        self.apply(t);
    }

    fn apply(&mut self, t: Transition) {
        if let Some(key) = t.release {
            if let Some(overlay) = self.overlays.iter_mut().find(|o| o.key == key) {
                overlay.frozen = false;
            }
            self.panel = None;
        }
        if let Some(key) = t.capture
            && let Some(overlay) = self.overlays.iter_mut().find(|o| o.key == key)
        {
            overlay.frozen = true;
            self.panel = Some(ActionPanel::anchored(
                key,
                overlay.bounds(),
                &self.viewport,
                &self.config.panel,
            ));
        }
        if t.next != self.hover {
            tracing::debug!(from = ?self.hover, to = ?t.next, "hover changed");
        }
        self.hover = t.next;
    }

    fn run_action(&mut self, action: PanelAction, target: OverlayKey) -> Option<ClickOutcome> {
        let overlay = self.overlays.iter().find(|o| o.key == target)?;
        let identity = overlay.identity.clone()?;
        match action {
            PanelAction::Like => {
                match self.on_like.as_mut() {
                    Some(on_like) => on_like(&identity),
                    None => tracing::debug!(%identity, "like without a handler"),
                }
                Some(ClickOutcome::Liked(identity))
            }
            PanelAction::Report => {
                match self.on_report.as_mut() {
                    Some(on_report) => on_report(&identity),
                    None => tracing::debug!(%identity, "report without a handler"),
                }
                Some(ClickOutcome::Reported(identity))
            }
            PanelAction::Copy => {
                let text = overlay.text.clone();
                let ok = match self.host.clipboard.write_text(&text) {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!(%err, "copy to clipboard failed");
                        false
                    }
                };
                self.show_toast(if ok { "Copied" } else { "Copy failed" });
                Some(ClickOutcome::Copied { ok })
            }
        }
    }

    fn show_toast(&mut self, text: &str) {
        let font_size = self.config.toast_font_size;
        self.toast = Some(Toast {
            text: text.into(),
            text_width: self.host.measure.measure(text, font_size),
            font_size,
            expires_at: self.host.clock.now_ms() + self.config.toast_ms,
        });
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("viewport", &self.viewport)
            .field("state", &self.state())
            .field("overlays", &self.overlays.len())
            .field("hover", &self.hover)
            .finish_non_exhaustive()
    }
}
