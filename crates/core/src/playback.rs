//! A simulated playback timeline for hosts without a real video element.
//!
//! Mirrors what a video player does to the engine: play resumes it, pause
//! pauses it, a seek clears it, and crossing a cue's time emits the cue.

use crate::engine::Engine;
use crate::feed::{Cue, CueSheet};
use crate::model::{OverlayKey, OverlaySpec};

/// Seconds of timeline kept after the last cue.
const TAIL_SECS: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct Playback {
    sheet: CueSheet,
    position: f64,
    duration: f64,
    playing: bool,
}

impl Playback {
    /// A paused timeline at zero, long enough to show every cue.
    pub fn new(sheet: CueSheet) -> Self {
        let last = sheet.cues().last().map_or(0.0, |c| c.time.max(0.0));
        Self {
            sheet,
            position: 0.0,
            duration: last + TAIL_SECS,
            playing: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn sheet(&self) -> &CueSheet {
        &self.sheet
    }

    pub fn play(&mut self, engine: &mut Engine) {
        if self.position >= self.duration {
            self.seek(0.0, engine);
        }
        self.playing = true;
        engine.resume();
    }

    pub fn pause(&mut self, engine: &mut Engine) {
        self.playing = false;
        engine.pause();
    }

    pub fn toggle(&mut self, engine: &mut Engine) {
        if self.playing {
            self.pause(engine);
        } else {
            self.play(engine);
        }
    }

    /// Jump to `time` (clamped to the timeline). Overlays on screen belong to
    /// the old position, so the engine is cleared.
    pub fn seek(&mut self, time: f64, engine: &mut Engine) {
        let time = time.clamp(0.0, self.duration);
        engine.clear();
        self.sheet.seek(time);
        self.position = time;
        tracing::debug!(time, "playback seeked");
    }

    pub fn seek_by(&mut self, delta: f64, engine: &mut Engine) {
        self.seek(self.position + delta, engine);
    }

    /// Move the timeline forward by `dt` seconds of wall time and emit the
    /// cues crossed. Returns how many were emitted.
    pub fn advance(&mut self, dt: f64, engine: &mut Engine) -> usize {
        if !self.playing {
            return 0;
        }
        self.position = (self.position + dt.max(0.0)).min(self.duration);
        let due = self.sheet.advance(self.position);
        let emitted = due.len();
        for spec in due {
            engine.add(spec);
        }
        if self.position >= self.duration {
            tracing::debug!("playback reached the end");
            self.pause(engine);
        }
        emitted
    }

    /// Emit a locally composed overlay now and keep it on the timeline at the
    /// current position.
    pub fn send(&mut self, spec: OverlaySpec, engine: &mut Engine) -> OverlayKey {
        self.sheet.insert(Cue::new(self.position, spec.clone()));
        if self.position + TAIL_SECS > self.duration {
            self.duration = self.position + TAIL_SECS;
        }
        engine.add(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::EngineState;
    use crate::host::{Host, ManualClock};

    fn setup(times: &[f64]) -> (Engine, Playback) {
        let mut engine = Engine::new(EngineConfig::default(), Host::new(ManualClock::new(0.0)));
        engine.init(800.0, 300.0);
        engine.start();
        let cues = times
            .iter()
            .map(|&t| Cue::new(t, OverlaySpec::new(format!("at {t}"))))
            .collect();
        (engine, Playback::new(CueSheet::new(cues)))
    }

    #[test]
    fn nothing_emits_while_paused() {
        let (mut engine, mut playback) = setup(&[0.0, 1.0]);
        assert_eq!(playback.advance(5.0, &mut engine), 0);
        assert!(engine.overlays().is_empty());
        assert!((playback.position()).abs() < f64::EPSILON);
    }

    #[test]
    fn play_then_pause_drives_engine_state() {
        let (mut engine, mut playback) = setup(&[0.5]);
        playback.pause(&mut engine);
        assert_eq!(engine.state(), EngineState::Paused);
        playback.toggle(&mut engine);
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(playback.advance(1.0, &mut engine), 1);
        assert_eq!(engine.overlays().len(), 1);
    }

    #[test]
    fn seek_clears_the_screen() {
        let (mut engine, mut playback) = setup(&[0.5, 4.0]);
        playback.play(&mut engine);
        playback.advance(1.0, &mut engine);
        assert_eq!(engine.overlays().len(), 1);
        playback.seek_by(2.5, &mut engine);
        assert!(engine.overlays().is_empty());
        assert!((playback.position() - 3.5).abs() < 1e-9);
        assert_eq!(playback.advance(1.0, &mut engine), 1);
    }

    #[test]
    fn stops_at_the_end() {
        let (mut engine, mut playback) = setup(&[1.0]);
        playback.play(&mut engine);
        playback.advance(60.0, &mut engine);
        assert!(!playback.is_playing());
        assert!((playback.position() - playback.duration()).abs() < f64::EPSILON);
        playback.play(&mut engine);
        assert!(playback.position().abs() < f64::EPSILON);
    }

    #[test]
    fn sent_overlay_is_not_replayed() {
        let (mut engine, mut playback) = setup(&[5.0]);
        playback.play(&mut engine);
        playback.advance(2.0, &mut engine);
        playback.send(OverlaySpec::new("hi"), &mut engine);
        assert_eq!(engine.overlays().len(), 1);
        assert_eq!(playback.sheet().len(), 2);
        assert_eq!(playback.advance(0.5, &mut engine), 0);
        assert_eq!(engine.overlays().len(), 1);
    }
}
