//! Timed overlay records for a playback timeline.
//!
//! The engine only knows "emit this now". A [`CueSheet`] sits on the caller
//! side and turns a moving playback position into those calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::OverlaySpec;

/// One stored record: when to emit, and what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Playback time in seconds.
    pub time: f64,
    #[serde(flatten)]
    pub spec: OverlaySpec,
}

impl Cue {
    pub fn new(time: f64, spec: OverlaySpec) -> Self {
        Self { time, spec }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid cue sheet JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CueDocument {
    Wrapped { danmakus: Vec<Cue> },
    Bare(Vec<Cue>),
}

/// Cues sorted by time plus a cursor into them.
#[derive(Debug, Clone)]
pub struct CueSheet {
    cues: Vec<Cue>,
    /// Index of the first cue not yet emitted.
    next: usize,
    position: f64,
}

impl CueSheet {
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self {
            cues,
            next: 0,
            position: f64::NEG_INFINITY,
        }
    }

    /// Parse either a bare array of records or `{"danmakus": [...]}`.
    pub fn from_json(data: &[u8]) -> Result<Self, FeedError> {
        let cues = match serde_json::from_slice::<CueDocument>(data)? {
            CueDocument::Wrapped { danmakus } => danmakus,
            CueDocument::Bare(cues) => cues,
        };
        tracing::debug!(cues = cues.len(), "cue sheet loaded");
        Ok(Self::new(cues))
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Playback moved forward to `time`: return every cue crossed since the
    /// last call, in time order. Moving backwards seeks instead.
    pub fn advance(&mut self, time: f64) -> Vec<OverlaySpec> {
        if time < self.position {
            self.seek(time);
            return Vec::new();
        }
        let end = self.next + self.cues[self.next..].partition_point(|c| c.time <= time);
        let due = self.cues[self.next..end]
            .iter()
            .map(|c| c.spec.clone())
            .collect();
        self.next = end;
        self.position = time;
        due
    }

    /// Jump to `time` without emitting anything. Cues at exactly `time` are
    /// still pending.
    pub fn seek(&mut self, time: f64) {
        self.next = self.cues.partition_point(|c| c.time < time);
        self.position = time;
        tracing::debug!(time, next = self.next, "cue sheet seeked");
    }

    /// Add a cue while playing. A cue at or before the current position is
    /// stored but treated as already emitted.
    pub fn insert(&mut self, cue: Cue) {
        if cue.time <= self.position {
            let at = self.cues[..self.next].partition_point(|c| c.time <= cue.time);
            self.cues.insert(at, cue);
            self.next += 1;
        } else {
            let at = self.next + self.cues[self.next..].partition_point(|c| c.time <= cue.time);
            self.cues.insert(at, cue);
        }
    }
}

impl Default for CueSheet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(times: &[f64]) -> CueSheet {
        CueSheet::new(
            times
                .iter()
                .map(|&t| Cue::new(t, OverlaySpec::new(format!("at {t}"))))
                .collect(),
        )
    }

    fn texts(specs: &[OverlaySpec]) -> Vec<&str> {
        specs.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn advance_emits_each_cue_once() {
        let mut s = sheet(&[2.0, 0.5, 1.0]);
        assert_eq!(texts(&s.advance(0.0)), Vec::<&str>::new());
        assert_eq!(texts(&s.advance(1.0)), vec!["at 0.5", "at 1"]);
        assert!(s.advance(1.0).is_empty());
        assert_eq!(texts(&s.advance(5.0)), vec!["at 2"]);
    }

    #[test]
    fn backwards_time_seeks_silently() {
        let mut s = sheet(&[1.0, 2.0, 3.0]);
        s.advance(2.5);
        assert!(s.advance(1.5).is_empty());
        assert_eq!(texts(&s.advance(2.0)), vec!["at 2"]);
    }

    #[test]
    fn seek_keeps_cue_at_target_pending() {
        let mut s = sheet(&[1.0, 2.0]);
        s.seek(2.0);
        assert_eq!(texts(&s.advance(2.0)), vec!["at 2"]);
    }

    #[test]
    fn insert_in_past_is_not_replayed() {
        let mut s = sheet(&[1.0, 3.0]);
        s.advance(2.0);
        s.insert(Cue::new(1.5, OverlaySpec::new("sent")));
        s.insert(Cue::new(2.5, OverlaySpec::new("later")));
        assert_eq!(s.len(), 4);
        assert_eq!(texts(&s.advance(3.0)), vec!["later", "at 3"]);
    }

    #[test]
    fn rejects_record_without_time() {
        assert!(matches!(
            CueSheet::from_json(br#"[{"time": "soon", "text": "x"}]"#),
            Err(FeedError::Json(_))
        ));
        assert!(matches!(
            CueSheet::from_json(br#"{"danmakus": [{"text": "x"}]}"#),
            Err(FeedError::Json(_))
        ));
    }
}
