use std::fmt;

use danmaku_protocol::{Icon, SharedStr};

use crate::host::{AudioHandle, AudioOutput};

/// The audio half of a voice overlay: one handle plus the toggle state.
///
/// Owned by its overlay. Dropping it (overlay exit, `clear`, engine drop)
/// stops playback and releases the handle; there is no other release path.
pub struct VoiceAttachment {
    src: SharedStr,
    handle: Option<Box<dyn AudioHandle>>,
    playing: bool,
}

impl VoiceAttachment {
    /// Open `src` through the host. A failed open is logged and leaves an
    /// attachment whose toggle does nothing.
    pub fn open(audio: &mut dyn AudioOutput, src: &str) -> Self {
        let handle = match audio.open(src) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(%err, src, "voice overlay audio unavailable");
                None
            }
        };
        Self {
            src: src.into(),
            handle,
            playing: false,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_available(&self) -> bool {
        self.handle.is_some()
    }

    /// Icon for the toggle: what a click would do next.
    pub fn icon(&self) -> Icon {
        if self.playing { Icon::Pause } else { Icon::Play }
    }

    /// Flip between playing and paused. Returns the new playing state.
    pub fn toggle(&mut self) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            tracing::warn!(src = %self.src, "voice toggle ignored, no audio handle");
            return false;
        };
        if self.playing {
            handle.pause();
            self.playing = false;
        } else {
            match handle.play() {
                Ok(()) => self.playing = true,
                Err(err) => tracing::warn!(%err, src = %self.src, "voice playback failed"),
            }
        }
        self.playing
    }

    /// Notice natural completion. Returns true on the frame playback ended.
    ///
    /// A late playback failure also stops the toggle, but is not a completion.
    pub fn poll(&mut self) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        if let Some(err) = handle.take_failure() {
            tracing::warn!(%err, src = %self.src, "voice playback failed");
            self.playing = false;
            return false;
        }
        let ended = self.playing && handle.has_ended();
        if ended {
            self.playing = false;
        }
        ended
    }
}

impl Drop for VoiceAttachment {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if self.playing {
                handle.pause();
            }
            tracing::debug!(src = %self.src, "voice handle released");
        }
    }
}

impl fmt::Debug for VoiceAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceAttachment")
            .field("src", &self.src)
            .field("available", &self.handle.is_some())
            .field("playing", &self.playing)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted audio backend shared by the engine tests.

    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::error::AudioError;
    use crate::host::{AudioHandle, AudioOutput};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum AudioEvent {
        Opened(String),
        Played(String),
        Paused(String),
        Released(String),
    }

    #[derive(Default)]
    struct Shared {
        events: Vec<AudioEvent>,
        ended: Vec<String>,
        failed: Vec<String>,
    }

    /// Records every call; `finish(src)` makes that handle report completion
    /// and `fail(src)` makes it report a failure after `play` succeeded.
    #[derive(Clone, Default)]
    pub struct ScriptedAudio {
        shared: Rc<RefCell<Shared>>,
        fail_open: bool,
        fail_play: bool,
    }

    impl ScriptedAudio {
        pub fn failing_open() -> Self {
            Self {
                fail_open: true,
                ..Self::default()
            }
        }

        pub fn failing_play() -> Self {
            Self {
                fail_play: true,
                ..Self::default()
            }
        }

        pub fn events(&self) -> Vec<AudioEvent> {
            self.shared.borrow().events.clone()
        }

        pub fn count(&self, event: &AudioEvent) -> usize {
            self.shared
                .borrow()
                .events
                .iter()
                .filter(|e| *e == event)
                .count()
        }

        pub fn finish(&self, src: &str) {
            self.shared.borrow_mut().ended.push(src.to_string());
        }

        pub fn fail(&self, src: &str) {
            self.shared.borrow_mut().failed.push(src.to_string());
        }
    }

    struct ScriptedHandle {
        src: String,
        shared: Rc<RefCell<Shared>>,
        fail_play: bool,
    }

    impl AudioOutput for ScriptedAudio {
        fn open(&mut self, src: &str) -> Result<Box<dyn AudioHandle>, AudioError> {
            if self.fail_open {
                return Err(AudioError::Open {
                    src: src.to_string(),
                    reason: "404".to_string(),
                });
            }
            self.shared
                .borrow_mut()
                .events
                .push(AudioEvent::Opened(src.to_string()));
            Ok(Box::new(ScriptedHandle {
                src: src.to_string(),
                shared: self.shared.clone(),
                fail_play: self.fail_play,
            }))
        }
    }

    impl AudioHandle for ScriptedHandle {
        fn play(&mut self) -> Result<(), AudioError> {
            if self.fail_play {
                return Err(AudioError::Playback("NotAllowedError".to_string()));
            }
            self.shared
                .borrow_mut()
                .events
                .push(AudioEvent::Played(self.src.clone()));
            Ok(())
        }

        fn pause(&mut self) {
            self.shared
                .borrow_mut()
                .events
                .push(AudioEvent::Paused(self.src.clone()));
        }

        fn has_ended(&self) -> bool {
            self.shared.borrow().ended.contains(&self.src)
        }

        fn take_failure(&mut self) -> Option<AudioError> {
            let mut shared = self.shared.borrow_mut();
            let at = shared.failed.iter().position(|s| *s == self.src)?;
            shared.failed.remove(at);
            Some(AudioError::Playback("NotAllowedError".to_string()))
        }
    }

    impl Drop for ScriptedHandle {
        fn drop(&mut self) {
            self.shared
                .borrow_mut()
                .events
                .push(AudioEvent::Released(self.src.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{AudioEvent, ScriptedAudio};
    use super::*;

    #[test]
    fn toggle_plays_then_pauses() {
        let mut audio = ScriptedAudio::default();
        let mut voice = VoiceAttachment::open(&mut audio, "a.webm");
        assert_eq!(voice.icon(), Icon::Play);
        assert!(voice.toggle());
        assert_eq!(voice.icon(), Icon::Pause);
        assert!(!voice.toggle());
        assert_eq!(
            audio.events(),
            vec![
                AudioEvent::Opened("a.webm".into()),
                AudioEvent::Played("a.webm".into()),
                AudioEvent::Paused("a.webm".into()),
            ]
        );
    }

    #[test]
    fn natural_completion_resets_icon() {
        let mut audio = ScriptedAudio::default();
        let mut voice = VoiceAttachment::open(&mut audio, "a.webm");
        voice.toggle();
        assert!(!voice.poll());
        audio.finish("a.webm");
        assert!(voice.poll());
        assert!(!voice.is_playing());
        assert_eq!(voice.icon(), Icon::Play);
        assert!(!voice.poll());
    }

    #[test]
    fn drop_stops_and_releases_once() {
        let mut audio = ScriptedAudio::default();
        let mut voice = VoiceAttachment::open(&mut audio, "a.webm");
        voice.toggle();
        drop(voice);
        assert_eq!(audio.count(&AudioEvent::Paused("a.webm".into())), 1);
        assert_eq!(audio.count(&AudioEvent::Released("a.webm".into())), 1);
    }

    #[test]
    fn failures_are_swallowed() {
        let mut audio = ScriptedAudio::failing_open();
        let mut voice = VoiceAttachment::open(&mut audio, "gone.webm");
        assert!(!voice.is_available());
        assert!(!voice.toggle());

        let mut audio = ScriptedAudio::failing_play();
        let mut voice = VoiceAttachment::open(&mut audio, "blocked.webm");
        assert!(voice.is_available());
        assert!(!voice.toggle());
        assert!(!voice.is_playing());
    }

    #[test]
    fn late_failure_resets_icon() {
        let mut audio = ScriptedAudio::default();
        let mut voice = VoiceAttachment::open(&mut audio, "blocked.webm");
        assert!(voice.toggle());
        assert!(!voice.poll());
        assert_eq!(voice.icon(), Icon::Pause);

        audio.fail("blocked.webm");
        assert!(!voice.poll());
        assert!(!voice.is_playing());
        assert_eq!(voice.icon(), Icon::Play);

        // The failure is consumed; a retry can play again.
        assert!(voice.toggle());
        assert!(!voice.poll());
        assert!(voice.is_playing());
    }
}
