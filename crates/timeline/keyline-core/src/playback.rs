//! Playhead auto-advance.
//!
//! There is no timer in here. An external scheduler calls [`Playback::tick`] once per
//! [`Playback::frame_interval`]; each tick is one complete playhead mutation. Cancelling playback
//! means the scheduler stops calling `tick`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Playback state of the stage playhead
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Not playing, playhead rewound
    #[default]
    Stopped,
    /// Advancing on every tick
    Playing,
    /// Not playing, playhead kept where it was
    Paused,
}

impl PlaybackState {
    /// Get the name of this playback state
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    state: PlaybackState,
    /// Wrap to frame 1 after the last frame; otherwise stop there.
    pub looping: bool,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            looping: true,
        }
    }
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state.is_playing() {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and rewind the playhead to frame 1.
    pub fn stop(&mut self, doc: &mut Document) {
        self.state = PlaybackState::Stopped;
        doc.set_current_frame(1);
    }

    /// Play if not playing, pause otherwise.
    pub fn toggle(&mut self) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Advance the playhead one frame. Past the last frame it wraps to 1, or stops there when
    /// not looping. Returns the playhead after the tick; a tick while not playing is a no-op.
    pub fn tick(&mut self, doc: &mut Document) -> u32 {
        if !self.state.is_playing() {
            return doc.current_frame();
        }
        let next = doc.current_frame().saturating_add(1);
        if next <= doc.total_frames() {
            doc.set_current_frame(next);
        } else if self.looping {
            doc.set_current_frame(1);
        } else {
            log::debug!("playback reached frame {} and stopped", doc.current_frame());
            self.state = PlaybackState::Paused;
        }
        doc.current_frame()
    }

    /// Time between ticks at the document frame rate. Non-positive rates fall back to 24 fps.
    pub fn frame_interval(doc: &Document) -> Duration {
        let rate = doc.settings().frame_rate;
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 24.0 };
        Duration::from_secs_f64(1.0 / rate)
    }
}
