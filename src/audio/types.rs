//! Audio-related small types and handles.
//!
//! This module defines the commands accepted by the audio thread and the
//! playback state it shares with the UI.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
pub enum AudioCmd {
    /// Stop whatever is playing and start `path`.
    Play(PathBuf),
    /// Stop playback immediately.
    Stop,
    /// Toggle pause/resume.
    TogglePause,
    /// Stop playback and end the audio thread.
    Quit,
}

/// What the transport is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    /// Decoded and audible.
    Playing,
    Paused,
    /// The last play request could not be honored.
    Failed(String),
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information shared with the UI.
pub struct PlaybackInfo {
    /// File currently loaded (playing, paused or failed), if any.
    pub path: Option<PathBuf>,
    pub status: PlaybackStatus,
    /// Position inside the current file.
    pub elapsed: Duration,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
