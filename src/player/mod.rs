// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Audio playback engine boundary.
//!
//! The [`PlaybackSession`](crate::session::PlaybackSession) never talks to an
//! audio library directly. It drives an [`AudioEngine`] through a handful of
//! primitives and learns about progress through [`EngineEvent`]s delivered on
//! a channel that the engine was given when it was created.
//!
//! With the `mpv` feature enabled, [`MpvEngine`] provides an implementation
//! backed by libmpv running on a background worker thread.

#[cfg(feature = "mpv")]
mod commands;
mod source;

use std::path::Path;

use thiserror::Error;

#[cfg(feature = "mpv")]
pub use commands::MpvEngine;
pub use source::PlayableSource;

/// Represents the current playback status of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Loading,
    Playing,
    Paused,
}

/// Notifications emitted by an engine while media is loaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineEvent {
    /// The playback position moved, in seconds.
    TimeChanged(f64),
    /// The decoder reported the media length, in seconds.
    DurationChanged(f64),
    /// The media played through to its natural end.
    Ended,
}

/// Failures reported by an audio engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load media: {0}")]
    Load(String),

    #[error("engine refused to start playback: {0}")]
    Start(String),

    #[error("engine command failed: {0}")]
    Command(String),

    #[error("audio engine is no longer running")]
    Disconnected,
}

/// The primitives the session needs from an audio output.
///
/// Implementations own exactly one output. Loading a new source replaces
/// whatever was loaded before.
pub trait AudioEngine {
    /// Loads the media at `path` without starting it.
    ///
    /// Returns once the media is ready to play, or with
    /// [`EngineError::Load`] if it cannot be decoded.
    fn load(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Starts or resumes the loaded media.
    fn play(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self) -> Result<(), EngineError>;

    /// Stops playback and unloads the current media.
    fn stop(&mut self) -> Result<(), EngineError>;

    /// Moves to an absolute position, in seconds.
    fn seek(&mut self, seconds: f64) -> Result<(), EngineError>;

    /// Sets the output level, from `0.0` (silent) to `1.0` (full).
    fn set_volume(&mut self, volume: f64) -> Result<(), EngineError>;
}
