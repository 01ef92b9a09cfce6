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

//! MPV-backed audio playback engine and event processing.
//!
//! This module provides an [`AudioEngine`] backed by `libmpv`. It manages a
//! background worker thread that bridges the gap between the session's
//! blocking, command-based interface and the low-level MPV property
//! observation system.
//!
//! # Architecture
//!
//! The engine operates using a dual-channel communication pattern:
//! 1. **Command Channel**: Receives [`AudioPlayerCommand`]s, each carrying a
//!    reply channel so the caller learns whether MPV accepted it.
//! 2. **Event Channel**: Broadcasts [`EngineEvent`]s to the session, such as
//!    track progress, duration and end of file.

use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, warn};
use mpv::Format;

use crate::player::{AudioEngine, EngineError, EngineEvent};

type Reply = Sender<Result<(), EngineError>>;

/// How long a `loadfile` may take to open and probe the media.
const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
enum AudioPlayerCommand {
    Load(PathBuf, Reply),
    Play(Reply),
    Pause(Reply),
    Stop(Reply),
    Seek(f64, Reply),
    SetVolume(f64, Reply),
}

/// A handle to the MPV worker thread.
///
/// This struct acts as a command proxy; it does not perform audio processing
/// itself but instead sends instructions to the worker and waits for each
/// one to be acknowledged.
pub struct MpvEngine {
    command_tx: Sender<AudioPlayerCommand>,
}

impl MpvEngine {
    /// Spawns the MPV worker thread and returns a new engine handle.
    ///
    /// # Arguments
    ///
    /// * `event_tx` - A channel to send playback events back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the MPV context cannot be created.
    pub fn new(event_tx: Sender<EngineEvent>) -> Result<Self, EngineError> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        thread::spawn(move || {
            if let Err(e) = audio_player_worker(command_rx, event_tx, ready_tx) {
                error!("MPV worker failure: {}", e);
            }
        });

        ready_rx.recv().map_err(|_| EngineError::Disconnected)??;

        Ok(Self { command_tx })
    }

    fn request(&self, command: impl FnOnce(Reply) -> AudioPlayerCommand) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.command_tx
            .send(command(reply_tx))
            .map_err(|_| EngineError::Disconnected)?;
        reply_rx.recv().map_err(|_| EngineError::Disconnected)?
    }
}

impl AudioEngine for MpvEngine {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        self.request(|reply| AudioPlayerCommand::Load(path.to_path_buf(), reply))
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.request(AudioPlayerCommand::Play)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.request(AudioPlayerCommand::Pause)
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.request(AudioPlayerCommand::Stop)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), EngineError> {
        self.request(|reply| AudioPlayerCommand::Seek(seconds, reply))
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), EngineError> {
        self.request(|reply| AudioPlayerCommand::SetVolume(volume, reply))
    }
}

fn command_error(e: mpv::Error) -> EngineError {
    EngineError::Command(format!("{:?}", e))
}

/// The primary execution loop for the audio player backend.
///
/// This function initializes a local `libmpv` context, reports the outcome on
/// `ready_tx`, and then alternates between draining commands and waiting for
/// MPV events until the engine handle is dropped.
fn audio_player_worker(
    command_rx: Receiver<AudioPlayerCommand>,
    event_tx: Sender<EngineEvent>,
    ready_tx: Sender<Result<(), EngineError>>,
) -> Result<(), EngineError> {
    let mut handler = match build_handler() {
        Ok(handler) => {
            let _ = ready_tx.send(Ok(()));
            handler
        }
        Err(e) => {
            let _ = ready_tx.send(Err(EngineError::Start(e.to_string())));
            return Err(e);
        }
    };

    loop {
        if !process_commands(&mut handler, &command_rx, &event_tx)? {
            debug!("MPV engine handle dropped, stopping worker");
            return Ok(());
        }
        process_mpv_events(&mut handler, &event_tx)?;
    }
}

fn build_handler() -> Result<mpv::MpvHandler, EngineError> {
    let mut builder = mpv::MpvHandlerBuilder::new().map_err(command_error)?;
    builder.set_option("vo", "null").map_err(command_error)?;
    let mut handler = builder.build().map_err(command_error)?;

    handler
        .observe_property::<f64>("duration", 0)
        .map_err(command_error)?;
    handler
        .observe_property::<f64>("time-pos", 0)
        .map_err(command_error)?;

    Ok(handler)
}

/// Drains and executes all pending commands, answering each on its reply
/// channel.
///
/// Returns `false` once the command channel has been closed.
fn process_commands(
    handler: &mut mpv::MpvHandler,
    command_rx: &Receiver<AudioPlayerCommand>,
    event_tx: &Sender<EngineEvent>,
) -> Result<bool, EngineError> {
    loop {
        let command = match command_rx.try_recv() {
            Ok(command) => command,
            Err(mpsc::TryRecvError::Empty) => return Ok(true),
            Err(mpsc::TryRecvError::Disconnected) => return Ok(false),
        };

        match command {
            AudioPlayerCommand::Load(path, reply) => {
                let filename = path.to_string_lossy();
                let result = handler
                    .set_property("pause", true)
                    .and_then(|()| handler.command(&["loadfile", &filename, "replace"]))
                    .map_err(|e| EngineError::Load(format!("{}: {:?}", filename, e)))
                    .and_then(|()| await_file_loaded(handler, event_tx));
                let _ = reply.send(result);
            }
            AudioPlayerCommand::Stop(reply) => {
                let _ = reply.send(handler.command(&["stop"]).map_err(command_error));
            }
            AudioPlayerCommand::Play(reply) => {
                let result = handler
                    .set_property("pause", false)
                    .map_err(|e| EngineError::Start(format!("{:?}", e)));
                let _ = reply.send(result);
            }
            AudioPlayerCommand::Pause(reply) => {
                let _ = reply.send(handler.set_property("pause", true).map_err(command_error));
            }
            AudioPlayerCommand::Seek(seconds, reply) => {
                let result = handler
                    .command(&["seek", &seconds.to_string(), "absolute"])
                    .map_err(command_error);
                let _ = reply.send(result);
            }
            AudioPlayerCommand::SetVolume(volume, reply) => {
                let result = handler
                    .set_property("volume", volume * 100.0)
                    .map_err(command_error);
                let _ = reply.send(result);
            }
        }
    }
}

/// Waits for MPV to finish opening the file just passed to `loadfile`.
///
/// Events that arrive meanwhile are forwarded as usual, except the end of the
/// file being replaced, which must not read as the new one finishing.
fn await_file_loaded(
    handler: &mut mpv::MpvHandler,
    event_tx: &Sender<EngineEvent>,
) -> Result<(), EngineError> {
    let deadline = Instant::now() + LOAD_TIMEOUT;

    while Instant::now() < deadline {
        let Some(mpv_event) = handler.wait_event(0.05) else {
            continue;
        };

        match mpv_event {
            mpv::Event::FileLoaded => return Ok(()),
            mpv::Event::EndFile(Err(e)) => {
                return Err(EngineError::Load(format!("{:?}", e)));
            }
            mpv::Event::EndFile(Ok(mpv::EndFileReason::MPV_END_FILE_REASON_ERROR)) => {
                return Err(EngineError::Load("media could not be decoded".into()));
            }
            mpv::Event::EndFile(_) => {}
            other => forward_event(other, event_tx)?,
        }
    }

    warn!("MPV did not load media within {:?}", LOAD_TIMEOUT);
    Err(EngineError::Load("timed out opening media".into()))
}

/// Polls for MPV events and forwards the ones the session cares about.
///
/// This function waits for up to 50ms for an event from the MPV context.
fn process_mpv_events(
    handler: &mut mpv::MpvHandler,
    event_tx: &Sender<EngineEvent>,
) -> Result<(), EngineError> {
    if let Some(mpv_event) = handler.wait_event(0.05) {
        forward_event(mpv_event, event_tx)?;
    }

    Ok(())
}

fn forward_event(mpv_event: mpv::Event, event_tx: &Sender<EngineEvent>) -> Result<(), EngineError> {
    let engine_event = match mpv_event {
        mpv::Event::PropertyChange { name, change, .. } => match (name, change) {
            ("duration", Format::Double(duration)) => Some(EngineEvent::DurationChanged(duration)),
            ("time-pos", Format::Double(seconds)) if seconds >= 0.0 => {
                Some(EngineEvent::TimeChanged(seconds))
            }
            _ => None,
        },
        mpv::Event::EndFile(Ok(mpv::EndFileReason::MPV_END_FILE_REASON_EOF)) => {
            Some(EngineEvent::Ended)
        }
        _ => None,
    };

    if let Some(event) = engine_event {
        event_tx.send(event).map_err(|_| EngineError::Disconnected)?;
    }

    Ok(())
}
