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

//! The playback session.
//!
//! A [`PlaybackSession`] is the single point of control for what is playing.
//! It owns the audio engine, the play queue, the library snapshot and the
//! transient playback facts (position, duration, volume), and it writes
//! playback statistics back to the [`Store`].
//!
//! # State machine
//!
//! ```text
//!  Stopped --play_track--> Loading --engine ok--> Playing <--toggle_play--> Paused
//!                             |
//!                             +--engine error--> Stopped
//! ```
//!
//! Engine notifications arrive on a channel and are applied by
//! [`PlaybackSession::process_events`] or [`PlaybackSession::run`]; an
//! [`EngineEvent::Ended`] advances exactly as [`PlaybackSession::play_next`].
//!
//! # Consistency
//!
//! Every field mutation is written through the store with a transactional
//! read-modify-write, then the snapshot is reloaded. The in-memory copies
//! are never patched directly.
//!
//! # Failures
//!
//! Operations return errors but never leave the session half way through a
//! transition. An engine refusing to start leaves the session stopped, a
//! refused resume leaves it paused, and a storage failure after playback has
//! started is reported while playback carries on.

use std::{
    env,
    path::PathBuf,
    sync::{Arc, mpsc::Receiver},
};

use log::{debug, error, info, warn};

use crate::{
    db::Store,
    error::Result,
    library::Library,
    model::{self, PlayHistory, Track},
    player::{AudioEngine, EngineEvent, PlayableSource, PlayerState},
    queue::Queue,
};

/// Volume used when none is configured.
pub const DEFAULT_VOLUME: f64 = 0.7;

pub struct PlaybackSession<E: AudioEngine> {
    store: Arc<Store>,
    engine: E,
    events: Receiver<EngineEvent>,

    library: Library,
    queue: Queue,

    current_track: Option<Track>,
    source: Option<PlayableSource>,
    source_dir: PathBuf,
    state: PlayerState,
    current_time: f64,
    duration: f64,
    volume: f64,
}

impl<E: AudioEngine> PlaybackSession<E> {
    /// Creates a stopped session.
    ///
    /// # Arguments
    ///
    /// * `store` - The persistent store shared with any other readers.
    /// * `engine` - The audio output this session controls exclusively.
    /// * `events` - The receiving end of the channel `engine` reports on.
    pub fn new(store: Arc<Store>, engine: E, events: Receiver<EngineEvent>) -> Self {
        let mut session = Self {
            store,
            engine,
            events,
            library: Library::new(),
            queue: Queue::new(),
            current_track: None,
            source: None,
            source_dir: env::temp_dir(),
            state: PlayerState::Stopped,
            current_time: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
        };

        if let Err(e) = session.engine.set_volume(session.volume) {
            warn!("Failed to apply initial volume: {}", e);
        }

        session
    }

    /// Sets the directory playable copies of tracks are written to. Defaults
    /// to the system temporary directory.
    pub fn set_source_dir(&mut self, dir: impl Into<PathBuf>) {
        self.source_dir = dir.into();
    }

    pub fn tracks(&self) -> &[Track] {
        self.library.tracks()
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Reloads the library snapshot from the store.
    pub fn load_tracks(&mut self) -> Result<()> {
        self.library.refresh(&self.store).inspect_err(|e| {
            error!("Failed to load tracks: {}", e);
        })?;
        Ok(())
    }

    /// Persists a newly imported track and reloads the snapshot.
    pub fn add_track(&mut self, track: &Track) -> Result<()> {
        self.store.add_track(track).inspect_err(|e| {
            error!("Failed to add track {}: {}", track.id, e);
        })?;
        self.load_tracks()
    }

    /// Deletes a track from the store, drops it from the queue and reloads the
    /// snapshot. Whatever is playing keeps playing.
    pub fn delete_track(&mut self, id: &str) -> Result<()> {
        self.store.delete_track(id).inspect_err(|e| {
            error!("Failed to delete track {}: {}", id, e);
        })?;
        self.queue.remove_tracks([id]);
        self.load_tracks()
    }

    /// Plays `track`, or toggles pause if it is already the current track.
    pub fn play_track(&mut self, track: &Track) -> Result<()> {
        if self.current_track.as_ref().is_some_and(|c| c.id == track.id) {
            return self.toggle_play();
        }

        self.start_track(track.clone())
    }

    /// Flips between playing and paused. Does nothing with no current track.
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.current_track.is_none() {
            return Ok(());
        }

        match self.state {
            PlayerState::Playing => {
                self.engine.pause().inspect_err(|e| {
                    error!("Failed to pause playback: {}", e);
                })?;
                self.state = PlayerState::Paused;
                debug!("Playback paused");
            }
            _ => match self.engine.play() {
                Ok(()) => {
                    self.state = PlayerState::Playing;
                    debug!("Playback resumed");
                }
                Err(e) => {
                    error!("Failed to resume playback: {}", e);
                    self.state = PlayerState::Paused;
                    return Err(e.into());
                }
            },
        }

        Ok(())
    }

    /// Moves the playback position to `time` seconds.
    ///
    /// The new position is reported straight away rather than waiting for the
    /// engine to confirm it. Does nothing when stopped.
    pub fn seek_to(&mut self, time: f64) -> Result<()> {
        if self.current_track.is_none()
            || !matches!(self.state, PlayerState::Playing | PlayerState::Paused)
        {
            return Ok(());
        }

        if !time.is_finite() {
            warn!("Ignoring seek to {}", time);
            return Ok(());
        }

        let time = time.max(0.0);
        self.engine.seek(time).inspect_err(|e| {
            error!("Failed to seek to {}: {}", time, e);
        })?;
        self.current_time = time;

        Ok(())
    }

    /// Sets the output volume, clamped to `0.0..=1.0`.
    ///
    /// The value lasts for the lifetime of the session only. Non-finite values
    /// are ignored.
    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        if !volume.is_finite() {
            warn!("Ignoring volume {}", volume);
            return Ok(());
        }

        self.volume = volume.clamp(0.0, 1.0);
        self.engine.set_volume(self.volume).inspect_err(|e| {
            error!("Failed to set volume: {}", e);
        })?;

        Ok(())
    }

    /// Plays the head of the queue or, with an empty queue, the library track
    /// after the current one.
    pub fn play_next(&mut self) -> Result<()> {
        if let Some(track) = self.queue.next() {
            return self.start_track(track);
        }

        let Some(current) = &self.current_track else {
            return Ok(());
        };

        let next = self.library.next_after(&current.id).cloned();
        match next {
            Some(track) => self.start_track(track),
            None => Ok(()),
        }
    }

    /// Plays the library track before the current one. The queue is never
    /// consulted.
    pub fn play_previous(&mut self) -> Result<()> {
        let Some(current) = &self.current_track else {
            return Ok(());
        };

        let previous = self.library.previous_before(&current.id).cloned();
        match previous {
            Some(track) => self.start_track(track),
            None => Ok(()),
        }
    }

    pub fn add_to_queue(&mut self, track: Track) {
        debug!("Queued track {}", track.id);
        self.queue.add_track(track);
    }

    /// Flips the liked flag of a track, clearing any dislike.
    ///
    /// Ids missing from the snapshot are ignored.
    pub fn toggle_like(&mut self, id: &str) -> Result<()> {
        self.modify_rating(id, Track::toggle_like)
    }

    /// Flips the disliked flag of a track, clearing any like.
    ///
    /// Ids missing from the snapshot are ignored.
    pub fn toggle_dislike(&mut self, id: &str) -> Result<()> {
        self.modify_rating(id, Track::toggle_dislike)
    }

    /// Applies every engine event received so far.
    ///
    /// Failures are logged and do not stop the remaining events from being
    /// applied. Returns the number of events handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;

        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
            handled += 1;
        }

        handled
    }

    /// Applies engine events as they arrive until the engine goes away.
    pub fn run(&mut self) {
        while let Ok(event) = self.events.recv() {
            self.dispatch(event);
        }

        info!("Audio engine closed its event channel");
    }

    fn dispatch(&mut self, event: EngineEvent) {
        if let Err(e) = self.handle_event(event) {
            error!("Failed to handle {:?}: {}", event, e);
        }
    }

    /// Applies a single engine event.
    ///
    /// Position and duration reports are ignored while nothing is playing.
    pub fn handle_event(&mut self, event: EngineEvent) -> Result<()> {
        if self.current_track.is_none() {
            debug!("Ignoring {:?} with no current track", event);
            return Ok(());
        }

        match event {
            EngineEvent::TimeChanged(seconds) => self.current_time = seconds,
            EngineEvent::DurationChanged(seconds) => self.duration = seconds,
            EngineEvent::Ended => {
                debug!("Track finished, advancing");
                return self.play_next();
            }
        }

        Ok(())
    }

    /// Starts `track` from the beginning on a freshly materialised source.
    ///
    /// This always restarts, even when `track` is already current. If the new
    /// source cannot be written, whatever was playing carries on.
    fn start_track(&mut self, track: Track) -> Result<()> {
        let source = PlayableSource::materialize(&track, &self.source_dir).inspect_err(|e| {
            error!("Failed to prepare track {}: {}", track.id, e);
        })?;

        self.release_source();

        info!("Playing {} - {}", track.artist, track.title);

        self.state = PlayerState::Loading;
        self.current_time = 0.0;
        self.duration = track.duration;

        let started = self
            .engine
            .load(source.path())
            .and_then(|()| self.engine.play());

        self.source = Some(source);
        self.current_track = Some(track.clone());

        if let Err(e) = started {
            error!("Playback error for track {}: {}", track.id, e);
            self.stop();
            return Err(e.into());
        }

        self.state = PlayerState::Playing;

        self.record_play(&track).inspect_err(|e| {
            error!("Failed to record play of track {}: {}", track.id, e);
        })
    }

    /// Counts a successful start of `track` and logs it in the history.
    ///
    /// The snapshot is reloaded even when a write fails, so it shows
    /// whatever did reach the store.
    fn record_play(&mut self, track: &Track) -> Result<()> {
        let played_at = model::now();

        let recorded = self
            .store
            .modify_track(track, |t| t.record_play(played_at))
            .and_then(|updated| {
                self.sync_current(&updated);
                self.store.add_history(&PlayHistory::new(track, played_at))
            });

        let refreshed = self.library.refresh(&self.store);

        recorded?;
        refreshed?;
        Ok(())
    }

    fn modify_rating(&mut self, id: &str, f: fn(&mut Track)) -> Result<()> {
        let Some(track) = self.library.find(id).cloned() else {
            debug!("Ignoring rating change for unknown track {}", id);
            return Ok(());
        };

        let updated = self.store.modify_track(&track, f).inspect_err(|e| {
            error!("Failed to update rating of track {}: {}", id, e);
        })?;
        self.sync_current(&updated);

        self.load_tracks()
    }

    fn sync_current(&mut self, updated: &Track) {
        if let Some(current) = &mut self.current_track {
            if current.id == updated.id {
                *current = updated.clone();
            }
        }
    }

    /// Returns to the stopped state with nothing loaded.
    fn stop(&mut self) {
        if let Err(e) = self.engine.stop() {
            warn!("Failed to stop audio engine: {}", e);
        }
        self.release_source();
        self.current_track = None;
        self.state = PlayerState::Stopped;
        self.current_time = 0.0;
        self.duration = 0.0;
    }

    fn release_source(&mut self) {
        if let Some(source) = self.source.take() {
            let track_id = source.track_id().to_string();
            if let Err(e) = source.release() {
                warn!("Failed to release source for track {}: {}", track_id, e);
            }
        }
    }
}
