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

//! Play queue management.
//!
//! This module provides state for the explicit play queue: tracks the user
//! asked to hear next, ahead of the library order.

use std::collections::{HashSet, VecDeque};

use crate::model::Track;

/// A first-in, first-out list of tracks waiting to be played.
#[derive(Debug, Default)]
pub struct Queue {
    queued: VecDeque<Track>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_track(&mut self, track: Track) {
        self.queued.push_back(track);
    }

    pub fn add_tracks(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.queued.extend(tracks);
    }

    /// Drops every queued entry for the given track ids.
    pub fn remove_tracks<'a>(&mut self, track_ids: impl IntoIterator<Item = &'a str>) {
        let ids_to_remove: HashSet<&str> = track_ids.into_iter().collect();
        self.queued
            .retain(|track| !ids_to_remove.contains(track.id.as_str()));
    }

    pub fn clear(&mut self) {
        self.queued.clear();
    }

    /// Takes the track at the head of the queue.
    pub fn next(&mut self) -> Option<Track> {
        self.queued.pop_front()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.queued.iter()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}
