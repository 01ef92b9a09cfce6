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

//! In-memory library snapshot.
//!
//! The [`Library`] is the list of all tracks as last read from the
//! [`Store`], in load order. It is never patched in place: after any change
//! to the store it is thrown away and read again, so what views see is
//! always what was persisted.
//!
//! Navigation wraps around at both ends of the snapshot.

use crate::{
    db::{Store, StoreError},
    model::{PlayHistory, Track, TrackKind},
};

/// A search over the snapshot, as offered by a library browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    /// Case-insensitive text matched against title, artist and album.
    pub query: String,
    /// Restricts results to one kind, or `None` for all.
    pub kind: Option<TrackKind>,
}

impl LibraryFilter {
    pub fn matches(&self, track: &Track) -> bool {
        let query = self.query.to_lowercase();

        let matches_query = query.is_empty()
            || track.title.to_lowercase().contains(&query)
            || track.artist.to_lowercase().contains(&query)
            || track
                .album
                .as_ref()
                .is_some_and(|album| album.to_lowercase().contains(&query));

        let matches_kind = self.kind.is_none_or(|kind| track.kind == kind);

        matches_query && matches_kind
    }
}

/// A history entry paired with the track it refers to, if that track still
/// exists.
#[derive(Debug, Clone, Copy)]
pub struct RecentPlay<'a> {
    pub entry: &'a PlayHistory,
    pub track: Option<&'a Track>,
}

#[derive(Debug, Default)]
pub struct Library {
    tracks: Vec<Track>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot with the current contents of `store`.
    ///
    /// On failure the previous snapshot is kept.
    pub fn refresh(&mut self, store: &Store) -> Result<(), StoreError> {
        self.tracks = store.get_all_tracks()?;
        Ok(())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// The track after `id`, wrapping to the first one past the end.
    ///
    /// A track missing from the snapshot counts as sitting just before the
    /// start, so the first track follows it.
    pub fn next_after(&self, id: &str) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }

        let next = self.position(id).map_or(0, |idx| (idx + 1) % self.tracks.len());
        self.tracks.get(next)
    }

    /// The track before `id`, wrapping to the last one before the start.
    pub fn previous_before(&self, id: &str) -> Option<&Track> {
        let last = self.tracks.len().checked_sub(1)?;

        let previous = match self.position(id) {
            Some(idx) if idx > 0 => idx - 1,
            _ => last,
        };
        self.tracks.get(previous)
    }

    pub fn filter(&self, filter: &LibraryFilter) -> Vec<&Track> {
        self.tracks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Liked tracks, in snapshot order.
    pub fn favourites(&self) -> Vec<&Track> {
        self.tracks.iter().filter(|t| t.liked).collect()
    }

    /// Resolves each history entry to its track.
    pub fn recent_plays<'a>(&'a self, entries: &'a [PlayHistory]) -> Vec<RecentPlay<'a>> {
        entries
            .iter()
            .map(|entry| RecentPlay {
                entry,
                track: self.find(&entry.track_id),
            })
            .collect()
    }
}
