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

//! Domain models and core data structures.
//!
//! This module defines the central entities of the library (tracks,
//! playlists and play history) representing the records kept by the
//! [`Store`](crate::db::Store).

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The current time, as stamped on new records.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// The broad category of an imported item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Music,
    Audiobook,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Music => "music",
            TrackKind::Audiobook => "audiobook",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "music" => Ok(TrackKind::Music),
            "audiobook" => Ok(TrackKind::Audiobook),
            other => Err(format!("unknown track kind: {other}")),
        }
    }
}

/// A single imported audio item with its metadata and listening statistics.
///
/// The raw media payload travels with the record. A playable locator for it
/// is never stored here, see [`PlayableSource`](crate::player::PlayableSource).
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Length in seconds, taken from the decoded media at import time.
    pub duration: f64,
    pub file: Vec<u8>,
    pub added_date: DateTime<Utc>,
    pub play_count: u32,
    pub liked: bool,
    pub disliked: bool,
    pub last_played: Option<DateTime<Utc>>,
    pub kind: TrackKind,
}

impl Track {
    /// Creates a freshly imported track that has never been played or rated.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration: f64,
        file: Vec<u8>,
        kind: TrackKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration,
            file,
            added_date: now(),
            play_count: 0,
            liked: false,
            disliked: false,
            last_played: None,
            kind,
        }
    }

    /// Flips the liked flag. A track can never be liked and disliked at once.
    pub fn toggle_like(&mut self) {
        self.liked = !self.liked;
        if self.liked {
            self.disliked = false;
        }
    }

    /// Flips the disliked flag, clearing any like.
    pub fn toggle_dislike(&mut self) {
        self.disliked = !self.disliked;
        if self.disliked {
            self.liked = false;
        }
    }

    /// Counts one successful playback start.
    pub fn record_play(&mut self, played_at: DateTime<Utc>) {
        self.play_count = self.play_count.saturating_add(1);
        self.last_played = Some(played_at);
    }
}

/// A named, ordered list of track ids.
///
/// Ids are weak references: deleting a track leaves any playlist entries
/// pointing at it untouched. The same id may appear more than once.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub track_ids: Vec<String>,
    pub created_date: DateTime<Utc>,
    pub cover: Option<String>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            track_ids: Vec::new(),
            created_date: now(),
            cover: None,
        }
    }
}

/// One entry of the append-only play log.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayHistory {
    pub id: String,
    pub track_id: String,
    pub played_at: DateTime<Utc>,
    /// The track duration at the time of play, never re-derived.
    pub duration: f64,
}

impl PlayHistory {
    pub fn new(track: &Track, played_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            track_id: track.id.clone(),
            played_at,
            duration: track.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track::new("t1", "Song", "Artist", 180.0, vec![1, 2, 3], TrackKind::Music)
    }

    #[test]
    fn like_and_dislike_are_mutually_exclusive() {
        let mut t = track();

        t.toggle_like();
        assert!(t.liked && !t.disliked);

        t.toggle_dislike();
        assert!(!t.liked && t.disliked);

        t.toggle_dislike();
        assert!(!t.liked && !t.disliked);

        t.toggle_dislike();
        t.toggle_like();
        assert!(t.liked && !t.disliked);
    }

    #[test]
    fn record_play_counts_and_stamps() {
        let mut t = track();
        let at = now();

        t.record_play(at);
        t.record_play(at);

        assert_eq!(t.play_count, 2);
        assert_eq!(t.last_played, Some(at));
    }

    #[test]
    fn kind_parses_its_own_string_form() {
        for kind in [TrackKind::Music, TrackKind::Audiobook] {
            assert_eq!(kind.as_str().parse::<TrackKind>(), Ok(kind));
        }
        assert!("podcast".parse::<TrackKind>().is_err());
    }

    #[test]
    fn history_snapshots_the_track_duration() {
        let mut t = track();
        let entry = PlayHistory::new(&t, now());
        t.duration = 200.0;

        assert_eq!(entry.track_id, "t1");
        assert_eq!(entry.duration, 180.0);
    }
}
