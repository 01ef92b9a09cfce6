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

//! Listening statistics derived from the library and its play history.

use chrono::{Datelike, Local, TimeZone};

use crate::model::{PlayHistory, Track, TrackKind};

const MOST_PLAYED_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryStats {
    pub total_play_count: u64,
    /// Sum of all track durations, in seconds.
    pub total_duration: f64,
    pub liked_count: usize,
    pub music_count: usize,
    pub audiobook_count: usize,
    /// Up to five `(track id, play count)` pairs, most played first.
    pub most_played: Vec<(String, u32)>,
    /// Plays per day of the week, Sunday first.
    pub plays_by_weekday: [usize; 7],
}

impl LibraryStats {
    /// Computes statistics with weekdays taken in local time.
    pub fn compute(tracks: &[Track], history: &[PlayHistory]) -> Self {
        Self::compute_in(tracks, history, &Local)
    }

    /// Computes statistics with weekdays taken in the given time zone.
    pub fn compute_in<Tz: TimeZone>(tracks: &[Track], history: &[PlayHistory], tz: &Tz) -> Self {
        let total_play_count = tracks.iter().map(|t| u64::from(t.play_count)).sum();
        let total_duration = tracks.iter().map(|t| t.duration).sum();
        let liked_count = tracks.iter().filter(|t| t.liked).count();
        let music_count = tracks.iter().filter(|t| t.kind == TrackKind::Music).count();
        let audiobook_count = tracks.len() - music_count;

        // Stable sort, so ties keep library order
        let mut ranked: Vec<&Track> = tracks.iter().collect();
        ranked.sort_by(|a, b| b.play_count.cmp(&a.play_count));
        let most_played = ranked
            .into_iter()
            .take(MOST_PLAYED_LIMIT)
            .map(|t| (t.id.clone(), t.play_count))
            .collect();

        let mut plays_by_weekday = [0; 7];
        for entry in history {
            let day = entry.played_at.with_timezone(tz).weekday();
            plays_by_weekday[day.num_days_from_sunday() as usize] += 1;
        }

        Self {
            total_play_count,
            total_duration,
            liked_count,
            music_count,
            audiobook_count,
            most_played,
            plays_by_weekday,
        }
    }
}
