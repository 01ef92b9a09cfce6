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

//! Database row mapping for domain models.
//!
//! This module provides the conversion logic between raw SQLite result rows
//! and high-level domain models, ensuring type-safe extraction of model
//! attributes from database queries.

use chrono::{DateTime, Utc};
use rusqlite::{
    Result, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
};
use thiserror::Error;

use crate::model::{PlayHistory, Playlist, Track, TrackKind};

/// Column list matching [`Track::from_row`].
pub(super) const TRACK_COLUMNS: &str = "id, title, artist, album, duration, file, added_date, \
     play_count, liked, disliked, last_played, kind";

pub(super) const PLAYLIST_COLUMNS: &str = "id, name, track_ids, created_date, cover";

pub(super) const HISTORY_COLUMNS: &str = "id, track_id, played_at, duration";

/// Binds a timestamp as nanoseconds since the Unix epoch.
///
/// Nanoseconds are the full precision of [`DateTime`], so a stored timestamp
/// reads back unchanged. Dates outside 1677..2262 cannot be stored.
pub(super) struct Timestamp<'a>(pub &'a DateTime<Utc>);

#[derive(Debug, Error)]
#[error("timestamp {0} is outside the storable range")]
struct TimestampOutOfRange(DateTime<Utc>);

impl ToSql for Timestamp<'_> {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        self.0
            .timestamp_nanos_opt()
            .map(ToSqlOutput::from)
            .ok_or_else(|| {
                rusqlite::Error::ToSqlConversionFailure(Box::new(TimestampOutOfRange(*self.0)))
            })
    }
}

fn timestamp(row: &Row, idx: usize) -> Result<DateTime<Utc>> {
    let nanos: i64 = row.get(idx)?;
    Ok(DateTime::from_timestamp_nanos(nanos))
}

fn optional_timestamp(row: &Row, idx: usize) -> Result<Option<DateTime<Utc>>> {
    let nanos: Option<i64> = row.get(idx)?;
    Ok(nanos.map(DateTime::from_timestamp_nanos))
}

impl Track {
    /// Maps an SQLite row to a [`Track`] instance.
    ///
    /// This is a helper function designed to be used with [`rusqlite::Statement::query_map`]
    /// over a `SELECT` of [`TRACK_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns a [`rusqlite::Error`] if:
    /// * The row does not contain enough columns.
    /// * The data in a column cannot be converted to the required Rust type.
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            album: row.get(3)?,
            duration: row.get(4)?,
            file: row.get(5)?,
            added_date: timestamp(row, 6)?,
            play_count: row.get(7)?,
            liked: row.get(8)?,
            disliked: row.get(9)?,
            last_played: optional_timestamp(row, 10)?,
            kind: row.get(11)?,
        })
    }
}

impl Playlist {
    /// Maps an SQLite row to a [`Playlist`] instance, decoding the stored
    /// JSON list of track ids.
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        let track_ids: String = row.get(2)?;
        let track_ids = serde_json::from_str(&track_ids)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            track_ids,
            created_date: timestamp(row, 3)?,
            cover: row.get(4)?,
        })
    }
}

impl PlayHistory {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            track_id: row.get(1)?,
            played_at: timestamp(row, 2)?,
            duration: row.get(3)?,
        })
    }
}

impl ToSql for TrackKind {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TrackKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}
