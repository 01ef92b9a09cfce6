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

//! Data access layer.
//!
//! This module handles all interactions with the SQLite database, including
//! schema creation and the keyed collections of the library. It uses cached
//! statements to optimize frequently executed queries.
//!
//! # Tables
//!
//! * `tracks` - Imported audio items with their payload and statistics.
//! * `playlists` - Named, ordered lists of track ids.
//! * `history` - Append-only log of playback starts.
//!
//! There are no foreign keys between the tables: playlist entries and history
//! rows refer to tracks by id only, and survive the deletion of that track.
//!
//! # Initialisation
//!
//! A [`Store`] does no I/O when it is created. The connection is opened, and
//! the schema created, by whichever operation runs first. The connection slot
//! is guarded by a mutex so that concurrent first callers set it up once.

mod model;

use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, ffi, params};
use thiserror::Error;

use crate::model::{PlayHistory, Playlist, Track};

use self::model::{HISTORY_COLUMNS, PLAYLIST_COLUMNS, TRACK_COLUMNS, Timestamp};

/// Binds the twelve columns of [`TRACK_COLUMNS`] in order.
macro_rules! track_params {
    ($track:expr) => {
        params![
            $track.id,
            $track.title,
            $track.artist,
            $track.album,
            $track.duration,
            $track.file,
            Timestamp(&$track.added_date),
            $track.play_count,
            $track.liked,
            $track.disliked,
            $track.last_played.as_ref().map(Timestamp),
            $track.kind,
        ]
    };
}

/// Failures raised by the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a {collection} record with id '{id}' already exists")]
    DuplicateKey { collection: &'static str, id: String },

    #[error("storage failure: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Durable keyed storage for tracks, playlists and play history.
pub struct Store {
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl Store {
    /// Creates a store backed by the SQLite database file at `path`.
    ///
    /// The file is not touched until the first operation.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            conn: Mutex::new(None),
        }
    }

    /// Creates a store that lives only as long as this value.
    pub fn open_in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: Mutex::new(None),
        }
    }

    /// Runs `f` against the connection, opening it first if necessary.
    ///
    /// A failed initialisation leaves the slot empty, so the next operation
    /// tries again.
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut slot = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        let conn = match slot.take() {
            Some(conn) => conn,
            None => init_db(&self.location)?,
        };

        f(slot.insert(conn))
    }

    /// Inserts a new track.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if a track with the same id is
    /// already stored.
    pub fn add_track(&self, track: &Track) -> Result<()> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO tracks ({TRACK_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            stmt.execute(track_params!(track))
                .map_err(|e| insert_error("track", &track.id, e))?;

            debug!("Added track {} ({})", track.id, track.title);
            Ok(())
        })
    }

    /// Fetches every stored track, in the order they were first added.
    pub fn get_all_tracks(&self) -> Result<Vec<Track>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks ORDER BY rowid");
            let mut stmt = conn.prepare_cached(&sql)?;
            let results = stmt
                .query_map([], Track::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(results)
        })
    }

    /// Fetches a single track, if present.
    pub fn get_track(&self, id: &str) -> Result<Option<Track>> {
        self.with_conn(|conn| select_track(conn, id))
    }

    /// Inserts or fully replaces a track, keyed by id.
    ///
    /// Replacing a track keeps its position in [`Store::get_all_tracks`].
    pub fn update_track(&self, track: &Track) -> Result<()> {
        self.with_conn(|conn| upsert_track(conn, track))
    }

    /// Applies `f` to the freshest stored copy of `base` and writes it back.
    ///
    /// The read and the write happen in one immediate transaction, so two
    /// modifications of the same track never lose each other's fields. If the
    /// track is no longer stored, `f` is applied to `base` and the result is
    /// inserted.
    ///
    /// Returns the record as written.
    pub fn modify_track<F>(&self, base: &Track, f: F) -> Result<Track>
    where
        F: FnOnce(&mut Track),
    {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut track = select_track(&tx, &base.id)?.unwrap_or_else(|| base.clone());
            f(&mut track);
            upsert_track(&tx, &track)?;

            tx.commit()?;
            Ok(track)
        })
    }

    /// Deletes a track. Deleting an absent id is not an error.
    pub fn delete_track(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("DELETE FROM tracks WHERE id = ?1")?;
            stmt.execute([id])?;
            Ok(())
        })
    }

    /// Inserts a new playlist, failing on a duplicate id.
    pub fn add_playlist(&self, playlist: &Playlist) -> Result<()> {
        let track_ids = serde_json::to_string(&playlist.track_ids)?;

        self.with_conn(|conn| {
            let sql = format!("INSERT INTO playlists ({PLAYLIST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)");
            let mut stmt = conn.prepare_cached(&sql)?;
            stmt.execute(params![
                playlist.id,
                playlist.name,
                track_ids,
                Timestamp(&playlist.created_date),
                playlist.cover,
            ])
            .map_err(|e| insert_error("playlist", &playlist.id, e))?;

            Ok(())
        })
    }

    /// Fetches every stored playlist, in the order they were first added.
    pub fn get_all_playlists(&self) -> Result<Vec<Playlist>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY rowid");
            let mut stmt = conn.prepare_cached(&sql)?;
            let results = stmt
                .query_map([], Playlist::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(results)
        })
    }

    /// Inserts or fully replaces a playlist, keyed by id.
    pub fn update_playlist(&self, playlist: &Playlist) -> Result<()> {
        let track_ids = serde_json::to_string(&playlist.track_ids)?;

        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO playlists ({PLAYLIST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    track_ids = excluded.track_ids,
                    created_date = excluded.created_date,
                    cover = excluded.cover"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            stmt.execute(params![
                playlist.id,
                playlist.name,
                track_ids,
                Timestamp(&playlist.created_date),
                playlist.cover,
            ])?;

            Ok(())
        })
    }

    /// Deletes a playlist. Deleting an absent id is not an error.
    pub fn delete_playlist(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("DELETE FROM playlists WHERE id = ?1")?;
            stmt.execute([id])?;
            Ok(())
        })
    }

    /// Appends a history entry, failing on a duplicate id.
    pub fn add_history(&self, entry: &PlayHistory) -> Result<()> {
        self.with_conn(|conn| {
            let sql = format!("INSERT INTO history ({HISTORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4)");
            let mut stmt = conn.prepare_cached(&sql)?;
            stmt.execute(params![
                entry.id,
                entry.track_id,
                Timestamp(&entry.played_at),
                entry.duration,
            ])
            .map_err(|e| insert_error("history", &entry.id, e))?;

            Ok(())
        })
    }

    /// Fetches history entries, most recent first.
    ///
    /// With a `limit`, the `played_at` index is walked backwards and the scan
    /// stops after `limit` rows, so the cost does not grow with the size of
    /// the log.
    pub fn get_history(&self, limit: Option<usize>) -> Result<Vec<PlayHistory>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {HISTORY_COLUMNS} FROM history
                 ORDER BY played_at DESC, rowid DESC
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let results = stmt
                .query_map([limit], PlayHistory::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(results)
        })
    }

    /// Fetches the history of a single track, most recent first.
    pub fn get_history_for_track(&self, track_id: &str) -> Result<Vec<PlayHistory>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {HISTORY_COLUMNS} FROM history
                 WHERE track_id = ?1
                 ORDER BY played_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let results = stmt
                .query_map([track_id], PlayHistory::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(results)
        })
    }
}

fn select_track(conn: &Connection, id: &str) -> Result<Option<Track>> {
    let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    let track = stmt.query_row([id], Track::from_row).optional()?;

    Ok(track)
}

fn upsert_track(conn: &Connection, track: &Track) -> Result<()> {
    let sql = format!(
        "INSERT INTO tracks ({TRACK_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT (id) DO UPDATE SET
            title = excluded.title,
            artist = excluded.artist,
            album = excluded.album,
            duration = excluded.duration,
            file = excluded.file,
            added_date = excluded.added_date,
            play_count = excluded.play_count,
            liked = excluded.liked,
            disliked = excluded.disliked,
            last_played = excluded.last_played,
            kind = excluded.kind"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.execute(track_params!(track))?;

    Ok(())
}

/// Maps a primary key violation on insert to [`StoreError::DuplicateKey`].
fn insert_error(collection: &'static str, id: &str, err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            StoreError::DuplicateKey {
                collection,
                id: id.to_string(),
            }
        }
        _ => StoreError::Sqlite(err),
    }
}

/// Opens a connection to the SQLite database and configures performance settings.
///
/// This function performs the following setup:
/// * **WAL Mode**: Enables Write-Ahead Logging for file databases.
/// * **Performance Tuning**: Sets synchronous mode to `NORMAL` and increases the cache size.
/// * **Schema**: Executes [`create_schema`] to ensure all tables and indices exist.
///
/// # Errors
///
/// Returns an error if:
/// * The database file cannot be opened.
/// * The initial PRAGMA configurations fail.
/// * The schema initialization fails.
fn init_db(location: &Location) -> Result<Connection> {
    let conn = match location {
        Location::File(path) => {
            info!("Opening library database {}", path.display());
            let conn = Connection::open(path)?;

            let journal_mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
            if journal_mode != "wal" {
                warn!("Database is not in WAL mode, current mode: {}", journal_mode);
            }

            conn
        }
        Location::Memory => Connection::open_in_memory()?,
    };

    conn.execute_batch(
        "
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -16000; -- Use 16MB of RAM for cache
    ",
    )?;

    conn.set_prepared_statement_cache_capacity(32);

    create_schema(&conn)?;

    Ok(conn)
}

/// Create the database schema.
///
/// This function creates the `tracks`, `playlists`, and `history` tables and
/// their secondary indexes if they do not already exist. None of the indexes
/// are unique.
///
/// This operation is wrapped in a single SQL transaction to ensure the schema
/// is updated atomically.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS tracks (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT,
            duration REAL NOT NULL,
            file BLOB NOT NULL,
            added_date INTEGER NOT NULL,
            play_count INTEGER NOT NULL DEFAULT 0,
            liked INTEGER NOT NULL DEFAULT 0,
            disliked INTEGER NOT NULL DEFAULT 0,
            last_played INTEGER,
            kind TEXT NOT NULL,
            CHECK (NOT (liked AND disliked))
        );

        CREATE INDEX IF NOT EXISTS idx_tracks_title ON tracks (title);
        CREATE INDEX IF NOT EXISTS idx_tracks_artist ON tracks (artist);
        CREATE INDEX IF NOT EXISTS idx_tracks_kind ON tracks (kind);

        CREATE TABLE IF NOT EXISTS playlists (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            track_ids TEXT NOT NULL,
            created_date INTEGER NOT NULL,
            cover TEXT
        );

        CREATE TABLE IF NOT EXISTS history (
            id TEXT PRIMARY KEY NOT NULL,
            track_id TEXT NOT NULL,
            played_at INTEGER NOT NULL,
            duration REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_track_id ON history (track_id);
        CREATE INDEX IF NOT EXISTS idx_history_played_at ON history (played_at);

        COMMIT;",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests;
