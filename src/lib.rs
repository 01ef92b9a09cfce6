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

//! # Audioshelf
//!
//! An offline media library for music and audiobooks.
//!
//! Tracks, playlists and the play history live in a local SQLite database
//! behind a [`db::Store`]. A [`session::PlaybackSession`] drives a single
//! audio output over the [`player::AudioEngine`] seam, keeps the play queue
//! and the [`library::Library`] snapshot, and writes play counts, ratings and
//! history back to the store.
//!
//! Engines report back over a `std::sync::mpsc` channel, so a session runs on
//! one thread and owns everything it mutates.

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod library;
pub mod model;
pub mod player;
pub mod queue;
pub mod session;
pub mod stats;
pub mod util;

pub use error::{Error, Result};
