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

//! # Audioshelf command line.
//!
//! Imports the files and directories given as arguments into the library,
//! then prints the library, the most recent plays and the listening
//! statistics.
//!
//! Built with the `mpv` feature it goes on to play the whole library through
//! libmpv, advancing track by track until interrupted.

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use log::{info, warn};

use audioshelf::{
    config::{self, AppConfig},
    db::Store,
    import::{collect_audio_files, track_from_file},
    library::Library,
    stats::LibraryStats,
    util::format::{format_listening_time, format_time},
};

fn main() -> Result<()> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    let config = config::load_config();
    let db_path = config.database_path();
    info!("Using library {}", db_path.display());

    let store = Arc::new(Store::open(&db_path));

    let paths: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();
    let imported = import_paths(&store, &paths)?;
    if imported > 0 {
        info!("Imported {} tracks", imported);
    }

    print_library(&store, &config)?;

    #[cfg(feature = "mpv")]
    play_library(store, &config)?;

    Ok(())
}

/// Adds every audio file under `paths` to the store, skipping files that
/// cannot be read.
fn import_paths(store: &Store, paths: &[PathBuf]) -> Result<usize> {
    let mut imported = 0;

    for path in collect_audio_files(paths) {
        let track = match track_from_file(&path) {
            Ok(track) => track,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        store
            .add_track(&track)
            .with_context(|| format!("Failed to add {} to the library", display_name(&path)))?;
        imported += 1;
    }

    Ok(imported)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_library(store: &Store, config: &AppConfig) -> Result<()> {
    let mut library = Library::new();
    library.refresh(store).context("Failed to load library")?;

    println!("Library ({} tracks)", library.len());
    for track in library.tracks() {
        let rating = if track.liked {
            "+"
        } else if track.disliked {
            "-"
        } else {
            " "
        };
        println!(
            " {} {:>5}  {} - {}  [{}, played {}]",
            rating,
            format_time(track.duration),
            track.artist,
            track.title,
            track.kind,
            track.play_count
        );
    }

    let recent = store
        .get_history(Some(config.history_limit))
        .context("Failed to load recent plays")?;

    println!();
    println!("Recently played");
    for play in library.recent_plays(&recent) {
        let played_at = play.entry.played_at.with_timezone(&chrono::Local);
        match play.track {
            Some(track) => println!(
                " {}  {} - {}",
                played_at.format("%Y-%m-%d %H:%M"),
                track.artist,
                track.title
            ),
            None => println!(" {}  (removed track)", played_at.format("%Y-%m-%d %H:%M")),
        }
    }

    let history = store.get_history(None).context("Failed to load history")?;
    let stats = LibraryStats::compute(library.tracks(), &history);

    println!();
    println!("Plays:          {}", stats.total_play_count);
    println!("Total length:   {}", format_listening_time(stats.total_duration));
    println!("Liked:          {}", stats.liked_count);
    println!(
        "Music / books:  {} / {}",
        stats.music_count, stats.audiobook_count
    );

    const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    let by_day: Vec<String> = WEEKDAYS
        .iter()
        .zip(stats.plays_by_weekday)
        .map(|(day, plays)| format!("{day} {plays}"))
        .collect();
    println!("By weekday:     {}", by_day.join(", "));

    for (id, plays) in &stats.most_played {
        if let Some(track) = library.find(id) {
            println!("  {:>4}x  {} - {}", plays, track.artist, track.title);
        }
    }

    Ok(())
}

#[cfg(feature = "mpv")]
fn play_library(store: Arc<Store>, config: &AppConfig) -> Result<()> {
    use std::sync::mpsc;

    use audioshelf::{player::MpvEngine, session::PlaybackSession};

    let (event_tx, event_rx) = mpsc::channel();
    let engine = MpvEngine::new(event_tx).context("Failed to start audio engine")?;

    let mut session = PlaybackSession::new(store, engine, event_rx);
    session.load_tracks().context("Failed to load library")?;
    session
        .set_volume(config.initial_volume)
        .context("Failed to set volume")?;

    let Some(first) = session.tracks().first().cloned() else {
        info!("Nothing to play");
        return Ok(());
    };

    session.play_track(&first).context("Failed to start playback")?;
    session.run();

    Ok(())
}
