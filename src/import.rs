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

//! Building tracks from files on disk.
//!
//! Uses `WalkDir` to expand directories and `Lofty` to probe each file for its
//! duration. Titles and artists come from the file name, which is expected to
//! look like `Artist - Title - Album`; the album part is optional. A name
//! without a title part is used whole, as both title and artist.

use std::{
    fs,
    path::{Path, PathBuf},
};

use lofty::{prelude::*, probe::Probe};
use log::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::{
    error::Result,
    model::{Track, TrackKind},
};

const UNKNOWN_ARTIST: &str = "Unknown Artist";

const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "aiff", "alac", "ape", "flac", "m4a", "m4b", "mp3", "mp4", "mpc", "oga", "ogg", "opus",
    "wav", "wma", "wv",
];

/// File name words that mark an item as an audiobook.
const AUDIOBOOK_KEYWORDS: &[&str] = &["книга", "глава", "audiobook", "chapter"];

/// Expands `paths` into the audio files they name.
///
/// Files are kept as given, whatever their extension. Directories are walked
/// recursively and only files with a known audio extension are kept, sorted
/// by path. Unreadable entries are skipped.
pub fn collect_audio_files<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();

        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && is_audio_file(e.path()))
            .map(|e| e.into_path())
            .collect();

        found.sort();
        files.extend(found);
    }

    files
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Reads `path` into a new, never played track.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a recognisable audio
/// file.
pub fn track_from_file(path: &Path) -> Result<Track> {
    let tagged_file = Probe::open(path)?.read()?;
    let duration = tagged_file.properties().duration().as_secs_f64();

    let file = fs::read(path)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parsed = parse_file_name(&stem);
    let kind = kind_from_file_name(&name);

    let mut track = Track::new(
        Uuid::new_v4().to_string(),
        parsed.title,
        parsed.artist,
        duration,
        file,
        kind,
    );
    track.album = parsed.album;

    debug!("Read {} as {} ({:.1}s)", path.display(), track.id, duration);

    Ok(track)
}

#[derive(Debug, PartialEq, Eq)]
struct ParsedName {
    artist: String,
    title: String,
    album: Option<String>,
}

fn parse_file_name(stem: &str) -> ParsedName {
    let mut parts = stem.split(" - ").map(str::trim);

    let first = parts.next().unwrap_or_default();
    let second = parts.next();
    let third = parts.next();

    ParsedName {
        artist: (if first.is_empty() { UNKNOWN_ARTIST } else { first }).to_string(),
        title: second.filter(|t| !t.is_empty()).unwrap_or(stem).to_string(),
        album: third.filter(|a| !a.is_empty()).map(str::to_string),
    }
}

fn kind_from_file_name(name: &str) -> TrackKind {
    let name = name.to_lowercase();

    if AUDIOBOOK_KEYWORDS.iter().any(|k| name.contains(k)) {
        TrackKind::Audiobook
    } else {
        TrackKind::Music
    }
}
