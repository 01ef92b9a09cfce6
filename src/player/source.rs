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

//! Ephemeral playable locators.
//!
//! Track payloads live inside the database, but audio engines want something
//! they can open. A [`PlayableSource`] writes a payload out to a private
//! temporary file that exists exactly as long as the value does.

use std::{
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::model::Track;

/// A temporary on-disk copy of a track's payload.
///
/// The file is removed when the value is dropped or [released](Self::release).
#[derive(Debug)]
pub struct PlayableSource {
    track_id: String,
    file: NamedTempFile,
}

impl PlayableSource {
    /// Writes the payload of `track` to a new temporary file in `dir`.
    pub fn materialize(track: &Track, dir: &Path) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("audioshelf-")
            .suffix(".media")
            .tempfile_in(dir)?;

        file.write_all(&track.file)?;
        file.flush()?;

        Ok(Self {
            track_id: track.id.clone(),
            file,
        })
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the temporary file, reporting any failure to do so.
    pub fn release(self) -> io::Result<()> {
        self.file.close()
    }
}
