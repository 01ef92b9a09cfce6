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

//! Application configuration.
//!
//! This module manages the application configuration file. A missing or
//! unreadable file yields the defaults.

use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_VOLUME;

const CONFIG_NAME: &str = "audioshelf";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    /// Location of the library database. Relative paths are resolved against
    /// the configuration directory.
    pub database_file: PathBuf,
    /// Volume each session starts at, `0.0..=1.0`.
    pub initial_volume: f64,
    /// Number of history entries shown as recent plays.
    pub history_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            database_file: PathBuf::from("library.db"),
            initial_volume: DEFAULT_VOLUME,
            history_limit: 50,
        }
    }
}

impl AppConfig {
    /// The database path, resolved against the configuration directory.
    pub fn database_path(&self) -> PathBuf {
        if self.database_file.is_absolute() {
            return self.database_file.clone();
        }

        match confy::get_configuration_file_path(CONFIG_NAME, None) {
            Ok(config_file) => match config_file.parent() {
                Some(dir) => dir.join(&self.database_file),
                None => self.database_file.clone(),
            },
            Err(e) => {
                warn!("Failed to locate configuration directory: {}", e);
                self.database_file.clone()
            }
        }
    }
}

pub fn load_config() -> AppConfig {
    confy::load(CONFIG_NAME, None).unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    })
}
