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

//! Library-wide error type.

use thiserror::Error;

use crate::{db::StoreError, player::EngineError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read media metadata: {0}")]
    Metadata(#[from] lofty::error::LoftyError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
