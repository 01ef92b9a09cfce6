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

//! Human-readable renderings of times and durations.

/// Formats a duration in seconds into a `MM:SS` string.
///
/// Used for track positions and durations. Negative and non-finite input
/// renders as `00:00`.
///
/// # Examples
///
/// ```
/// use audioshelf::util::format::format_time;
///
/// assert_eq!(format_time(65.4), "01:05");
/// assert_eq!(format_time(3600.0), "60:00");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total_seconds = whole_seconds(seconds);
    let mins = total_seconds / 60;
    let secs = total_seconds % 60;
    format!("{:02}:{:02}", mins, secs)
}

/// Formats a total listening time as hours and minutes, e.g. `3h 25m`.
pub fn format_listening_time(seconds: f64) -> String {
    let total_seconds = whole_seconds(seconds);
    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    format!("{}h {}m", hours, mins)
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    }
}
