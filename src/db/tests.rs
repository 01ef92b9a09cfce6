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

use std::{sync::Arc, thread};

use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use super::*;
use crate::model::{TrackKind, now};

fn scratch_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("library.db"));
    (dir, store)
}

fn track(id: &str, title: &str) -> Track {
    let mut track = Track::new(id, title, "Artist", 180.5, vec![0xff, 0xfb, 0x90, 0x00], TrackKind::Music);
    track.album = Some("Album".to_string());
    track
}

fn entry(id: &str, track_id: &str, played_at: DateTime<Utc>) -> PlayHistory {
    PlayHistory {
        id: id.to_string(),
        track_id: track_id.to_string(),
        played_at,
        duration: 120.0,
    }
}

#[test]
fn open_does_not_touch_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");
    let store = Store::open(&path);

    assert!(!path.exists());

    assert!(store.get_all_tracks().unwrap().is_empty());
    assert!(path.exists());
}

#[test]
fn added_track_reads_back_identically() {
    let (_dir, store) = scratch_store();

    let mut played = track("b", "Second");
    played.play_count = 3;
    played.liked = true;
    played.last_played = Some(now());
    played.kind = TrackKind::Audiobook;
    played.album = None;

    let first = track("a", "First");
    store.add_track(&first).unwrap();
    store.add_track(&played).unwrap();

    assert_eq!(store.get_all_tracks().unwrap(), vec![first, played]);
}

#[test]
fn timestamps_keep_full_precision() {
    let (_dir, store) = scratch_store();

    let mut t = track("a", "First");
    t.added_date = Utc::now();
    t.last_played = Some(DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap());
    store.add_track(&t).unwrap();

    let at = DateTime::from_timestamp(1_700_000_001, 999_999_999).unwrap();
    let played = entry("h1", "a", at);
    store.add_history(&played).unwrap();

    assert_eq!(store.get_track("a").unwrap(), Some(t));
    assert_eq!(store.get_history(None).unwrap(), vec![played]);
}

#[test]
fn history_orders_within_a_millisecond() {
    let (_dir, store) = scratch_store();
    let base = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();

    store.add_history(&entry("later", "a", base + Duration::nanoseconds(900))).unwrap();
    store.add_history(&entry("earlier", "a", base + Duration::nanoseconds(100))).unwrap();

    let ids: Vec<String> = store.get_history(None).unwrap().into_iter().map(|h| h.id).collect();
    assert_eq!(ids, vec!["later", "earlier"]);
}

#[test]
fn unstorable_timestamp_is_rejected() {
    let (_dir, store) = scratch_store();
    let mut t = track("a", "First");
    t.added_date = DateTime::from_timestamp(300_000_000_000, 0).unwrap();

    let err = store.add_track(&t).unwrap_err();

    assert!(matches!(err, StoreError::Sqlite(rusqlite::Error::ToSqlConversionFailure(_))));
    assert!(store.get_all_tracks().unwrap().is_empty());
}

#[test]
fn adding_a_duplicate_track_fails() {
    let (_dir, store) = scratch_store();
    store.add_track(&track("a", "First")).unwrap();

    let err = store.add_track(&track("a", "Again")).unwrap_err();

    assert!(matches!(
        err,
        StoreError::DuplicateKey { collection: "track", ref id } if id == "a"
    ));
    assert_eq!(store.get_all_tracks().unwrap()[0].title, "First");
}

#[test]
fn update_replaces_the_whole_record_and_keeps_its_position() {
    let (_dir, store) = scratch_store();
    store.add_track(&track("a", "First")).unwrap();
    store.add_track(&track("b", "Second")).unwrap();

    let mut replacement = track("a", "Renamed");
    replacement.album = None;
    replacement.play_count = 7;
    store.update_track(&replacement).unwrap();

    let tracks = store.get_all_tracks().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0], replacement);
    assert_eq!(tracks[1].id, "b");
}

#[test]
fn update_inserts_an_unknown_track() {
    let (_dir, store) = scratch_store();

    store.update_track(&track("a", "First")).unwrap();

    assert_eq!(store.get_track("a").unwrap().map(|t| t.title), Some("First".to_string()));
}

#[test]
fn liked_and_disliked_together_is_rejected() {
    let (_dir, store) = scratch_store();

    let mut both = track("a", "First");
    both.liked = true;
    both.disliked = true;

    assert!(matches!(store.update_track(&both), Err(StoreError::Sqlite(_))));
}

#[test]
fn delete_is_idempotent() {
    let (_dir, store) = scratch_store();
    store.add_track(&track("a", "First")).unwrap();

    store.delete_track("a").unwrap();
    store.delete_track("a").unwrap();
    store.delete_track("never-existed").unwrap();

    assert!(store.get_track("a").unwrap().is_none());
}

#[test]
fn modify_track_works_on_the_stored_copy() {
    let (_dir, store) = scratch_store();
    let original = track("a", "First");
    store.add_track(&original).unwrap();

    let mut liked = original.clone();
    liked.liked = true;
    store.update_track(&liked).unwrap();

    // A stale copy must not undo the like when the play is recorded
    let at = now();
    let written = store.modify_track(&original, |t| t.record_play(at)).unwrap();

    assert!(written.liked);
    assert_eq!(written.play_count, 1);
    assert_eq!(store.get_track("a").unwrap(), Some(written));
}

#[test]
fn modify_track_falls_back_to_the_given_copy() {
    let (_dir, store) = scratch_store();

    let written = store.modify_track(&track("a", "First"), Track::toggle_like).unwrap();

    assert!(written.liked);
    assert_eq!(store.get_track("a").unwrap(), Some(written));
}

#[test]
fn playlists_support_the_same_operations() {
    let (_dir, store) = scratch_store();

    let mut mix = Playlist::new("Mix");
    mix.track_ids = vec!["a".into(), "b".into(), "a".into()];
    store.add_playlist(&mix).unwrap();
    store.add_playlist(&Playlist::new("Empty")).unwrap();

    assert!(matches!(
        store.add_playlist(&mix),
        Err(StoreError::DuplicateKey { collection: "playlist", .. })
    ));

    mix.name = "Weekend mix".into();
    mix.cover = Some("cover.png".into());
    mix.track_ids.push("c".into());
    store.update_playlist(&mix).unwrap();

    let playlists = store.get_all_playlists().unwrap();
    assert_eq!(playlists.len(), 2);
    assert_eq!(playlists[0], mix);
    assert_eq!(playlists[1].name, "Empty");

    store.delete_playlist(&mix.id).unwrap();
    store.delete_playlist(&mix.id).unwrap();
    assert_eq!(store.get_all_playlists().unwrap().len(), 1);
}

#[test]
fn deleting_a_track_leaves_playlists_and_history_alone() {
    let (_dir, store) = scratch_store();
    store.add_track(&track("a", "First")).unwrap();

    let mut list = Playlist::new("List");
    list.track_ids = vec!["a".into()];
    store.add_playlist(&list).unwrap();
    store.add_history(&entry("h1", "a", now())).unwrap();

    store.delete_track("a").unwrap();

    assert_eq!(store.get_all_playlists().unwrap()[0].track_ids, vec!["a"]);
    assert_eq!(store.get_history_for_track("a").unwrap().len(), 1);
}

#[test]
fn history_is_most_recent_first() {
    let (_dir, store) = scratch_store();
    let base = now();

    for (id, offset) in [("h1", 5), ("h2", 1), ("h3", 9), ("h4", 3)] {
        store
            .add_history(&entry(id, "a", base + Duration::seconds(offset)))
            .unwrap();
    }

    let ids: Vec<_> = store
        .get_history(None)
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["h3", "h1", "h4", "h2"]);

    let limited: Vec<_> = store
        .get_history(Some(2))
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(limited, vec!["h3", "h1"]);

    assert!(store.get_history(Some(0)).unwrap().is_empty());
    assert_eq!(store.get_history(Some(100)).unwrap().len(), 4);
}

#[test]
fn history_is_append_only() {
    let (_dir, store) = scratch_store();
    let first = entry("h1", "a", now());
    store.add_history(&first).unwrap();

    let err = store.add_history(&entry("h1", "b", now())).unwrap_err();

    assert!(matches!(err, StoreError::DuplicateKey { collection: "history", .. }));
    assert_eq!(store.get_history(None).unwrap(), vec![first]);
}

#[test]
fn history_for_track_filters_by_track() {
    let (_dir, store) = scratch_store();
    let base = now();

    store.add_history(&entry("h1", "a", base)).unwrap();
    store.add_history(&entry("h2", "b", base + Duration::seconds(1))).unwrap();
    store.add_history(&entry("h3", "a", base + Duration::seconds(2))).unwrap();

    let ids: Vec<_> = store
        .get_history_for_track("a")
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["h3", "h1"]);
}

#[test]
fn concurrent_first_callers_share_one_initialisation() {
    let (_dir, store) = scratch_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.add_track(&track(&format!("t{i}"), "Title")))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(store.get_all_tracks().unwrap().len(), 8);
}

#[test]
fn in_memory_store_works_without_a_file() {
    let store = Store::open_in_memory();

    store.add_track(&track("a", "First")).unwrap();

    assert_eq!(store.get_all_tracks().unwrap().len(), 1);
}

#[test]
fn data_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");

    let original = track("a", "First");
    Store::open(&path).add_track(&original).unwrap();

    let reopened = Store::open(&path);
    assert_eq!(reopened.get_all_tracks().unwrap(), vec![original]);
}
