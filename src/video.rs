//! Video preferences, playback progress and watch history
//!
//! The media player reports progress roughly once a second through
//! [`VideoStore::on_progress_tick`] and fires
//! [`VideoStore::on_playback_start`] when playback begins. Ticks only touch
//! the per-URL progress record; history entries are snapshotted from that
//! record when playback (re)starts.

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::store::PersistentStore;
use crate::{Persisted, SharedBackend};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
	pub url: String,
	pub title: String,
	pub watched_at: DateTime<Utc>,
	/// Fraction played, `0.0..=1.0`.
	pub progress: f64,
	/// Seconds.
	pub last_position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
	pub url: String,
	pub title: String,
	pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProgress {
	/// Fraction played, `0.0..=1.0`.
	pub progress: f64,
	/// Seconds.
	pub last_position: f64,
	pub last_watched: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoState {
	pub current_video: Option<String>,
	pub is_playing: bool,
	pub current_time: f64,
	pub volume: f64,
	pub playback_rate: f64,
	pub quality: String,
	pub playlist: Vec<String>,
	pub current_index: Option<usize>,
	/// Most recent first.
	pub watch_history: Vec<WatchHistoryEntry>,
	/// Most recently added first.
	pub favorites: Vec<FavoriteEntry>,
	pub video_progress: BTreeMap<String, VideoProgress>,
}

impl Default for VideoState {
	fn default() -> Self {
		Self {
			current_video: None,
			is_playing: false,
			current_time: 0.0,
			volume: 1.0,
			playback_rate: 1.0,
			quality: "auto".to_string(),
			playlist: Vec::new(),
			current_index: None,
			watch_history: Vec::new(),
			favorites: Vec::new(),
			video_progress: BTreeMap::new(),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSnapshot {
	watch_history: Vec<WatchHistoryEntry>,
	favorites: Vec<FavoriteEntry>,
	video_progress: BTreeMap<String, VideoProgress>,
	volume: f64,
	playback_rate: f64,
	quality: String,
}

impl Default for VideoSnapshot {
	fn default() -> Self {
		VideoState::default().snapshot()
	}
}

impl Persisted for VideoState {
	type Snapshot = VideoSnapshot;

	fn snapshot(&self) -> VideoSnapshot {
		VideoSnapshot {
			watch_history: self.watch_history.clone(),
			favorites: self.favorites.clone(),
			video_progress: self.video_progress.clone(),
			volume: self.volume,
			playback_rate: self.playback_rate,
			quality: self.quality.clone(),
		}
	}

	fn restore(snapshot: VideoSnapshot) -> Self {
		Self {
			watch_history: dedup_by_url("watch history", snapshot.watch_history, |e| &e.url),
			favorites: dedup_by_url("favorites", snapshot.favorites, |e| &e.url),
			video_progress: snapshot.video_progress,
			volume: snapshot.volume,
			playback_rate: snapshot.playback_rate,
			quality: snapshot.quality,
			..Default::default()
		}
	}
}

/// Keeps the first entry for each URL.
fn dedup_by_url<T>(list: &str, entries: Vec<T>, url: impl Fn(&T) -> &String) -> Vec<T> {
	let before = entries.len();
	let mut seen = HashSet::new();
	let entries: Vec<T> = entries
		.into_iter()
		.filter(|e| seen.insert(url(e).clone()))
		.collect();
	if entries.len() != before {
		warn!(
			list,
			dropped = before - entries.len(),
			"stored document repeats URLs; keeping the first of each"
		);
	}
	entries
}

/// Clamps a reported fraction into `0.0..=1.0`; NaN becomes `0.0`.
fn clamp_fraction(fraction: f64) -> f64 {
	if fraction.is_nan() {
		0.0
	} else {
		fraction.clamp(0.0, 1.0)
	}
}

/// Clamps a reported position to a finite, non-negative number of seconds.
fn clamp_seconds(seconds: f64) -> f64 {
	if seconds.is_finite() {
		seconds.max(0.0)
	} else {
		0.0
	}
}

/// Formats a playback position as `m:ss`, or `h:mm:ss` from one hour up.
///
/// ```
/// assert_eq!(edustate::format_playback_time(75.0), "1:15");
/// assert_eq!(edustate::format_playback_time(3725.4), "1:02:05");
/// ```
pub fn format_playback_time(seconds: f64) -> String {
	let total = clamp_seconds(seconds) as u64;
	let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
	if hours > 0 {
		format!("{hours}:{minutes:02}:{secs:02}")
	} else {
		format!("{minutes}:{secs:02}")
	}
}

/// Player preferences, playlist, watch history, favorites and per-URL
/// progress of this profile.
pub struct VideoStore {
	inner: PersistentStore<VideoState>,
	history_limit: usize,
}

impl VideoStore {
	pub fn open(key: impl Into<String>, backend: SharedBackend) -> Self {
		Self::with_history_limit(key, backend, DEFAULT_HISTORY_LIMIT)
	}

	pub fn with_history_limit(
		key: impl Into<String>,
		backend: SharedBackend,
		history_limit: usize,
	) -> Self {
		let mut store = Self {
			inner: PersistentStore::open(key, backend),
			history_limit: history_limit.max(1),
		};
		// A document written under a larger limit is trimmed on load.
		if store.inner.read(|s| s.watch_history.len()) > store.history_limit {
			let limit = store.history_limit;
			store.inner.set(|s| s.watch_history.truncate(limit));
		}
		store
	}

	pub fn get(&self) -> VideoState {
		self.inner.get()
	}

	/// Clears every preference and record and removes the persisted document.
	pub fn reset(&mut self) {
		self.inner.clear();
	}

	// Progress tracking

	/// Records the latest progress of `url`, replacing any previous record.
	pub fn on_progress_tick(&mut self, url: &str, fraction_played: f64, elapsed_seconds: f64) {
		let progress = clamp_fraction(fraction_played);
		let last_position = clamp_seconds(elapsed_seconds);
		if progress != fraction_played || last_position != elapsed_seconds {
			debug!(
				url = %url,
				fraction_played,
				elapsed_seconds,
				"clamped out-of-range playback progress"
			);
		}

		self.inner.set(|s| {
			s.video_progress.insert(
				url.to_string(),
				VideoProgress {
					progress,
					last_position,
					last_watched: Utc::now(),
				},
			);
		});
	}

	/// Moves `url` to the front of the watch history, snapshotting its
	/// latest progress, and drops entries beyond the history limit.
	pub fn on_playback_start(&mut self, url: &str, title: &str) {
		let limit = self.history_limit;
		self.inner.set(|s| {
			let (progress, last_position) = s
				.video_progress
				.get(url)
				.map_or((0.0, 0.0), |p| (p.progress, p.last_position));

			s.watch_history.retain(|entry| entry.url != url);
			s.watch_history.insert(
				0,
				WatchHistoryEntry {
					url: url.to_string(),
					title: title.to_string(),
					watched_at: Utc::now(),
					progress,
					last_position,
				},
			);
			s.watch_history.truncate(limit);
		});
	}

	/// The latest progress record of `url`, `None` if it was never played.
	pub fn query_progress(&self, url: &str) -> Option<VideoProgress> {
		self.inner.read(|s| s.video_progress.get(url).cloned())
	}

	pub fn watch_history(&self) -> Vec<WatchHistoryEntry> {
		self.inner.read(|s| s.watch_history.clone())
	}

	// Favorites

	pub fn favorites(&self) -> Vec<FavoriteEntry> {
		self.inner.read(|s| s.favorites.clone())
	}

	pub fn is_favorite(&self, url: &str) -> bool {
		self.inner.read(|s| s.favorites.iter().any(|f| f.url == url))
	}

	/// Adds `url` to the front of the favorites. No-op if already present.
	pub fn add_to_favorites(&mut self, url: &str, title: &str) {
		if self.is_favorite(url) {
			return;
		}
		self.inner.set(|s| {
			s.favorites.insert(
				0,
				FavoriteEntry {
					url: url.to_string(),
					title: title.to_string(),
					added_at: Utc::now(),
				},
			);
		});
	}

	/// Removes `url` from the favorites. No-op if absent.
	pub fn remove_from_favorites(&mut self, url: &str) {
		if !self.is_favorite(url) {
			return;
		}
		self.inner.set(|s| s.favorites.retain(|f| f.url != url));
	}

	/// Adds `url` if absent, removes it if present. Returns whether it is a
	/// favorite afterwards.
	pub fn toggle_favorite(&mut self, url: &str, title: &str) -> bool {
		if self.is_favorite(url) {
			self.remove_from_favorites(url);
			false
		} else {
			self.add_to_favorites(url, title);
			true
		}
	}

	// Player controls

	/// Starts `video_id` from the beginning.
	pub fn set_current_video(&mut self, video_id: &str) {
		self.inner.set(|s| {
			s.current_video = Some(video_id.to_string());
			s.current_time = 0.0;
			s.is_playing = true;
		});
	}

	pub fn play(&mut self) {
		self.inner.set(|s| s.is_playing = true);
	}

	pub fn pause(&mut self) {
		self.inner.set(|s| s.is_playing = false);
	}

	pub fn seek_to(&mut self, seconds: f64) {
		let seconds = clamp_seconds(seconds);
		self.inner.set(|s| s.current_time = seconds);
	}

	/// Sets the volume, clamped into `0.0..=1.0`.
	pub fn set_volume(&mut self, volume: f64) {
		let volume = clamp_fraction(volume);
		self.inner.set(|s| s.volume = volume);
	}

	/// Ignores rates that are not finite and positive.
	pub fn set_playback_rate(&mut self, rate: f64) {
		if !(rate.is_finite() && rate > 0.0) {
			debug!(rate, "ignoring invalid playback rate");
			return;
		}
		self.inner.set(|s| s.playback_rate = rate);
	}

	pub fn set_quality(&mut self, quality: &str) {
		self.inner.set(|s| s.quality = quality.to_string());
	}

	// Playlist

	/// Appends `video_id` unless it is already queued.
	pub fn add_to_playlist(&mut self, video_id: &str) {
		if self.inner.read(|s| s.playlist.iter().any(|id| id == video_id)) {
			return;
		}
		self.inner.set(|s| s.playlist.push(video_id.to_string()));
	}

	/// Removes `video_id` from the playlist.
	///
	/// If it was the current entry, the entry that slides into its slot (or
	/// the new last entry) becomes current.
	pub fn remove_from_playlist(&mut self, video_id: &str) {
		let Some(pos) = self
			.inner
			.read(|s| s.playlist.iter().position(|id| id == video_id))
		else {
			return;
		};

		self.inner.set(|s| {
			s.playlist.remove(pos);
			let Some(current) = s.current_index else {
				return;
			};

			if s.playlist.is_empty() {
				s.current_index = None;
				s.current_video = None;
			} else if pos < current {
				s.current_index = Some(current - 1);
			} else if pos == current {
				let index = current.min(s.playlist.len() - 1);
				s.current_index = Some(index);
				s.current_video = Some(s.playlist[index].clone());
				s.current_time = 0.0;
			}
		});
	}

	/// Advances to the next playlist entry. Returns `false` at the end.
	pub fn next_video(&mut self) -> bool {
		let next = self.inner.read(|s| {
			let next = s.current_index.map_or(0, |i| i + 1);
			(next < s.playlist.len()).then_some(next)
		});
		match next {
			Some(index) => {
				self.jump_to(index);
				true
			}
			None => false,
		}
	}

	/// Steps back to the previous playlist entry. Returns `false` at the start.
	pub fn previous_video(&mut self) -> bool {
		let previous = self
			.inner
			.read(|s| s.current_index.filter(|&i| i > 0).map(|i| i - 1));
		match previous {
			Some(index) => {
				self.jump_to(index);
				true
			}
			None => false,
		}
	}

	fn jump_to(&mut self, index: usize) {
		self.inner.set(|s| {
			s.current_index = Some(index);
			s.current_video = Some(s.playlist[index].clone());
			s.current_time = 0.0;
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{MemoryStorage, StorageBackend};
	use std::sync::Arc;

	fn store() -> VideoStore {
		VideoStore::open("video-storage", Arc::new(MemoryStorage::new()))
	}

	#[test]
	fn test_progress_is_last_write_wins() {
		let mut store = store();
		assert_eq!(store.query_progress("v1"), None);

		store.on_progress_tick("v1", 0.1, 12.0);
		store.on_progress_tick("v2", 0.9, 300.0);
		store.on_progress_tick("v1", 0.05, 6.0);

		let v1 = store.query_progress("v1").unwrap();
		assert_eq!((v1.progress, v1.last_position), (0.05, 6.0));
		let v2 = store.query_progress("v2").unwrap();
		assert_eq!((v2.progress, v2.last_position), (0.9, 300.0));
	}

	#[test]
	fn test_ticks_do_not_touch_history() {
		let mut store = store();
		store.on_progress_tick("v1", 0.5, 60.0);
		assert!(store.watch_history().is_empty());
	}

	#[test]
	fn test_progress_is_clamped() {
		let mut store = store();

		store.on_progress_tick("v1", 1.7, -3.0);
		let p = store.query_progress("v1").unwrap();
		assert_eq!((p.progress, p.last_position), (1.0, 0.0));

		store.on_progress_tick("v1", f64::NAN, f64::INFINITY);
		let p = store.query_progress("v1").unwrap();
		assert_eq!((p.progress, p.last_position), (0.0, 0.0));

		store.on_progress_tick("v1", -0.2, 42.5);
		let p = store.query_progress("v1").unwrap();
		assert_eq!((p.progress, p.last_position), (0.0, 42.5));
	}

	#[test]
	fn test_playback_start_snapshots_progress() {
		let mut store = store();
		store.on_playback_start("v1", "Unplayed");
		let entry = &store.watch_history()[0];
		assert_eq!((entry.progress, entry.last_position), (0.0, 0.0));

		store.on_progress_tick("v1", 0.4, 120.0);
		store.on_playback_start("v1", "Renamed");

		let history = store.watch_history();
		assert_eq!(history.len(), 1);
		assert_eq!(history[0].title, "Renamed");
		assert_eq!((history[0].progress, history[0].last_position), (0.4, 120.0));
	}

	#[test]
	fn test_restart_moves_entry_to_front() {
		let mut store = store();
		store.on_playback_start("v1", "One");
		store.on_playback_start("v2", "Two");
		store.on_playback_start("v3", "Three");
		store.on_playback_start("v1", "One");

		let urls: Vec<_> = store.watch_history().into_iter().map(|e| e.url).collect();
		assert_eq!(urls, vec!["v1", "v3", "v2"]);
	}

	#[test]
	fn test_history_is_capped() {
		let mut store = store();
		for i in 0..60 {
			store.on_playback_start(&format!("v{i}"), "Title");
		}

		let history = store.watch_history();
		assert_eq!(history.len(), 50);
		assert_eq!(history[0].url, "v59");
		assert_eq!(history[49].url, "v10");
	}

	#[test]
	fn test_cap_evicts_least_recently_started() {
		let mut store = VideoStore::with_history_limit(
			"video-storage",
			Arc::new(MemoryStorage::new()),
			3,
		);
		store.on_playback_start("a", "A");
		store.on_playback_start("b", "B");
		store.on_playback_start("c", "C");
		// `a` was inserted first but is now the most recent.
		store.on_playback_start("a", "A");
		store.on_playback_start("d", "D");

		let urls: Vec<_> = store.watch_history().into_iter().map(|e| e.url).collect();
		assert_eq!(urls, vec!["d", "a", "c"]);
	}

	#[test]
	fn test_reopen_trims_to_smaller_limit() {
		let backend: SharedBackend = Arc::new(MemoryStorage::new());
		let mut store = VideoStore::open("video-storage", backend.clone());
		for i in 0..10 {
			store.on_playback_start(&format!("v{i}"), "Title");
		}

		let reopened = VideoStore::with_history_limit("video-storage", backend, 4);
		let urls: Vec<_> = reopened.watch_history().into_iter().map(|e| e.url).collect();
		assert_eq!(urls, vec!["v9", "v8", "v7", "v6"]);
	}

	#[test]
	fn test_favorites_insert_once() {
		let mut store = store();
		store.add_to_favorites("video-42", "Demo Video");
		store.add_to_favorites("video-42", "Demo Video");
		assert_eq!(store.favorites().len(), 1);

		store.add_to_favorites("video-7", "Other");
		let urls: Vec<_> = store.favorites().into_iter().map(|f| f.url).collect();
		assert_eq!(urls, vec!["video-7", "video-42"]);
	}

	#[test]
	fn test_remove_favorite_is_idempotent() {
		let mut store = store();
		store.add_to_favorites("video-42", "Demo Video");
		store.remove_from_favorites("video-42");
		store.remove_from_favorites("video-42");
		assert!(store.favorites().is_empty());
		assert!(!store.is_favorite("video-42"));
	}

	#[test]
	fn test_toggle_favorite() {
		let mut store = store();
		assert!(store.toggle_favorite("v1", "One"));
		assert!(store.is_favorite("v1"));
		assert!(!store.toggle_favorite("v1", "One"));
		assert!(!store.is_favorite("v1"));
	}

	#[test]
	fn test_persists_allow_list_only() {
		let backend: SharedBackend = Arc::new(MemoryStorage::new());
		let mut store = VideoStore::open("video-storage", backend.clone());
		store.set_volume(0.3);
		store.set_playback_rate(1.5);
		store.set_quality("720p");
		store.add_to_playlist("v1");
		store.set_current_video("v1");
		store.seek_to(33.0);
		store.add_to_favorites("v1", "One");
		store.on_progress_tick("v1", 0.2, 33.0);
		store.on_playback_start("v1", "One");

		let reopened = VideoStore::open("video-storage", backend.clone()).get();
		assert_eq!(reopened.volume, 0.3);
		assert_eq!(reopened.playback_rate, 1.5);
		assert_eq!(reopened.quality, "720p");
		assert_eq!(reopened.favorites.len(), 1);
		assert_eq!(reopened.watch_history.len(), 1);
		assert!(reopened.video_progress.contains_key("v1"));
		assert_eq!(reopened.current_video, None);
		assert!(reopened.playlist.is_empty());
		assert!(!reopened.is_playing);
		assert_eq!(reopened.current_time, 0.0);

		let raw = backend.read("video-storage").unwrap().unwrap();
		let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
		assert!(doc["state"].get("playlist").is_none());
		assert!(doc["state"]["watchHistory"][0].get("lastPosition").is_some());
	}

	#[test]
	fn test_restore_drops_repeated_urls() {
		let backend: SharedBackend = Arc::new(MemoryStorage::new());
		let at = "2024-01-01T00:00:00Z";
		let doc = serde_json::json!({
			"version": 1,
			"state": {
				"favorites": [
					{"url": "v1", "title": "First", "addedAt": at},
					{"url": "v2", "title": "Two", "addedAt": at},
					{"url": "v1", "title": "Again", "addedAt": at},
				],
				"watchHistory": [
					{"url": "v3", "title": "Three", "watchedAt": at, "progress": 0.5, "lastPosition": 10.0},
					{"url": "v3", "title": "Three", "watchedAt": at, "progress": 0.1, "lastPosition": 2.0},
				],
			}
		});
		backend.write("video-storage", &doc.to_string()).unwrap();

		let mut store = VideoStore::open("video-storage", backend);
		let favorites = store.favorites();
		assert_eq!(favorites.len(), 2);
		assert_eq!(favorites[0].title, "First");
		let history = store.watch_history();
		assert_eq!(history.len(), 1);
		assert_eq!(history[0].last_position, 10.0);

		assert!(!store.toggle_favorite("v1", "First"));
		assert!(!store.is_favorite("v1"));
		assert_eq!(store.favorites().len(), 1);
	}

	#[test]
	fn test_missing_snapshot_fields_use_defaults() {
		let backend: SharedBackend = Arc::new(MemoryStorage::new());
		backend
			.write("video-storage", r#"{"version":1,"state":{"volume":0.5}}"#)
			.unwrap();

		let state = VideoStore::open("video-storage", backend).get();
		assert_eq!(state.volume, 0.5);
		assert_eq!(state.playback_rate, 1.0);
		assert_eq!(state.quality, "auto");
	}

	#[test]
	fn test_player_controls() {
		let mut store = store();
		store.set_current_video("v1");
		store.seek_to(-5.0);
		store.set_volume(3.0);
		store.set_playback_rate(0.0);
		store.set_playback_rate(f64::NAN);
		store.pause();

		let state = store.get();
		assert_eq!(state.current_video.as_deref(), Some("v1"));
		assert_eq!(state.current_time, 0.0);
		assert_eq!(state.volume, 1.0);
		assert_eq!(state.playback_rate, 1.0);
		assert!(!state.is_playing);

		store.play();
		assert!(store.get().is_playing);
	}

	#[test]
	fn test_playlist_navigation() {
		let mut store = store();
		assert!(!store.next_video());

		store.add_to_playlist("a");
		store.add_to_playlist("b");
		store.add_to_playlist("a");
		assert_eq!(store.get().playlist, vec!["a", "b"]);

		assert!(!store.previous_video());
		assert!(store.next_video());
		assert_eq!(store.get().current_video.as_deref(), Some("a"));
		assert!(store.next_video());
		assert_eq!(store.get().current_video.as_deref(), Some("b"));
		assert!(!store.next_video());
		assert!(store.previous_video());
		assert_eq!(store.get().current_index, Some(0));
	}

	#[test]
	fn test_remove_from_playlist_keeps_current() {
		let mut store = store();
		for id in ["a", "b", "c"] {
			store.add_to_playlist(id);
		}
		store.next_video();
		store.next_video();
		assert_eq!(store.get().current_video.as_deref(), Some("b"));

		// Removing an earlier entry shifts the index, not the video.
		store.remove_from_playlist("a");
		let state = store.get();
		assert_eq!(state.current_index, Some(0));
		assert_eq!(state.current_video.as_deref(), Some("b"));

		// Removing the current last entry falls back to the new last entry.
		store.next_video();
		store.remove_from_playlist("c");
		let state = store.get();
		assert_eq!(state.current_index, Some(0));
		assert_eq!(state.current_video.as_deref(), Some("b"));

		store.remove_from_playlist("b");
		let state = store.get();
		assert_eq!(state.current_index, None);
		assert_eq!(state.current_video, None);

		store.remove_from_playlist("missing");
	}

	#[test]
	fn test_format_playback_time() {
		assert_eq!(format_playback_time(0.0), "0:00");
		assert_eq!(format_playback_time(9.9), "0:09");
		assert_eq!(format_playback_time(600.0), "10:00");
		assert_eq!(format_playback_time(3600.0), "1:00:00");
		assert_eq!(format_playback_time(-1.0), "0:00");
		assert_eq!(format_playback_time(f64::NAN), "0:00");
	}
}
