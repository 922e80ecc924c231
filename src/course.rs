use crate::store::PersistentStore;
use crate::{Persisted, SharedBackend};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Learning progress of one video inside a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseVideoProgress {
	pub video_id: String,
	/// Once set, never cleared by progress updates.
	pub completed: bool,
	/// Seconds.
	pub watch_time: f64,
	/// Seconds.
	pub last_position: f64,
}

impl CourseVideoProgress {
	fn new(video_id: &str) -> Self {
		Self {
			video_id: video_id.to_string(),
			completed: false,
			watch_time: 0.0,
			last_position: 0.0,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseState {
	/// The course being viewed; never persisted.
	pub current_course: Option<String>,
	pub progress: BTreeMap<String, CourseVideoProgress>,
	pub favorite_courses: Vec<String>,
	/// Seconds.
	pub total_watch_time: f64,
	/// In completion order.
	pub completed_videos: Vec<String>,
}

/// The persisted part of [`CourseState`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseSnapshot {
	progress: BTreeMap<String, CourseVideoProgress>,
	favorite_courses: Vec<String>,
	total_watch_time: f64,
	completed_videos: Vec<String>,
}

impl Persisted for CourseState {
	type Snapshot = CourseSnapshot;

	fn snapshot(&self) -> CourseSnapshot {
		CourseSnapshot {
			progress: self.progress.clone(),
			favorite_courses: self.favorite_courses.clone(),
			total_watch_time: self.total_watch_time,
			completed_videos: self.completed_videos.clone(),
		}
	}

	fn restore(snapshot: CourseSnapshot) -> Self {
		Self {
			current_course: None,
			progress: snapshot.progress,
			favorite_courses: snapshot.favorite_courses,
			total_watch_time: snapshot.total_watch_time,
			completed_videos: snapshot.completed_videos,
		}
	}
}

fn non_negative(seconds: f64) -> f64 {
	if seconds.is_finite() {
		seconds.max(0.0)
	} else {
		0.0
	}
}

/// Per-video learning progress, favorite courses and watch-time totals.
pub struct CourseStore {
	inner: PersistentStore<CourseState>,
}

impl CourseStore {
	/// Opens the store, restoring the document under `key` if it has one.
	///
	/// # Arguments
	/// * `key` - Storage key of the document
	/// * `backend` - Where the document is read from and written to
	pub fn open(key: impl Into<String>, backend: SharedBackend) -> Self {
		Self {
			inner: PersistentStore::open(key, backend),
		}
	}

	/// Returns a copy of the current state.
	pub fn get(&self) -> CourseState {
		self.inner.get()
	}

	/// Restores the defaults and removes the stored document.
	pub fn reset(&mut self) {
		self.inner.clear();
	}

	pub fn set_current_course(&mut self, course_id: &str) {
		self.inner
			.set(|s| s.current_course = Some(course_id.to_string()));
	}

	/// Records the watch time and position of `video_id`, keeping its
	/// completion flag, and adds `watch_time` to the running total.
	pub fn update_progress(&mut self, video_id: &str, watch_time: f64, position: f64) {
		let watch_time = non_negative(watch_time);
		let position = non_negative(position);

		self.inner.set(|s| {
			let entry = s
				.progress
				.entry(video_id.to_string())
				.or_insert_with(|| CourseVideoProgress::new(video_id));
			entry.watch_time = watch_time;
			entry.last_position = position;
			s.total_watch_time += watch_time;
		});
	}

	/// Marks `video_id` completed. Completing a video twice records it once.
	pub fn mark_video_completed(&mut self, video_id: &str) {
		self.inner.set(|s| {
			s.progress
				.entry(video_id.to_string())
				.or_insert_with(|| CourseVideoProgress::new(video_id))
				.completed = true;
			if !s.completed_videos.iter().any(|id| id == video_id) {
				s.completed_videos.push(video_id.to_string());
			}
		});
	}

	/// The recorded progress of `video_id`, if it was ever watched or completed.
	pub fn progress_of(&self, video_id: &str) -> Option<CourseVideoProgress> {
		self.inner.read(|s| s.progress.get(video_id).cloned())
	}

	pub fn is_video_completed(&self, video_id: &str) -> bool {
		self.inner
			.read(|s| s.progress.get(video_id).is_some_and(|p| p.completed))
	}

	/// Adds `course_id` to the favorites, or removes it if already there.
	///
	/// # Returns
	/// Whether `course_id` is a favorite afterwards.
	pub fn toggle_favorite_course(&mut self, course_id: &str) -> bool {
		self.inner.set(|s| {
			if let Some(pos) = s.favorite_courses.iter().position(|id| id == course_id) {
				s.favorite_courses.remove(pos);
				false
			} else {
				s.favorite_courses.push(course_id.to_string());
				true
			}
		})
	}

	pub fn is_favorite_course(&self, course_id: &str) -> bool {
		self.inner
			.read(|s| s.favorite_courses.iter().any(|id| id == course_id))
	}

	/// Percentage (0–100, rounded) of `video_ids` that are completed. An
	/// empty course is 0% complete.
	pub fn course_progress<S: AsRef<str>>(&self, video_ids: &[S]) -> u8 {
		if video_ids.is_empty() {
			return 0;
		}
		let completed = video_ids
			.iter()
			.filter(|id| self.is_video_completed(id.as_ref()))
			.count();
		((completed as f64 / video_ids.len() as f64) * 100.0).round() as u8
	}
}
