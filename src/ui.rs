use crate::store::PersistentStore;
use crate::{Persisted, SharedBackend};
use serde::{Deserialize, Serialize};

/// Colour scheme of the application shell. Stored as `"light"`/`"dark"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	#[default]
	Light,
	Dark,
}

/// Layout preferences of the application shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
	pub sidebar_open: bool,
	pub theme: Theme,
	/// Unread notifications; never persisted.
	pub notification_count: u32,
}

impl Default for UiState {
	fn default() -> Self {
		Self {
			sidebar_open: true,
			theme: Theme::Light,
			notification_count: 0,
		}
	}
}

/// The persisted part of [`UiState`]. Missing fields take their defaults.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSnapshot {
	sidebar_open: bool,
	theme: Theme,
}

impl Default for UiSnapshot {
	fn default() -> Self {
		UiState::default().snapshot()
	}
}

impl Persisted for UiState {
	type Snapshot = UiSnapshot;

	fn snapshot(&self) -> UiSnapshot {
		UiSnapshot {
			sidebar_open: self.sidebar_open,
			theme: self.theme,
		}
	}

	fn restore(snapshot: UiSnapshot) -> Self {
		Self {
			sidebar_open: snapshot.sidebar_open,
			theme: snapshot.theme,
			..Default::default()
		}
	}
}

/// Shell layout preferences, persisted under the app namespace.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use edustate::{MemoryStorage, Theme, UiStore};
///
/// let mut ui = UiStore::open("app-storage", Arc::new(MemoryStorage::new()));
/// ui.toggle_sidebar();
/// ui.set_theme(Theme::Dark);
/// assert!(!ui.get().sidebar_open);
/// ```
pub struct UiStore {
	inner: PersistentStore<UiState>,
}

impl UiStore {
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
	pub fn get(&self) -> UiState {
		self.inner.get()
	}

	/// Restores the defaults and removes the stored document.
	pub fn reset(&mut self) {
		self.inner.clear();
	}

	/// Flips the sidebar between open and collapsed.
	pub fn toggle_sidebar(&mut self) {
		self.inner.set(|s| s.sidebar_open = !s.sidebar_open);
	}

	pub fn set_sidebar_open(&mut self, open: bool) {
		self.inner.set(|s| s.sidebar_open = open);
	}

	pub fn set_theme(&mut self, theme: Theme) {
		self.inner.set(|s| s.theme = theme);
	}

	/// Sets the unread badge count. Not persisted, so a reload shows zero.
	pub fn set_notification_count(&mut self, count: u32) {
		self.inner.set(|s| s.notification_count = count);
	}
}
