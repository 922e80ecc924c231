//! WebStorage - browser `localStorage` backend
//!
//! `localStorage` is synchronous, so unlike IndexedDB there is no hydration
//! step and no fire-and-forget task: every call completes before returning.
//!
//! If `localStorage` is unavailable (private browsing, third-party iframe,
//! storage disabled by policy) the backend reports
//! [`PersistenceState::MemoryOnly`] and every call becomes a no-op, leaving
//! the stores' in-memory state as the only copy.

use crate::{PersistenceState, StorageBackend, StoreError, StoreResult};
use tracing::warn;
use wasm_bindgen::JsValue;

/// A storage backend over the browser's `localStorage`.
pub struct WebStorage {
	/// `None` if `localStorage` is unavailable/blocked
	storage: Option<web_sys::Storage>,
}

impl WebStorage {
	/// Binds to `window.localStorage`, falling back to memory-only mode when
	/// it cannot be reached.
	pub fn new() -> Self {
		match Self::local_storage() {
			Ok(storage) => Self {
				storage: Some(storage),
			},
			Err(e) => {
				warn!(
					error = %e,
					"localStorage unavailable, falling back to memory-only state; \
					 nothing will persist across page refreshes"
				);
				Self { storage: None }
			}
		}
	}

	/// Returns `true` if `localStorage` persistence is available.
	pub fn is_persisted(&self) -> bool {
		self.storage.is_some()
	}

	fn local_storage() -> StoreResult<web_sys::Storage> {
		let window = web_sys::window().ok_or(StoreError::Unavailable)?;
		window
			.local_storage()
			.map_err(js_error)?
			.ok_or(StoreError::Unavailable)
	}
}

impl Default for WebStorage {
	fn default() -> Self {
		Self::new()
	}
}

fn js_error(e: JsValue) -> StoreError {
	StoreError::Backend(format!("{:?}", e))
}

impl StorageBackend for WebStorage {
	fn read(&self, key: &str) -> StoreResult<Option<String>> {
		let Some(storage) = &self.storage else {
			return Ok(None);
		};
		storage.get_item(key).map_err(js_error)
	}

	fn write(&self, key: &str, value: &str) -> StoreResult<()> {
		let Some(storage) = &self.storage else {
			return Ok(());
		};
		// Throws QuotaExceededError when the origin is out of space.
		storage.set_item(key, value).map_err(js_error)
	}

	fn remove(&self, key: &str) -> StoreResult<()> {
		let Some(storage) = &self.storage else {
			return Ok(());
		};
		storage.remove_item(key).map_err(js_error)
	}

	fn persistence_state(&self) -> PersistenceState {
		if self.is_persisted() {
			PersistenceState::Persisted
		} else {
			PersistenceState::MemoryOnly
		}
	}
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
	use super::*;
	use wasm_bindgen_test::*;

	wasm_bindgen_test_configure!(run_in_browser);

	#[wasm_bindgen_test]
	fn test_basic_operations() {
		let storage = WebStorage::new();
		if !storage.is_persisted() {
			return;
		}

		storage.remove("edustate-test-basic").unwrap();
		assert_eq!(storage.read("edustate-test-basic").unwrap(), None);

		storage.write("edustate-test-basic", "{\"a\":1}").unwrap();
		assert_eq!(
			storage.read("edustate-test-basic").unwrap().as_deref(),
			Some("{\"a\":1}")
		);

		storage.remove("edustate-test-basic").unwrap();
		assert_eq!(storage.read("edustate-test-basic").unwrap(), None);
	}

	#[wasm_bindgen_test]
	fn test_persistence_state() {
		let storage = WebStorage::new();
		let state = storage.persistence_state();
		assert_eq!(storage.is_persisted(), state == PersistenceState::Persisted);
	}
}
