use crate::{PersistenceState, StorageBackend, StoreResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// A storage backend that keeps documents in a process-local map.
///
/// Nothing survives a restart. Used in tests and wherever durable storage is
/// not wanted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of documents currently held.
	pub fn len(&self) -> usize {
		self.items().len()
	}

	pub fn is_empty(&self) -> bool {
		self.items().is_empty()
	}

	/// Returns `true` if a document is stored under `key`.
	pub fn contains(&self, key: &str) -> bool {
		self.items().contains_key(key)
	}

	fn items(&self) -> MutexGuard<'_, HashMap<String, String>> {
		// A panic while holding the lock cannot leave a half-written map.
		self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl StorageBackend for MemoryStorage {
	fn read(&self, key: &str) -> StoreResult<Option<String>> {
		Ok(self.items().get(key).cloned())
	}

	fn write(&self, key: &str, value: &str) -> StoreResult<()> {
		self.items().insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> StoreResult<()> {
		self.items().remove(key);
		Ok(())
	}

	fn persistence_state(&self) -> PersistenceState {
		PersistenceState::MemoryOnly
	}
}
