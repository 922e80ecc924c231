use crate::{PersistenceState, Persisted, SharedBackend, StorageBackend};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Version tag written into every persisted document.
///
/// A document carrying any other version is discarded on load and the store
/// starts from its defaults.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
	version: u32,
	state: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
	version: u32,
	state: Value,
}

/// A typed in-memory state mirrored to a namespaced document in a
/// [`StorageBackend`].
///
/// The in-memory state is the source of truth. Each mutation through
/// [`set`](Self::set) writes the state's [`Persisted::Snapshot`] through to
/// the backend. Backend failures are logged and dropped, so the store
/// degrades to memory-only operation without surfacing an error.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use edustate::{MemoryStorage, PersistentStore, SharedBackend, UiState};
///
/// let backend: SharedBackend = Arc::new(MemoryStorage::new());
/// let mut store: PersistentStore<UiState> = PersistentStore::open("app-storage", backend.clone());
///
/// store.set(|state| state.sidebar_open = false);
/// assert!(!store.get().sidebar_open);
///
/// // A second store opened on the same key warms from the persisted document.
/// let reopened: PersistentStore<UiState> = PersistentStore::open("app-storage", backend);
/// assert!(!reopened.get().sidebar_open);
/// ```
pub struct PersistentStore<S: Persisted> {
	key: String,
	state: S,
	backend: SharedBackend,
}

impl<S: Persisted> PersistentStore<S> {
	/// Opens the store under `key`, warming it from the backend.
	///
	/// Falls back to `S::default()` when the document is absent, corrupt or
	/// written by a different snapshot version.
	pub fn open(key: impl Into<String>, backend: SharedBackend) -> Self {
		let key = key.into();
		let state = match Self::try_load(&key, backend.as_ref()) {
			Some(snapshot) => S::restore(snapshot),
			None => S::default(),
		};

		Self {
			key,
			state,
			backend,
		}
	}

	/// Attempts to read and decode the persisted snapshot stored under `key`.
	///
	/// Never fails: every problem is logged and reported as `None`.
	pub fn try_load(key: &str, backend: &dyn StorageBackend) -> Option<S::Snapshot> {
		let raw = match backend.read(key) {
			Ok(Some(raw)) => raw,
			Ok(None) => {
				debug!(key = %key, "no persisted state, starting from defaults");
				return None;
			}
			Err(e) => {
				warn!(key = %key, error = %e, "failed to read persisted state, starting from defaults");
				return None;
			}
		};

		let envelope: Envelope = match serde_json::from_str(&raw) {
			Ok(envelope) => envelope,
			Err(e) => {
				warn!(key = %key, error = %e, "corrupt persisted state, starting from defaults");
				return None;
			}
		};

		if envelope.version != SNAPSHOT_VERSION {
			warn!(
				key = %key,
				found = envelope.version,
				expected = SNAPSHOT_VERSION,
				"persisted state has an unsupported version, starting from defaults"
			);
			return None;
		}

		match serde_json::from_value(envelope.state) {
			Ok(snapshot) => Some(snapshot),
			Err(e) => {
				warn!(key = %key, error = %e, "persisted state does not match the current schema, starting from defaults");
				None
			}
		}
	}

	/// The namespace key this store persists under.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// The backend this store writes through to.
	pub fn backend(&self) -> &SharedBackend {
		&self.backend
	}

	/// Returns a copy of the current state.
	pub fn get(&self) -> S {
		self.state.clone()
	}

	/// Runs `f` against the current state without copying it.
	pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
		f(&self.state)
	}

	/// Applies a mutation to the state and writes the persisted subset through.
	///
	/// Nested values are replaced wholesale unless `f` itself carries prior
	/// values over.
	pub fn set<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
		let result = f(&mut self.state);
		self.persist();
		result
	}

	/// Resets the state to its defaults and removes the persisted document.
	pub fn clear(&mut self) {
		self.state = S::default();
		if let Err(e) = self.backend.remove(&self.key) {
			warn!(key = %self.key, error = %e, "failed to remove persisted state");
		}
	}

	/// Reports whether this store's writes survive a restart.
	pub fn persistence_state(&self) -> PersistenceState {
		self.backend.persistence_state()
	}

	fn persist(&self) {
		let snapshot = self.state.snapshot();
		let envelope = EnvelopeRef {
			version: SNAPSHOT_VERSION,
			state: &snapshot,
		};

		let json = match serde_json::to_string(&envelope) {
			Ok(json) => json,
			Err(e) => {
				warn!(key = %self.key, error = %e, "failed to serialize state");
				return;
			}
		};

		if let Err(e) = self.backend.write(&self.key, &json) {
			// Still held in memory; the write is dropped.
			warn!(key = %self.key, error = %e, "failed to persist state");
		}
	}
}
