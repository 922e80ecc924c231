use crate::{PersistenceState, StorageBackend, StoreError, StoreResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const FILE_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// A storage backend that keeps one `<key>.json` file per document in a
/// directory.
///
/// This is the durable backend for native hosts. Writes go to a temporary
/// file that is renamed over the target, so a crash mid-write leaves either
/// the previous document or the new one.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
	storage_location: PathBuf,
}

impl DirectoryStorage {
	/// Opens (and creates if needed) the storage directory.
	pub fn new(storage_location: impl Into<PathBuf>) -> StoreResult<Self> {
		let storage_location = storage_location.into();
		fs::create_dir_all(&storage_location)?;
		Ok(Self { storage_location })
	}

	pub fn storage_location(&self) -> &Path {
		&self.storage_location
	}

	fn path_for(&self, key: &str, extension: &str) -> StoreResult<PathBuf> {
		let valid = !key.is_empty()
			&& !key.starts_with('.')
			&& key
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
		if !valid {
			return Err(StoreError::InvalidKey(key.to_string()));
		}
		Ok(self.storage_location.join(format!("{key}.{extension}")))
	}
}

impl StorageBackend for DirectoryStorage {
	fn read(&self, key: &str) -> StoreResult<Option<String>> {
		let path = self.path_for(key, FILE_EXTENSION)?;
		match fs::read_to_string(path) {
			Ok(contents) => Ok(Some(contents)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	fn write(&self, key: &str, value: &str) -> StoreResult<()> {
		let path = self.path_for(key, FILE_EXTENSION)?;
		let temp = self.path_for(key, TEMP_EXTENSION)?;

		let mut file = fs::File::create(&temp)?;
		file.write_all(value.as_bytes())?;
		file.sync_all()?;
		drop(file);

		fs::rename(&temp, &path)?;
		Ok(())
	}

	fn remove(&self, key: &str) -> StoreResult<()> {
		let path = self.path_for(key, FILE_EXTENSION)?;
		match fs::remove_file(path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	fn persistence_state(&self) -> PersistenceState {
		PersistenceState::Persisted
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_round_trip_across_instances() {
		let dir = TempDir::new().unwrap();

		{
			let storage = DirectoryStorage::new(dir.path()).unwrap();
			storage.write("video-storage", r#"{"volume":0.5}"#).unwrap();
		}

		let storage = DirectoryStorage::new(dir.path()).unwrap();
		assert_eq!(
			storage.read("video-storage").unwrap().as_deref(),
			Some(r#"{"volume":0.5}"#)
		);
		assert!(dir.path().join("video-storage.json").exists());
		assert!(!dir.path().join("video-storage.json.tmp").exists());
	}

	#[test]
	fn test_missing_document() {
		let dir = TempDir::new().unwrap();
		let storage = DirectoryStorage::new(dir.path()).unwrap();

		assert_eq!(storage.read("course-storage").unwrap(), None);
		storage.remove("course-storage").unwrap();
	}

	#[test]
	fn test_remove() {
		let dir = TempDir::new().unwrap();
		let storage = DirectoryStorage::new(dir.path()).unwrap();

		storage.write("app-storage", "{}").unwrap();
		storage.remove("app-storage").unwrap();
		assert_eq!(storage.read("app-storage").unwrap(), None);
	}

	#[test]
	fn test_creates_nested_directory() {
		let dir = TempDir::new().unwrap();
		let nested = dir.path().join("profiles").join("default");

		let storage = DirectoryStorage::new(&nested).unwrap();
		assert!(nested.is_dir());
		assert_eq!(storage.storage_location(), nested.as_path());
	}

	#[test]
	fn test_rejects_path_like_keys() {
		let dir = TempDir::new().unwrap();
		let storage = DirectoryStorage::new(dir.path()).unwrap();

		for key in ["", "../escape", "a/b", ".hidden", "with space"] {
			assert!(
				matches!(storage.write(key, "{}"), Err(StoreError::InvalidKey(_))),
				"key {key:?} should be rejected"
			);
		}
	}

	#[test]
	fn test_reports_persisted() {
		let dir = TempDir::new().unwrap();
		let storage = DirectoryStorage::new(dir.path()).unwrap();
		assert_eq!(storage.persistence_state(), PersistenceState::Persisted);
	}
}
