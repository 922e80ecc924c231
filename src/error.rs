//! Error types

use thiserror::Error;

/// Errors raised by storage backends.
///
/// Stores never surface these to callers; they are logged and the store
/// carries on in memory.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Storage unavailable")]
	Unavailable,

	#[error("Invalid storage key: {0:?}")]
	InvalidKey(String),

	#[error("Backend error: {0}")]
	Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while reading a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Invalid TOML: {0}")]
	Parse(#[from] toml_edit::TomlError),

	#[error("Invalid value for `{key}`: {reason}")]
	InvalidValue { key: String, reason: String },
}

impl ConfigError {
	pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
		ConfigError::InvalidValue {
			key: key.to_string(),
			reason: reason.into(),
		}
	}
}

/// Errors raised by catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
	#[error("{kind} not found: {id}")]
	NotFound { kind: &'static str, id: String },

	#[error("Invalid catalog document: {0}")]
	Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0:?}")]
pub struct ParseRoleError(pub String);
