//! Client-side state stores for the education platform.
//!
//! Every store keeps a typed in-memory state as the source of truth and
//! mirrors an allow-listed snapshot of it into a [`StorageBackend`] under a
//! fixed namespace key. Reads never fail; writes are best-effort.

mod catalog;
mod config;
mod course;
mod coursework;
mod directory;
mod error;
mod guard;
mod memory;
mod platform;
mod session;
mod store;
mod ui;
mod video;

#[cfg(feature = "web")]
mod web;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub use catalog::{
	AuditStatus, AuditSummary, Catalog, Course, CourseQuery, CourseStatus, Difficulty, VideoContent,
	VideoQuery, VideoSort,
};
pub use config::{AuthConfig, Config, RouteConfig, StorageKeys, DEFAULT_HISTORY_LIMIT};
pub use course::{CourseState, CourseStore, CourseVideoProgress};
pub use coursework::{
	assignment_stats, assignment_view, discussion_categories, discussion_view, Assignment,
	AssignmentKind, AssignmentQuery, AssignmentStats, AssignmentStatus, AssignmentTab, Competition,
	CompetitionStatus, Coursework, CreativeWork, Discussion, DiscussionQuery, DiscussionView,
	LessonPlan, LessonPlanQuery, LessonPlanStatus, LessonPlanSummary, PracticeQuery, PracticeStats,
	WorkKind,
};
pub use directory::DirectoryStorage;
pub use error::{CatalogError, ConfigError, ParseRoleError, StoreError, StoreResult};
pub use guard::{GuardState, Navigator, PublicRoutes, RouteGuard, RouteMatch};
pub use memory::MemoryStorage;
pub use platform::Platform;
pub use session::{AuthStore, DemoDirectory, SessionState, User, UserRole};
pub use store::{PersistentStore, SNAPSHOT_VERSION};
pub use ui::{Theme, UiState, UiStore};
pub use video::{
	format_playback_time, FavoriteEntry, VideoProgress, VideoState, VideoStore, WatchHistoryEntry,
};

#[cfg(feature = "web")]
pub use web::WebStorage;

/// A trait that requires `Send` on native targets but is automatically
/// implemented for all types on WASM targets.
///
/// `web_sys::Storage` is not `Send`; on WASM there are no threads so the
/// bound carries no meaning there.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

/// `Sync` counterpart of [`MaybeSend`].
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSync: Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Sync> MaybeSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSync {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSync for T {}

/// A storage backend shared by every store of one platform instance.
pub type SharedBackend = Arc<dyn StorageBackend>;

/// Indicates whether a backend actually survives a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceState {
	/// Documents are written to durable storage.
	Persisted,
	/// Documents live only as long as the process (or page).
	///
	/// This is the degraded mode when durable storage is blocked by browser
	/// policy, and the normal mode of [`MemoryStorage`].
	MemoryOnly,
}

/// Durable string-keyed document storage.
///
/// Implementations hold one opaque JSON document per key. Every method takes
/// `&self`; backends use interior mutability where they need it so that a
/// single instance can be shared between stores.
///
/// This trait requires `MaybeSend + MaybeSync`, which means:
/// - On native targets: implementations must be `Send + Sync`
/// - On WASM targets: no restrictions (single-threaded environment)
pub trait StorageBackend: MaybeSend + MaybeSync {
	/// Reads the document stored under `key`, `Ok(None)` if there is none.
	fn read(&self, key: &str) -> StoreResult<Option<String>>;

	/// Replaces the document stored under `key`.
	fn write(&self, key: &str, value: &str) -> StoreResult<()>;

	/// Removes the document stored under `key`. Removing a missing key is not an error.
	fn remove(&self, key: &str) -> StoreResult<()>;

	/// Reports whether writes survive a restart.
	fn persistence_state(&self) -> PersistenceState;
}

/// A state type that can be mirrored to a [`StorageBackend`].
///
/// `Snapshot` is the allow-list: only the fields it carries are persisted,
/// everything else in the state is transient and reset to its default on
/// restore.
pub trait Persisted: Clone + Default {
	/// The serialized subset of this state.
	type Snapshot: Serialize + DeserializeOwned;

	/// Extracts the persisted subset.
	fn snapshot(&self) -> Self::Snapshot;

	/// Rebuilds a full state from a persisted subset.
	fn restore(snapshot: Self::Snapshot) -> Self;
}
