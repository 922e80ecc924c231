//! Session and role store
//!
//! Holds the signed-in user. There is no credential verification: every
//! demo account accepts the configured demo password.

use crate::config::{AuthConfig, StorageKeys};
use crate::error::ParseRoleError;
use crate::store::PersistentStore;
use crate::{Persisted, SharedBackend};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// The four account roles. Serialized lowercase (`"admin"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
	Admin,
	Teacher,
	Student,
	Manager,
}

impl UserRole {
	/// Every role, in directory order.
	pub const ALL: [UserRole; 4] = [
		UserRole::Admin,
		UserRole::Teacher,
		UserRole::Student,
		UserRole::Manager,
	];

	/// The serialized name of the role.
	pub fn as_str(self) -> &'static str {
		match self {
			UserRole::Admin => "admin",
			UserRole::Teacher => "teacher",
			UserRole::Student => "student",
			UserRole::Manager => "manager",
		}
	}
}

impl fmt::Display for UserRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for UserRole {
	type Err = ParseRoleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		UserRole::ALL
			.into_iter()
			.find(|role| role.as_str() == s)
			.ok_or_else(|| ParseRoleError(s.to_string()))
	}
}

/// An account as stored in the session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub name: String,
	pub email: String,
	pub role: UserRole,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub organization: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub grade: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subject: Option<String>,
}

/// The hard-coded accounts demo logins resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoDirectory {
	users: Vec<User>,
}

impl DemoDirectory {
	pub fn new(users: Vec<User>) -> Self {
		Self { users }
	}

	pub fn users(&self) -> &[User] {
		&self.users
	}

	/// The first account with `role`.
	pub fn find_by_role(&self, role: UserRole) -> Option<&User> {
		self.users.iter().find(|u| u.role == role)
	}

	/// Email comparison ignores ASCII case and surrounding whitespace.
	pub fn find_by_email(&self, email: &str) -> Option<&User> {
		let email = email.trim();
		self.users
			.iter()
			.find(|u| u.email.eq_ignore_ascii_case(email))
	}
}

impl Default for DemoDirectory {
	fn default() -> Self {
		let user = |id: &str, name: &str, email: &str, role: UserRole| User {
			id: id.to_string(),
			name: name.to_string(),
			email: email.to_string(),
			role,
			avatar: None,
			organization: Some("Provincial Education Platform".to_string()),
			grade: None,
			subject: None,
		};

		Self::new(vec![
			user("1", "Platform Administrator", "admin@edu.demo", UserRole::Admin),
			User {
				subject: Some("Ideology and Politics".to_string()),
				..user("2", "Teacher Li", "teacher@edu.demo", UserRole::Teacher)
			},
			User {
				grade: Some("Grade 8".to_string()),
				..user("3", "Student Wang", "student@edu.demo", UserRole::Student)
			},
			user("4", "District Manager", "manager@edu.demo", UserRole::Manager),
		])
	}
}

/// The current session. `is_authenticated` is `true` exactly when `user` is
/// set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
	pub user: Option<User>,
	pub is_authenticated: bool,
}

impl SessionState {
	fn signed_in(user: User) -> Self {
		Self {
			user: Some(user),
			is_authenticated: true,
		}
	}
}

/// The persisted session document.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
	#[serde(default)]
	user: Option<User>,
	#[serde(default)]
	is_authenticated: bool,
}

impl Persisted for SessionState {
	type Snapshot = SessionSnapshot;

	fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			user: self.user.clone(),
			is_authenticated: self.is_authenticated,
		}
	}

	fn restore(snapshot: SessionSnapshot) -> Self {
		if snapshot.is_authenticated != snapshot.user.is_some() {
			warn!("persisted session flag disagrees with its user, trusting the user");
		}
		// `is_authenticated` is derived from `user`.
		Self {
			is_authenticated: snapshot.user.is_some(),
			user: snapshot.user,
		}
	}
}

/// The signed-in identity of this profile.
pub struct AuthStore {
	inner: PersistentStore<SessionState>,
	directory: DemoDirectory,
	auth: AuthConfig,
	keys: StorageKeys,
}

impl AuthStore {
	/// Opens the session store and restores any persisted session.
	///
	/// # Arguments
	/// * `keys` - Every store namespace; the session lives under `keys.session`
	///   and [`AuthStore::logout`] removes all of them
	/// * `auth` - Holds the demo password
	/// * `directory` - Accounts that logins resolve against
	/// * `backend` - Where the documents are stored
	pub fn open(
		keys: &StorageKeys,
		auth: &AuthConfig,
		directory: DemoDirectory,
		backend: SharedBackend,
	) -> Self {
		Self {
			inner: PersistentStore::open(keys.session.clone(), backend),
			directory,
			auth: auth.clone(),
			keys: keys.clone(),
		}
	}

	/// Returns a copy of the current session.
	pub fn get(&self) -> SessionState {
		self.inner.get()
	}

	pub fn current_user(&self) -> Option<User> {
		self.inner.read(|s| s.user.clone())
	}

	/// Whether a user is signed in.
	pub fn is_authenticated(&self) -> bool {
		self.inner.read(|s| s.is_authenticated)
	}

	pub fn directory(&self) -> &DemoDirectory {
		&self.directory
	}

	/// Signs in a demo account by email. Returns `false` on an unknown email
	/// or a wrong password, leaving the current session untouched.
	pub fn login(&mut self, email: &str, password: &str) -> bool {
		let Some(user) = self.directory.find_by_email(email).cloned() else {
			debug!(email = %email, "login rejected: unknown email");
			return false;
		};
		if password != self.auth.demo_password {
			debug!(email = %email, "login rejected: wrong password");
			return false;
		}

		debug!(user_id = %user.id, role = %user.role, "signed in");
		self.inner.set(|s| *s = SessionState::signed_in(user));
		true
	}

	/// Signs in as the first demo account with `role`. Returns `false` if the
	/// directory has no such account.
	pub fn demo_login(&mut self, role: UserRole) -> bool {
		let Some(user) = self.directory.find_by_role(role).cloned() else {
			warn!(role = %role, "no demo account for role");
			return false;
		};

		debug!(user_id = %user.id, role = %role, "demo sign-in");
		self.inner.set(|s| *s = SessionState::signed_in(user));
		true
	}

	/// Ends the session and removes the persisted documents of every store
	/// namespace, not just this one.
	///
	/// The other stores keep their in-memory state; [`Platform::logout`]
	/// resets them too.
	///
	/// [`Platform::logout`]: crate::Platform::logout
	pub fn logout(&mut self) {
		self.inner.clear();

		let backend = self.inner.backend();
		for key in self.keys.all() {
			if let Err(e) = backend.remove(key) {
				warn!(key = %key, error = %e, "failed to remove persisted state on logout");
			}
		}
		debug!("signed out");
	}

	/// `false` when signed out.
	pub fn has_role(&self, role: UserRole) -> bool {
		self.inner
			.read(|s| s.user.as_ref().is_some_and(|u| u.role == role))
	}

	/// Whether the signed-in user has one of `roles`. `false` when signed out
	/// or when `roles` is empty.
	pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
		self.inner
			.read(|s| s.user.as_ref().is_some_and(|u| roles.contains(&u.role)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{MemoryStorage, StorageBackend};
	use std::sync::Arc;

	fn open(backend: SharedBackend) -> AuthStore {
		AuthStore::open(
			&StorageKeys::default(),
			&AuthConfig::default(),
			DemoDirectory::default(),
			backend,
		)
	}

	#[test]
	fn test_role_parsing() {
		for role in UserRole::ALL {
			assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
		}
		assert_eq!(
			"superuser".parse::<UserRole>(),
			Err(ParseRoleError("superuser".to_string()))
		);
		assert!("Teacher".parse::<UserRole>().is_err());
	}

	#[test]
	fn test_demo_directory_covers_every_role() {
		let directory = DemoDirectory::default();
		for role in UserRole::ALL {
			assert_eq!(directory.find_by_role(role).unwrap().role, role);
		}
	}

	#[test]
	fn test_starts_signed_out() {
		let store = open(Arc::new(MemoryStorage::new()));
		assert_eq!(store.get(), SessionState::default());
		assert!(!store.is_authenticated());
		assert!(!store.has_any_role(&UserRole::ALL));
	}

	#[test]
	fn test_login_with_demo_password() {
		let mut store = open(Arc::new(MemoryStorage::new()));

		assert!(!store.login("teacher@edu.demo", "wrong"));
		assert!(!store.is_authenticated());
		assert!(!store.login("nobody@edu.demo", "demo123"));
		assert!(!store.is_authenticated());

		assert!(store.login("Teacher@Edu.Demo", "demo123"));
		let state = store.get();
		assert!(state.is_authenticated);
		assert_eq!(state.user.unwrap().role, UserRole::Teacher);
	}

	#[test]
	fn test_failed_login_keeps_existing_session() {
		let mut store = open(Arc::new(MemoryStorage::new()));
		assert!(store.demo_login(UserRole::Student));

		assert!(!store.login("admin@edu.demo", "nope"));
		assert!(store.has_role(UserRole::Student));
	}

	#[test]
	fn test_role_checks() {
		let mut store = open(Arc::new(MemoryStorage::new()));
		store.demo_login(UserRole::Manager);

		assert!(store.has_role(UserRole::Manager));
		assert!(!store.has_role(UserRole::Admin));
		assert!(store.has_any_role(&[UserRole::Admin, UserRole::Manager]));
		assert!(!store.has_any_role(&[UserRole::Teacher, UserRole::Student]));
		assert!(!store.has_any_role(&[]));
	}

	#[test]
	fn test_demo_login_unknown_role_in_directory() {
		let directory = DemoDirectory::new(Vec::new());
		let mut store = AuthStore::open(
			&StorageKeys::default(),
			&AuthConfig::default(),
			directory,
			Arc::new(MemoryStorage::new()),
		);
		assert!(!store.demo_login(UserRole::Admin));
		assert!(!store.is_authenticated());
	}

	#[test]
	fn test_session_survives_reopen() {
		let backend: SharedBackend = Arc::new(MemoryStorage::new());
		let mut store = open(backend.clone());
		store.demo_login(UserRole::Admin);

		let reopened = open(backend);
		assert!(reopened.is_authenticated());
		assert_eq!(reopened.current_user().unwrap().email, "admin@edu.demo");
	}

	#[test]
	fn test_restore_derives_flag_from_user() {
		let backend: SharedBackend = Arc::new(MemoryStorage::new());
		backend
			.write(
				"auth-storage",
				r#"{"version":1,"state":{"user":null,"isAuthenticated":true}}"#,
			)
			.unwrap();

		let store = open(backend);
		assert!(!store.is_authenticated());
		assert_eq!(store.get().user, None);
	}

	#[test]
	fn test_logout_clears_every_namespace() {
		let memory = Arc::new(MemoryStorage::new());
		let backend: SharedBackend = memory.clone();
		let mut store = open(backend.clone());
		store.demo_login(UserRole::Teacher);

		for key in ["video-storage", "course-storage", "app-storage", "unrelated"] {
			backend.write(key, "{}").unwrap();
		}

		store.logout();
		assert_eq!(store.get().user, None);
		assert!(!store.is_authenticated());
		for key in StorageKeys::default().all() {
			assert!(!memory.contains(key), "{key} should be removed");
		}
		assert!(memory.contains("unrelated"));
	}
}
