use crate::catalog::Catalog;
use crate::config::Config;
use crate::course::CourseStore;
use crate::coursework::{Coursework, PracticeStats};
use crate::error::CatalogError;
use crate::guard::{GuardState, Navigator, RouteGuard};
use crate::session::{AuthStore, DemoDirectory, UserRole};
use crate::ui::UiStore;
use crate::video::VideoStore;
use crate::SharedBackend;

/// One instance of every store, opened against a shared backend.
///
/// Constructed once at application start and handed to views by reference.
/// The session is only reachable read-only: signing out goes through
/// [`Platform::logout`] so the other stores are reset with it.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use edustate::{Config, GuardState, MemoryStorage, Platform, UserRole};
///
/// let mut platform = Platform::open(Config::default(), Arc::new(MemoryStorage::new()));
/// let mut history: Vec<String> = Vec::new();
///
/// assert_eq!(platform.navigate("/courses", &mut history), GuardState::RedirectingToLogin);
/// assert_eq!(history, vec!["/login"]);
///
/// platform.demo_login(UserRole::Teacher);
/// assert_eq!(platform.navigate("/courses", &mut history), GuardState::Authorized);
/// ```
pub struct Platform {
	config: Config,
	auth: AuthStore,
	video: VideoStore,
	course: CourseStore,
	ui: UiStore,
	guard: RouteGuard,
	catalog: Catalog,
	coursework: Coursework,
}

impl Platform {
	pub fn open(config: Config, backend: SharedBackend) -> Self {
		Self::with_directory(config, backend, DemoDirectory::default())
	}

	pub fn with_directory(config: Config, backend: SharedBackend, directory: DemoDirectory) -> Self {
		let keys = &config.storage;
		Self {
			auth: AuthStore::open(keys, &config.auth, directory, backend.clone()),
			video: VideoStore::with_history_limit(
				keys.video.clone(),
				backend.clone(),
				config.history_limit,
			),
			course: CourseStore::open(keys.course.clone(), backend.clone()),
			ui: UiStore::open(keys.app.clone(), backend),
			guard: RouteGuard::new(&config.routes),
			catalog: Catalog::default(),
			coursework: Coursework::default(),
			config,
		}
	}

	pub fn with_catalog(mut self, catalog: Catalog) -> Self {
		self.catalog = catalog;
		self
	}

	pub fn with_coursework(mut self, coursework: Coursework) -> Self {
		self.coursework = coursework;
		self
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	pub fn coursework(&self) -> &Coursework {
		&self.coursework
	}

	pub fn auth(&self) -> &AuthStore {
		&self.auth
	}

	pub fn video(&self) -> &VideoStore {
		&self.video
	}

	pub fn video_mut(&mut self) -> &mut VideoStore {
		&mut self.video
	}

	pub fn course(&self) -> &CourseStore {
		&self.course
	}

	pub fn course_mut(&mut self) -> &mut CourseStore {
		&mut self.course
	}

	pub fn ui(&self) -> &UiStore {
		&self.ui
	}

	pub fn ui_mut(&mut self) -> &mut UiStore {
		&mut self.ui
	}

	pub fn guard(&self) -> &RouteGuard {
		&self.guard
	}

	/// Signs in with a directory email and the demo password.
	///
	/// # Returns
	/// `true` on success. A failed attempt leaves the current session as it was.
	pub fn login(&mut self, email: &str, password: &str) -> bool {
		self.auth.login(email, password)
	}

	/// Signs in as the directory's first user with `role`.
	pub fn demo_login(&mut self, role: UserRole) -> bool {
		self.auth.demo_login(role)
	}

	/// Runs the route guard for `path` against the current session.
	pub fn navigate(&mut self, path: &str, navigator: &mut impl Navigator) -> GuardState {
		let is_authenticated = self.auth.is_authenticated();
		self.guard.check(path, is_authenticated, navigator)
	}

	/// Signs out and resets every store, removing all persisted documents.
	pub fn logout(&mut self) {
		self.auth.logout();
		self.video.reset();
		self.course.reset();
		self.ui.reset();
	}

	/// Practice-page counters, with "my works" taken from the signed-in user.
	pub fn practice_stats(&self) -> PracticeStats {
		let user = self.auth.current_user();
		self.coursework
			.practice_stats(user.as_ref().map(|u| u.id.as_str()))
	}

	/// Completion percentage of a catalog course for this profile.
	pub fn course_completion(&self, course_id: &str) -> Result<u8, CatalogError> {
		let course = self.catalog.find_course(course_id)?;
		Ok(self.course.course_progress(&course.video_ids))
	}
}
