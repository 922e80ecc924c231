//! Route-access guard
//!
//! The guard runs on every route change and every session change. A
//! non-public route without a session redirects to the login route; a public
//! route with a session redirects home; everything else renders.

use crate::config::RouteConfig;
use tracing::debug;

/// How public routes are compared with the requested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMatch {
	/// The path must equal a public route, ignoring a trailing slash, query
	/// and fragment. `/login-history` is not public when `/login` is.
	#[default]
	Exact,
	/// The path must start with a public route. `/login-history` is public
	/// when `/login` is.
	Prefix,
}

/// The allow-list of routes reachable without a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicRoutes {
	paths: Vec<String>,
	matching: RouteMatch,
}

impl PublicRoutes {
	pub fn new<I, S>(paths: I, matching: RouteMatch) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			paths: paths.into_iter().map(Into::into).collect(),
			matching,
		}
	}

	pub fn is_public(&self, path: &str) -> bool {
		match self.matching {
			RouteMatch::Exact => {
				let path = normalize(path);
				self.paths.iter().any(|p| normalize(p) == path)
			}
			RouteMatch::Prefix => self.paths.iter().any(|p| path.starts_with(p.as_str())),
		}
	}
}

/// Strips the query, fragment and any trailing slash (except the root's).
fn normalize(path: &str) -> &str {
	let end = path.find(['?', '#']).unwrap_or(path.len());
	let path = &path[..end];
	match path.trim_end_matches('/') {
		"" if path.starts_with('/') => "/",
		trimmed => trimmed,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardState {
	/// No route has been evaluated yet.
	#[default]
	Unknown,
	/// An evaluation is in progress.
	Checking,
	Authorized,
	RedirectingToLogin,
	RedirectingToHome,
}

impl GuardState {
	pub fn is_redirect(self) -> bool {
		matches!(
			self,
			GuardState::RedirectingToLogin | GuardState::RedirectingToHome
		)
	}
}

/// Performs the navigation side effect of a redirecting decision.
pub trait Navigator {
	fn navigate(&mut self, to: &str);
}

/// Records every navigation, most recent last.
impl Navigator for Vec<String> {
	fn navigate(&mut self, to: &str) {
		self.push(to.to_string());
	}
}

pub struct RouteGuard {
	public: PublicRoutes,
	login_route: String,
	home_route: String,
	state: GuardState,
	/// The `(path, is_authenticated)` pair behind `state`.
	last_input: Option<(String, bool)>,
}

impl RouteGuard {
	pub fn new(config: &RouteConfig) -> Self {
		Self {
			public: PublicRoutes::new(config.public.iter().cloned(), config.matching),
			login_route: config.login.clone(),
			home_route: config.home.clone(),
			state: GuardState::Unknown,
			last_input: None,
		}
	}

	pub fn public_routes(&self) -> &PublicRoutes {
		&self.public
	}

	/// Decides the outcome for `path` without side effects.
	pub fn evaluate(&self, path: &str, is_authenticated: bool) -> GuardState {
		match (self.public.is_public(path), is_authenticated) {
			(true, true) => GuardState::RedirectingToHome,
			(false, false) => GuardState::RedirectingToLogin,
			_ => GuardState::Authorized,
		}
	}

	/// Evaluates `path` and performs the redirect, if any.
	///
	/// Repeating the last evaluated `(path, is_authenticated)` pair returns
	/// the current state without navigating again.
	pub fn check(
		&mut self,
		path: &str,
		is_authenticated: bool,
		navigator: &mut impl Navigator,
	) -> GuardState {
		if let Some((last_path, last_auth)) = &self.last_input {
			if last_path == path && *last_auth == is_authenticated {
				return self.state;
			}
		}

		self.state = GuardState::Checking;
		let decision = self.evaluate(path, is_authenticated);
		debug!(path = %path, is_authenticated, decision = ?decision, "route guard decision");

		match decision {
			GuardState::RedirectingToLogin => navigator.navigate(&self.login_route),
			GuardState::RedirectingToHome => navigator.navigate(&self.home_route),
			_ => {}
		}

		self.state = decision;
		self.last_input = Some((path.to_string(), is_authenticated));
		decision
	}

	pub fn state(&self) -> GuardState {
		self.state
	}

	/// Guarded content renders only once the current route is authorized.
	pub fn should_render(&self) -> bool {
		self.state == GuardState::Authorized
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn guard(matching: RouteMatch) -> RouteGuard {
		RouteGuard::new(&RouteConfig {
			matching,
			..RouteConfig::default()
		})
	}

	#[test]
	fn test_decisions() {
		let guard = guard(RouteMatch::Exact);
		assert_eq!(guard.evaluate("/login", false), GuardState::Authorized);
		assert_eq!(guard.evaluate("/home", false), GuardState::RedirectingToLogin);
		assert_eq!(guard.evaluate("/login", true), GuardState::RedirectingToHome);
		assert_eq!(guard.evaluate("/home", true), GuardState::Authorized);
	}

	#[test]
	fn test_initial_state() {
		let guard = guard(RouteMatch::Exact);
		assert_eq!(guard.state(), GuardState::Unknown);
		assert!(!guard.should_render());
	}

	#[test]
	fn test_exact_matching() {
		let routes = PublicRoutes::new(["/login"], RouteMatch::Exact);
		assert!(routes.is_public("/login"));
		assert!(routes.is_public("/login/"));
		assert!(routes.is_public("/login?next=%2Fcourses"));
		assert!(routes.is_public("/login#form"));
		assert!(!routes.is_public("/login-history"));
		assert!(!routes.is_public("/login/reset"));
		assert!(!routes.is_public("/"));
	}

	#[test]
	fn test_prefix_matching() {
		let routes = PublicRoutes::new(["/login"], RouteMatch::Prefix);
		assert!(routes.is_public("/login"));
		assert!(routes.is_public("/login-history"));
		assert!(routes.is_public("/login/reset"));
		assert!(!routes.is_public("/home"));
	}

	#[test]
	fn test_root_route() {
		let routes = PublicRoutes::new(["/"], RouteMatch::Exact);
		assert!(routes.is_public("/"));
		assert!(routes.is_public("/?tab=1"));
		assert!(!routes.is_public("/home"));
	}

	#[test]
	fn test_check_navigates_once() {
		let mut guard = guard(RouteMatch::Exact);
		let mut nav: Vec<String> = Vec::new();

		assert_eq!(
			guard.check("/courses", false, &mut nav),
			GuardState::RedirectingToLogin
		);
		assert_eq!(
			guard.check("/courses", false, &mut nav),
			GuardState::RedirectingToLogin
		);
		assert_eq!(nav, vec!["/login"]);
		assert!(!guard.should_render());
	}

	#[test]
	fn test_session_change_reevaluates() {
		let mut guard = guard(RouteMatch::Exact);
		let mut nav: Vec<String> = Vec::new();

		assert_eq!(guard.check("/login", false, &mut nav), GuardState::Authorized);
		assert!(guard.should_render());
		assert!(nav.is_empty());

		// Signing in on the login page bounces home.
		assert_eq!(
			guard.check("/login", true, &mut nav),
			GuardState::RedirectingToHome
		);
		assert_eq!(nav, vec!["/home"]);

		assert_eq!(guard.check("/home", true, &mut nav), GuardState::Authorized);
		assert_eq!(nav, vec!["/home"]);
	}

	#[test]
	fn test_prefix_mode_misclassifies_shared_prefix() {
		let mut nav: Vec<String> = Vec::new();

		let mut exact = guard(RouteMatch::Exact);
		assert_eq!(
			exact.check("/login-history", false, &mut nav),
			GuardState::RedirectingToLogin
		);

		let mut prefix = guard(RouteMatch::Prefix);
		assert_eq!(
			prefix.check("/login-history", false, &mut nav),
			GuardState::Authorized
		);
	}
}
