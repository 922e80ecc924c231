//! Platform configuration
//!
//! Every setting has a default matching the deployed platform, so
//! [`Config::default`] is all most hosts need. [`Config::from_toml_str`]
//! overrides only the keys present in the document:
//!
//! ```toml
//! history_limit = 50
//!
//! [storage]
//! session = "auth-storage"
//! video = "video-storage"
//! course = "course-storage"
//! app = "app-storage"
//!
//! [routes]
//! public = ["/login"]
//! match = "exact"      # or "prefix"
//! login = "/login"
//! home = "/home"
//!
//! [auth]
//! demo_password = "demo123"
//! ```

use crate::error::ConfigError;
use crate::guard::{PublicRoutes, RouteMatch};
use toml_edit::{DocumentMut, Item};

/// Maximum number of watch-history entries kept per profile.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub storage: StorageKeys,
	pub routes: RouteConfig,
	pub auth: AuthConfig,
	pub history_limit: usize,
}

/// Durable-storage key of each store's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
	pub session: String,
	pub video: String,
	pub course: String,
	pub app: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
	/// Routes reachable without a session.
	pub public: Vec<String>,
	pub matching: RouteMatch,
	/// Where unauthenticated visitors are sent.
	pub login: String,
	/// Where signed-in users visiting a public route are sent.
	pub home: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
	/// The one password every demo account accepts.
	pub demo_password: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			storage: StorageKeys::default(),
			routes: RouteConfig::default(),
			auth: AuthConfig::default(),
			history_limit: DEFAULT_HISTORY_LIMIT,
		}
	}
}

impl Default for StorageKeys {
	fn default() -> Self {
		Self {
			session: "auth-storage".to_string(),
			video: "video-storage".to_string(),
			course: "course-storage".to_string(),
			app: "app-storage".to_string(),
		}
	}
}

impl StorageKeys {
	/// All four namespace keys, session first.
	pub fn all(&self) -> [&str; 4] {
		[&self.session, &self.video, &self.course, &self.app]
	}
}

impl Default for RouteConfig {
	fn default() -> Self {
		Self {
			public: vec!["/login".to_string()],
			matching: RouteMatch::Exact,
			login: "/login".to_string(),
			home: "/home".to_string(),
		}
	}
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			demo_password: "demo123".to_string(),
		}
	}
}

impl Config {
	/// Parses a TOML document, starting from the defaults and overriding the
	/// keys it contains.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let doc: DocumentMut = source.parse()?;
		let mut config = Config::default();

		if let Some(item) = doc.get("history_limit") {
			let limit = item
				.as_integer()
				.ok_or_else(|| ConfigError::invalid("history_limit", "expected an integer"))?;
			if limit < 1 {
				return Err(ConfigError::invalid("history_limit", "must be at least 1"));
			}
			config.history_limit = usize::try_from(limit)
				.map_err(|_| ConfigError::invalid("history_limit", "too large for this platform"))?;
		}

		if let Some(storage) = doc.get("storage") {
			let keys = &mut config.storage;
			read_string(storage, "storage", "session", &mut keys.session)?;
			read_string(storage, "storage", "video", &mut keys.video)?;
			read_string(storage, "storage", "course", &mut keys.course)?;
			read_string(storage, "storage", "app", &mut keys.app)?;

			let all = keys.all();
			if all.iter().any(|k| k.is_empty()) {
				return Err(ConfigError::invalid("storage", "keys must not be empty"));
			}
			for (i, key) in all.iter().enumerate() {
				if all[i + 1..].contains(key) {
					return Err(ConfigError::invalid(
						"storage",
						format!("key {key:?} is used by more than one store"),
					));
				}
			}
		}

		if let Some(routes) = doc.get("routes") {
			let cfg = &mut config.routes;
			if let Some(public) = routes.get("public") {
				let array = public
					.as_array()
					.ok_or_else(|| ConfigError::invalid("routes.public", "expected an array"))?;
				cfg.public = array
					.iter()
					.map(|v| {
						v.as_str().map(str::to_string).ok_or_else(|| {
							ConfigError::invalid("routes.public", "expected an array of strings")
						})
					})
					.collect::<Result<_, _>>()?;
			}

			let mut matching = String::new();
			read_string(routes, "routes", "match", &mut matching)?;
			cfg.matching = match matching.as_str() {
				"" => cfg.matching,
				"exact" => RouteMatch::Exact,
				"prefix" => RouteMatch::Prefix,
				other => {
					return Err(ConfigError::invalid(
						"routes.match",
						format!("expected \"exact\" or \"prefix\", got {other:?}"),
					))
				}
			};

			read_string(routes, "routes", "login", &mut cfg.login)?;
			read_string(routes, "routes", "home", &mut cfg.home)?;
			for (name, route) in [("routes.login", &cfg.login), ("routes.home", &cfg.home)] {
				if !route.starts_with('/') {
					return Err(ConfigError::invalid(name, "must start with '/'"));
				}
			}

			// Otherwise the guard redirects to the route it just redirected from.
			let public = PublicRoutes::new(cfg.public.iter().cloned(), cfg.matching);
			if !public.is_public(&cfg.login) {
				return Err(ConfigError::invalid(
					"routes.login",
					format!("{:?} must be one of routes.public", cfg.login),
				));
			}
			if public.is_public(&cfg.home) {
				return Err(ConfigError::invalid(
					"routes.home",
					format!("{:?} must not be a public route", cfg.home),
				));
			}
		}

		if let Some(auth) = doc.get("auth") {
			read_string(auth, "auth", "demo_password", &mut config.auth.demo_password)?;
		}

		Ok(config)
	}
}

fn read_string(
	table: &Item,
	section: &str,
	key: &str,
	target: &mut String,
) -> Result<(), ConfigError> {
	let Some(item) = table.get(key) else {
		return Ok(());
	};
	let value = item
		.as_str()
		.ok_or_else(|| ConfigError::invalid(&format!("{section}.{key}"), "expected a string"))?;
	*target = value.to_string();
	Ok(())
}
