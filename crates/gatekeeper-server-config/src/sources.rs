// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file, the environment.

use std::path::PathBuf;

use gatekeeper_common_config::{load_secret_env, SecretString};
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, GitHubOAuthLayer, GrantConfigLayer, HttpConfigLayer, LoggingConfigLayer,
	OAuthClientLayer, OAuthConfigLayer, PatreonOAuthLayer, PolicyConfigLayer, SessionConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/gatekeeper/server.toml";

/// Source precedence levels (higher overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer::default())
	}
}

/// A TOML file. A missing file is an empty layer, not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;
		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variables, named `GATEKEEPER_<SECTION>_<FIELD>`.
///
/// Secrets also accept `<NAME>_FILE` pointing at a file that holds the value.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: env_var("GATEKEEPER_HOST"),
				port: env_u16("GATEKEEPER_PORT")?,
				base_url: env_var("GATEKEEPER_BASE_URL"),
				cookie_secure: env_bool("GATEKEEPER_COOKIE_SECURE"),
			}),
			database: Some(DatabaseConfigLayer {
				url: env_var("GATEKEEPER_DATABASE_URL"),
			}),
			oauth: Some(OAuthConfigLayer {
				github: Some(GitHubOAuthLayer {
					client: oauth_client_from_env("GITHUB")?,
					sponsorable_login: env_var("GATEKEEPER_GITHUB_SPONSORABLE_LOGIN"),
				}),
				patreon: Some(PatreonOAuthLayer {
					client: oauth_client_from_env("PATREON")?,
					campaign_id: env_var("GATEKEEPER_PATREON_CAMPAIGN_ID"),
				}),
				discord: Some(oauth_client_from_env("DISCORD")?),
			}),
			grant: Some(GrantConfigLayer {
				owner: env_var("GATEKEEPER_GRANT_OWNER"),
				repo: env_var("GATEKEEPER_GRANT_REPO"),
				token: secret_env("GATEKEEPER_GRANT_TOKEN")?,
				permission: env_var("GATEKEEPER_GRANT_PERMISSION"),
				api_base_url: env_var("GATEKEEPER_GRANT_API_BASE_URL"),
			}),
			policy: Some(PolicyConfigLayer {
				min_tier_amount_cents: env_u64("GATEKEEPER_MIN_TIER_AMOUNT_CENTS")?,
			}),
			session: Some(SessionConfigLayer {
				state_ttl_secs: env_u64("GATEKEEPER_OAUTH_STATE_TTL_SECS")?,
				session_ttl_secs: env_u64("GATEKEEPER_SESSION_TTL_SECS")?,
				cleanup_interval_secs: env_u64("GATEKEEPER_CLEANUP_INTERVAL_SECS")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("GATEKEEPER_LOG_LEVEL"),
			}),
		})
	}
}

fn oauth_client_from_env(provider: &str) -> Result<OAuthClientLayer, ConfigError> {
	Ok(OAuthClientLayer {
		client_id: env_var(&format!("GATEKEEPER_{provider}_CLIENT_ID")),
		client_secret: secret_env(&format!("GATEKEEPER_{provider}_CLIENT_SECRET"))?,
		redirect_uri: env_var(&format!("GATEKEEPER_{provider}_REDIRECT_URI")),
	})
}

fn secret_env(name: &str) -> Result<Option<SecretString>, ConfigError> {
	load_secret_env(name).map_err(|e| ConfigError::Secret(e.to_string()))
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	env_parse(name, "u16")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	env_parse(name, "u64")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}
