// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Gatekeeper server.
//!
//! Values are layered, highest precedence first:
//! 1. Environment variables (`GATEKEEPER_*`, secrets also via `*_FILE`)
//! 2. A TOML file (`/etc/gatekeeper/server.toml`, or a path given on the
//!    command line)
//! 3. Built-in defaults
//!
//! ```ignore
//! let config = gatekeeper_server_config::load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub oauth: OAuthConfig,
	pub grant: GrantSettings,
	pub policy: PolicyConfig,
	pub session: SessionConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load from defaults, the system config file and the environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Like [`load_config`] with a different config file.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolve a merged layer, applying defaults and validation.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let oauth = layer.oauth.unwrap_or_default().finalize(&http.base_url)?;
	let grant = layer.grant.unwrap_or_default().finalize()?;
	let policy = layer.policy.unwrap_or_default().finalize()?;
	let session = layer.session.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		host = %http.host,
		port = http.port,
		base_url = %http.base_url,
		database = %database.url,
		sponsorable = %oauth.github.sponsorable_login,
		patreon_campaign = %oauth.patreon.campaign_id,
		repository = %format!("{}/{}", grant.owner, grant.repo),
		permission = %grant.permission,
		min_tier_amount_cents = policy.min_tier_amount_cents,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		oauth,
		grant,
		policy,
		session,
		logging,
	})
}
