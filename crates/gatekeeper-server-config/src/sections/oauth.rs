// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OAuth client settings for the three providers.
//!
//! All three are required. A redirect URI that is not configured is derived
//! from `http.base_url` as `{base_url}/auth/{provider}/callback`.

use gatekeeper_common_config::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// Client settings shared by every provider (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthClientLayer {
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub client_secret: Option<SecretString>,
	#[serde(default)]
	pub redirect_uri: Option<String>,
}

impl OAuthClientLayer {
	pub fn merge(&mut self, other: OAuthClientLayer) {
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.redirect_uri.is_some() {
			self.redirect_uri = other.redirect_uri;
		}
	}

	fn build(self, provider: &str, base_url: &str) -> Result<OAuthClientSettings, ConfigError> {
		let env_prefix = format!("GATEKEEPER_{}", provider.to_ascii_uppercase());
		let section = format!("oauth.{provider}");

		let client_id = self
			.client_id
			.filter(|s| !s.trim().is_empty())
			.ok_or_else(|| {
				ConfigError::missing(&section, "client_id", &format!("{env_prefix}_CLIENT_ID"))
			})?;
		let client_secret = self
			.client_secret
			.filter(|s| !s.is_blank())
			.ok_or_else(|| {
				ConfigError::missing(
					&section,
					"client_secret",
					&format!("{env_prefix}_CLIENT_SECRET"),
				)
			})?;
		let redirect_uri = match self.redirect_uri.filter(|s| !s.trim().is_empty()) {
			Some(uri) => uri,
			None => format!("{base_url}/auth/{provider}/callback"),
		};
		url::Url::parse(&redirect_uri).map_err(|e| ConfigError::InvalidValue {
			key: format!("{section}.redirect_uri"),
			message: e.to_string(),
		})?;

		Ok(OAuthClientSettings {
			client_id,
			client_secret,
			redirect_uri,
		})
	}
}

#[derive(Debug, Clone)]
pub struct OAuthClientSettings {
	pub client_id: String,
	pub client_secret: SecretString,
	pub redirect_uri: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubOAuthLayer {
	#[serde(flatten)]
	pub client: OAuthClientLayer,
	/// Account whose sponsors are admitted.
	#[serde(default)]
	pub sponsorable_login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatreonOAuthLayer {
	#[serde(flatten)]
	pub client: OAuthClientLayer,
	#[serde(default)]
	pub campaign_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GitHubOAuthSettings {
	pub client: OAuthClientSettings,
	pub sponsorable_login: String,
}

#[derive(Debug, Clone)]
pub struct PatreonOAuthSettings {
	pub client: OAuthClientSettings,
	pub campaign_id: String,
}

pub type DiscordOAuthSettings = OAuthClientSettings;

#[derive(Debug, Clone)]
pub struct OAuthConfig {
	pub github: GitHubOAuthSettings,
	pub patreon: PatreonOAuthSettings,
	pub discord: DiscordOAuthSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthConfigLayer {
	#[serde(default)]
	pub github: Option<GitHubOAuthLayer>,
	#[serde(default)]
	pub patreon: Option<PatreonOAuthLayer>,
	#[serde(default)]
	pub discord: Option<OAuthClientLayer>,
}

impl OAuthConfigLayer {
	pub fn merge(&mut self, other: OAuthConfigLayer) {
		if let Some(o) = other.github {
			let target = self.github.get_or_insert_with(Default::default);
			target.client.merge(o.client);
			if o.sponsorable_login.is_some() {
				target.sponsorable_login = o.sponsorable_login;
			}
		}
		if let Some(o) = other.patreon {
			let target = self.patreon.get_or_insert_with(Default::default);
			target.client.merge(o.client);
			if o.campaign_id.is_some() {
				target.campaign_id = o.campaign_id;
			}
		}
		if let Some(o) = other.discord {
			self.discord.get_or_insert_with(Default::default).merge(o);
		}
	}

	pub fn finalize(self, base_url: &str) -> Result<OAuthConfig, ConfigError> {
		let github = self.github.unwrap_or_default();
		let sponsorable_login = github
			.sponsorable_login
			.filter(|s| !s.trim().is_empty())
			.ok_or_else(|| {
				ConfigError::missing(
					"oauth.github",
					"sponsorable_login",
					"GATEKEEPER_GITHUB_SPONSORABLE_LOGIN",
				)
			})?;

		let patreon = self.patreon.unwrap_or_default();
		let campaign_id = patreon
			.campaign_id
			.filter(|s| !s.trim().is_empty())
			.ok_or_else(|| {
				ConfigError::missing(
					"oauth.patreon",
					"campaign_id",
					"GATEKEEPER_PATREON_CAMPAIGN_ID",
				)
			})?;

		Ok(OAuthConfig {
			github: GitHubOAuthSettings {
				client: github.client.build("github", base_url)?,
				sponsorable_login,
			},
			patreon: PatreonOAuthSettings {
				client: patreon.client.build("patreon", base_url)?,
				campaign_id,
			},
			discord: self
				.discord
				.unwrap_or_default()
				.build("discord", base_url)?,
		})
	}
}
