// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_common_config::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_PERMISSION: &str = "pull";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Repository that verified sponsors are added to.
#[derive(Debug, Clone)]
pub struct GrantSettings {
	pub owner: String,
	pub repo: String,
	/// Token with admin rights on the repository.
	pub token: SecretString,
	pub permission: String,
	pub api_base_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrantConfigLayer {
	#[serde(default)]
	pub owner: Option<String>,
	#[serde(default)]
	pub repo: Option<String>,
	#[serde(default)]
	pub token: Option<SecretString>,
	#[serde(default)]
	pub permission: Option<String>,
	#[serde(default)]
	pub api_base_url: Option<String>,
}

impl GrantConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.owner.is_some() {
			self.owner = other.owner;
		}
		if other.repo.is_some() {
			self.repo = other.repo;
		}
		if other.token.is_some() {
			self.token = other.token;
		}
		if other.permission.is_some() {
			self.permission = other.permission;
		}
		if other.api_base_url.is_some() {
			self.api_base_url = other.api_base_url;
		}
	}

	pub fn finalize(self) -> Result<GrantSettings, ConfigError> {
		let owner = self
			.owner
			.filter(|s| !s.trim().is_empty())
			.ok_or_else(|| ConfigError::missing("grant", "owner", "GATEKEEPER_GRANT_OWNER"))?;
		let repo = self
			.repo
			.filter(|s| !s.trim().is_empty())
			.ok_or_else(|| ConfigError::missing("grant", "repo", "GATEKEEPER_GRANT_REPO"))?;
		let token = self
			.token
			.filter(|t| !t.is_blank())
			.ok_or_else(|| ConfigError::missing("grant", "token", "GATEKEEPER_GRANT_TOKEN"))?;

		Ok(GrantSettings {
			owner,
			repo,
			token,
			permission: self
				.permission
				.unwrap_or_else(|| DEFAULT_PERMISSION.to_string()),
			api_base_url: self
				.api_base_url
				.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_permission_and_api() {
		let settings = GrantConfigLayer {
			owner: Some("acme".to_string()),
			repo: Some("private".to_string()),
			token: Some(SecretString::from("ghp_admin")),
			..Default::default()
		}
		.finalize()
		.unwrap();
		assert_eq!(settings.permission, "pull");
		assert_eq!(settings.api_base_url, "https://api.github.com");
	}

	#[test]
	fn token_is_required() {
		let err = GrantConfigLayer {
			owner: Some("acme".to_string()),
			repo: Some("private".to_string()),
			..Default::default()
		}
		.finalize()
		.unwrap_err();
		assert!(err.to_string().contains("GATEKEEPER_GRANT_TOKEN"));
	}
}
