// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use gatekeeper_common_secret::SecretString;
use url::Url;

use crate::error::GrantError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Collaborator permission level, as named by the GitHub REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
	#[default]
	Pull,
	Triage,
	Push,
	Maintain,
	Admin,
}

impl Permission {
	pub fn as_str(&self) -> &'static str {
		match self {
			Permission::Pull => "pull",
			Permission::Triage => "triage",
			Permission::Push => "push",
			Permission::Maintain => "maintain",
			Permission::Admin => "admin",
		}
	}
}

impl fmt::Display for Permission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Permission {
	type Err = GrantError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"pull" | "read" => Ok(Permission::Pull),
			"triage" => Ok(Permission::Triage),
			"push" | "write" => Ok(Permission::Push),
			"maintain" => Ok(Permission::Maintain),
			"admin" => Ok(Permission::Admin),
			other => Err(GrantError::Config(format!("unknown permission '{other}'"))),
		}
	}
}

/// Target repository and the token used to manage its collaborators.
#[derive(Clone)]
pub struct GrantConfig {
	owner: String,
	repo: String,
	token: SecretString,
	permission: Permission,
	base_url: Url,
}

impl fmt::Debug for GrantConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GrantConfig")
			.field("owner", &self.owner)
			.field("repo", &self.repo)
			.field("token", &self.token)
			.field("permission", &self.permission)
			.field("base_url", &self.base_url.as_str())
			.finish()
	}
}

impl GrantConfig {
	pub fn new(
		owner: impl Into<String>,
		repo: impl Into<String>,
		token: SecretString,
	) -> Result<Self, GrantError> {
		let config = Self {
			owner: owner.into(),
			repo: repo.into(),
			token,
			permission: Permission::default(),
			base_url: parse_base_url(DEFAULT_API_BASE_URL)?,
		};
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), GrantError> {
		if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
			return Err(GrantError::Config(
				"repository owner and name are required".to_string(),
			));
		}
		if self.owner.contains('/') || self.repo.contains('/') {
			return Err(GrantError::Config(
				"repository owner and name must not contain '/'".to_string(),
			));
		}
		if self.token.is_blank() {
			return Err(GrantError::Config("grant token is empty".to_string()));
		}
		Ok(())
	}

	pub fn with_permission(mut self, permission: Permission) -> Self {
		self.permission = permission;
		self
	}

	/// Point at GitHub Enterprise. The URL must be HTTPS and not loopback.
	pub fn with_base_url(mut self, raw: &str) -> Result<Self, GrantError> {
		let url = parse_base_url(raw)?;
		if url.scheme() != "https" {
			return Err(GrantError::Config(format!(
				"GitHub base URL must use https, got '{}'",
				url.scheme()
			)));
		}
		match url.host_str() {
			None => {
				return Err(GrantError::Config(
					"GitHub base URL must include a host".to_string(),
				))
			}
			Some("localhost" | "127.0.0.1" | "::1" | "[::1]") => {
				return Err(GrantError::Config(
					"GitHub base URL must not be localhost".to_string(),
				))
			}
			Some(_) => {}
		}
		self.base_url = url;
		Ok(self)
	}

	/// Skip the HTTPS and loopback checks. Only for mock servers.
	pub fn with_unchecked_base_url(mut self, raw: &str) -> Result<Self, GrantError> {
		self.base_url = parse_base_url(raw)?;
		Ok(self)
	}

	pub fn owner(&self) -> &str {
		&self.owner
	}

	pub fn repo(&self) -> &str {
		&self.repo
	}

	pub fn permission(&self) -> Permission {
		self.permission
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub(crate) fn token(&self) -> &str {
		self.token.expose()
	}

	pub(crate) fn collaborator_url(&self, username: &str) -> Result<Url, GrantError> {
		let mut url = self.base_url.clone();
		url.path_segments_mut()
			.map_err(|_| GrantError::Config("GitHub base URL cannot be a base".to_string()))?
			.pop_if_empty()
			.extend(["repos", self.owner.as_str(), self.repo.as_str(), "collaborators", username]);
		Ok(url)
	}
}

fn parse_base_url(raw: &str) -> Result<Url, GrantError> {
	Url::parse(raw).map_err(|e| GrantError::Config(format!("Invalid GitHub base URL '{raw}': {e}")))
}
