// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use gatekeeper_linking_core::{Grant, GrantExecutor, GrantFailed};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::GrantConfig;
use crate::error::GrantError;

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
	message: String,
}

fn map_github_error(status: StatusCode, body: &str) -> GrantError {
	let message = serde_json::from_str::<GitHubErrorBody>(body)
		.map(|b| b.message)
		.unwrap_or_else(|_| body.to_string());

	match status {
		StatusCode::UNAUTHORIZED => GrantError::Unauthorized(message),
		StatusCode::FORBIDDEN if message.to_ascii_lowercase().contains("rate limit") => {
			GrantError::RateLimited
		}
		StatusCode::FORBIDDEN => GrantError::Unauthorized(message),
		StatusCode::TOO_MANY_REQUESTS => GrantError::RateLimited,
		_ => GrantError::api_error(status.as_u16(), message),
	}
}

/// Adds collaborators through `PUT /repos/{owner}/{repo}/collaborators/{username}`.
#[derive(Debug, Clone)]
pub struct CollaboratorGrantClient {
	config: GrantConfig,
	http_client: reqwest::Client,
}

impl CollaboratorGrantClient {
	pub fn new(config: GrantConfig) -> Result<Self, GrantError> {
		let http_client = gatekeeper_common_http::builder()
			.build()
			.map_err(|e| GrantError::Config(format!("Failed to create HTTP client: {e}")))?;

		info!(
			owner = %config.owner(),
			repo = %config.repo(),
			permission = %config.permission(),
			"Created collaborator grant client"
		);

		Ok(Self {
			config,
			http_client,
		})
	}

	pub fn config(&self) -> &GrantConfig {
		&self.config
	}

	#[instrument(skip(self), fields(repo = %self.config.repo()))]
	pub async fn add_collaborator(&self, username: &str) -> Result<Grant, GrantError> {
		let url = self.config.collaborator_url(username)?;
		debug!(url = %url, "Adding collaborator");

		let response = self
			.http_client
			.put(url)
			.header("Authorization", format!("Bearer {}", self.config.token()))
			.header("Accept", "application/vnd.github+json")
			.header("X-GitHub-Api-Version", API_VERSION)
			.json(&serde_json::json!({ "permission": self.config.permission().as_str() }))
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					return GrantError::Timeout;
				}
				GrantError::Network(e)
			})?;

		match response.status() {
			StatusCode::CREATED => {
				info!(username, "Collaborator invitation created");
				Ok(Grant::Created)
			}
			StatusCode::NO_CONTENT => {
				info!(username, "User already has repository access");
				Ok(Grant::AlreadyCollaborator)
			}
			status => {
				let body = response.text().await.unwrap_or_default();
				let err = map_github_error(status, &body);
				warn!(username, error = %err, "Collaborator grant failed");
				Err(err)
			}
		}
	}
}

#[async_trait]
impl GrantExecutor for CollaboratorGrantClient {
	async fn grant(&self, code_host_username: &str) -> Result<Grant, GrantFailed> {
		Ok(self.add_collaborator(code_host_username).await?)
	}
}
