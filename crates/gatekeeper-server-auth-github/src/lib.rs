// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub sign-in and sponsorship verification.
//!
//! The user signs in with GitHub OAuth; the resulting token is then used for
//! one GraphQL query that returns the viewer's login and their sponsorship of
//! the configured sponsorable account (a user or an organization):
//!
//! - `tier_amount` is the monthly price of the sponsorship tier, in cents
//! - `lifetime_amount` is everything the viewer has paid that account
//! - `active` is GitHub's own `isActive` flag
//!
//! A viewer who has never sponsored the account is a valid identity with
//! `active = false`, not an error.
//!
//! ```rust,no_run
//! use gatekeeper_linking_core::ProviderAdapter;
//! use gatekeeper_server_auth_github::{GitHubOAuthClient, GitHubOAuthConfig};
//!
//! # async fn example(config: GitHubOAuthConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubOAuthClient::new(config)?;
//! let url = client.authorization_url("per-session-random-state");
//! // ...redirect, then on callback:
//! let identity = client.verify("code-from-callback").await?;
//! println!("{} sponsors at {} cents", identity.external_id, identity.tier_amount);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatekeeper_common_secret::SecretString;
use gatekeeper_linking_core::{
	Credential, IdentityRecord, Provider, ProviderAdapter, VerificationError,
};
use serde::Deserialize;
use url::Url;

pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const SPONSORSHIP_QUERY: &str = r#"
query($sponsorable: String!) {
  viewer {
    login
    name
    email
    totalSponsorshipAmountAsSponsorInCents(sponsorableLogins: [$sponsorable])
  }
  repositoryOwner(login: $sponsorable) {
    ... on Sponsorable {
      sponsorshipForViewerAsSponsor(activeOnly: false) {
        isActive
        createdAt
        tier { monthlyPriceInCents }
      }
    }
  }
}
"#;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid GitHub OAuth configuration: {0}")]
	InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	#[error("failed to parse response: {0}")]
	ParseError(String),

	#[error("GitHub API error: {0}")]
	GitHubError(String),
}

impl From<OAuthError> for VerificationError {
	fn from(e: OAuthError) -> Self {
		match e {
			OAuthError::HttpRequest(e) => VerificationError::Network(e.to_string()),
			OAuthError::ParseError(msg) => VerificationError::MalformedResponse(msg),
			OAuthError::GitHubError(msg) => VerificationError::Provider(msg),
		}
	}
}

// =============================================================================
// Configuration
// =============================================================================

/// Endpoints, overridable so tests can point the client at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubEndpoints {
	pub authorize_url: String,
	pub token_url: String,
	pub graphql_url: String,
}

impl Default for GitHubEndpoints {
	fn default() -> Self {
		Self {
			authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
			token_url: GITHUB_TOKEN_URL.to_string(),
			graphql_url: GITHUB_GRAPHQL_URL.to_string(),
		}
	}
}

impl GitHubEndpoints {
	/// All three endpoints under one base URL, as served by a mock server.
	pub fn with_base(base: &str) -> Self {
		let base = base.trim_end_matches('/');
		Self {
			authorize_url: format!("{base}/login/oauth/authorize"),
			token_url: format!("{base}/login/oauth/access_token"),
			graphql_url: format!("{base}/graphql"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct GitHubOAuthConfig {
	pub client_id: String,
	pub client_secret: SecretString,
	pub redirect_uri: String,
	pub scopes: Vec<String>,
	/// Login of the account whose sponsors are being verified.
	pub sponsorable_login: String,
	pub endpoints: GitHubEndpoints,
}

impl GitHubOAuthConfig {
	pub fn new(
		client_id: impl Into<String>,
		client_secret: SecretString,
		redirect_uri: impl Into<String>,
		sponsorable_login: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret,
			redirect_uri: redirect_uri.into(),
			scopes: Self::default_scopes(),
			sponsorable_login: sponsorable_login.into(),
			endpoints: GitHubEndpoints::default(),
		}
	}

	/// `read:user` is enough for the viewer's sponsorships; `user:email`
	/// lets the sponsor record carry an address.
	pub fn default_scopes() -> Vec<String> {
		vec!["read:user".to_string(), "user:email".to_string()]
	}

	pub fn with_endpoints(mut self, endpoints: GitHubEndpoints) -> Self {
		self.endpoints = endpoints;
		self
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::InvalidConfig("client_id cannot be empty".to_string()));
		}
		if self.client_secret.is_blank() {
			return Err(ConfigError::InvalidConfig(
				"client_secret cannot be empty".to_string(),
			));
		}
		if self.redirect_uri.trim().is_empty() {
			return Err(ConfigError::InvalidConfig(
				"redirect_uri cannot be empty".to_string(),
			));
		}
		if self.sponsorable_login.trim().is_empty() {
			return Err(ConfigError::InvalidConfig(
				"sponsorable_login cannot be empty".to_string(),
			));
		}
		Ok(())
	}

	pub fn scopes_string(&self) -> String {
		self.scopes.join(" ")
	}

	/// Accepts space- or comma-separated scopes, as GitHub returns either.
	pub fn parse_scopes(scope_str: &str) -> Vec<String> {
		scope_str
			.split([' ', ','])
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	}
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GitHubTokenResponse {
	pub access_token: SecretString,
	pub token_type: String,
	#[serde(default)]
	pub scope: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
	error: String,
	error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
	data: Option<SponsorshipData>,
	#[serde(default)]
	errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
	message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsorshipData {
	viewer: Viewer,
	repository_owner: Option<SponsorableOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Viewer {
	login: String,
	name: Option<String>,
	email: Option<String>,
	#[serde(default)]
	total_sponsorship_amount_as_sponsor_in_cents: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsorableOwner {
	sponsorship_for_viewer_as_sponsor: Option<Sponsorship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sponsorship {
	is_active: bool,
	created_at: Option<DateTime<Utc>>,
	tier: Option<SponsorTier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsorTier {
	monthly_price_in_cents: u64,
}

impl SponsorshipData {
	fn into_identity(self) -> IdentityRecord {
		let sponsorship = self
			.repository_owner
			.and_then(|owner| owner.sponsorship_for_viewer_as_sponsor);

		let (active, tier_amount, started_at) = match sponsorship {
			Some(s) => (
				s.is_active,
				s.tier.map(|t| t.monthly_price_in_cents).unwrap_or(0),
				s.created_at,
			),
			None => (false, 0, None),
		};

		IdentityRecord {
			provider: Provider::CodeHost,
			external_id: self.viewer.login,
			display_name: self.viewer.name.filter(|n| !n.is_empty()),
			email: self.viewer.email.filter(|e| !e.is_empty()),
			tier_amount,
			lifetime_amount: self
				.viewer
				.total_sponsorship_amount_as_sponsor_in_cents
				.unwrap_or(0),
			active,
			sponsorship_started_at: started_at,
		}
	}
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone)]
pub struct GitHubOAuthClient {
	config: GitHubOAuthConfig,
	http_client: reqwest::Client,
}

impl GitHubOAuthClient {
	#[tracing::instrument(skip_all, name = "GitHubOAuthClient::new")]
	pub fn new(config: GitHubOAuthConfig) -> Result<Self, OAuthError> {
		let http_client = gatekeeper_common_http::builder().build()?;
		Ok(Self {
			config,
			http_client,
		})
	}

	pub fn config(&self) -> &GitHubOAuthConfig {
		&self.config
	}

	pub fn authorization_url(&self, state: &str) -> String {
		let mut url = match Url::parse(&self.config.endpoints.authorize_url) {
			Ok(url) => url,
			Err(e) => {
				tracing::error!(error = %e, "invalid GitHub authorize URL");
				return self.config.endpoints.authorize_url.clone();
			}
		};
		url.query_pairs_mut()
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", &self.config.redirect_uri)
			.append_pair("scope", &self.config.scopes_string())
			.append_pair("state", state)
			.append_pair("allow_signup", "false");
		url.to_string()
	}

	#[tracing::instrument(skip(self, code), name = "GitHubOAuthClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<GitHubTokenResponse, OAuthError> {
		tracing::debug!("exchanging GitHub authorization code");

		let response = self
			.http_client
			.post(&self.config.endpoints.token_url)
			.header("Accept", "application/json")
			.form(&[
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose().as_str()),
				("code", code),
				("redirect_uri", self.config.redirect_uri.as_str()),
			])
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		// GitHub reports a bad code as 200 with an error body.
		if let Ok(error_response) = serde_json::from_str::<GitHubErrorResponse>(&body) {
			if !error_response.error.is_empty() {
				let message = error_response
					.error_description
					.unwrap_or(error_response.error);
				return Err(OAuthError::GitHubError(message));
			}
		}
		if !status.is_success() {
			return Err(OAuthError::GitHubError(format!(
				"token endpoint returned {status}"
			)));
		}

		serde_json::from_str(&body)
			.map_err(|e| OAuthError::ParseError(format!("failed to parse token response: {e}")))
	}

	/// Run the sponsorship query for the token's user.
	#[tracing::instrument(
		skip(self, access_token),
		fields(sponsorable = %self.config.sponsorable_login),
		name = "GitHubOAuthClient::get_sponsorship"
	)]
	pub async fn get_sponsorship(&self, access_token: &str) -> Result<IdentityRecord, OAuthError> {
		let response = self
			.http_client
			.post(&self.config.endpoints.graphql_url)
			.header("Accept", "application/vnd.github+json")
			.header("Authorization", format!("Bearer {access_token}"))
			.json(&serde_json::json!({
				"query": SPONSORSHIP_QUERY,
				"variables": { "sponsorable": self.config.sponsorable_login },
			}))
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status();
			let body = response.text().await.unwrap_or_default();
			return Err(OAuthError::GitHubError(format!(
				"sponsorship query returned {status}: {body}"
			)));
		}

		let payload: GraphQlResponse = response
			.json()
			.await
			.map_err(|e| OAuthError::ParseError(format!("failed to parse GraphQL response: {e}")))?;

		let Some(data) = payload.data else {
			let messages: Vec<_> = payload.errors.into_iter().map(|e| e.message).collect();
			return Err(OAuthError::GitHubError(messages.join("; ")));
		};
		if !payload.errors.is_empty() {
			// Partial errors (for example an unknown sponsorable) still leave
			// the viewer intact; treat the sponsorship as absent.
			let messages: Vec<_> = payload.errors.iter().map(|e| e.message.as_str()).collect();
			tracing::warn!(errors = %messages.join("; "), "GraphQL returned partial errors");
		}

		let identity = data.into_identity();
		tracing::info!(
			login = %identity.external_id,
			active = identity.active,
			tier_amount = identity.tier_amount,
			"GitHub sponsorship fetched"
		);
		Ok(identity)
	}
}

#[async_trait]
impl ProviderAdapter for GitHubOAuthClient {
	fn provider(&self) -> Provider {
		Provider::CodeHost
	}

	fn authorization_url(&self, state: &str) -> String {
		GitHubOAuthClient::authorization_url(self, state)
	}

	async fn exchange(&self, code: &str) -> Result<Credential, VerificationError> {
		let token = self.exchange_code(code).await.map_err(|e| match e {
			OAuthError::GitHubError(msg) => VerificationError::Exchange(msg),
			other => other.into(),
		})?;
		Ok(Credential::new(Provider::CodeHost, token.access_token))
	}

	async fn fetch_identity(
		&self,
		credential: &Credential,
	) -> Result<IdentityRecord, VerificationError> {
		Ok(self
			.get_sponsorship(credential.access_token.expose())
			.await?)
	}
}
