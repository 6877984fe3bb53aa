// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Discord sign-in.
//!
//! Discord is only asked who the user is; it carries no payment data. The
//! resulting identity is keyed by the Discord username, or by the legacy
//! `name#1234` tag for accounts that still have a discriminator.

use async_trait::async_trait;
use gatekeeper_common_secret::SecretString;
use gatekeeper_linking_core::{
	Credential, IdentityRecord, Provider, ProviderAdapter, VerificationError,
};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

pub const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
pub const DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
pub const DISCORD_USER_URL: &str = "https://discord.com/api/users/@me";

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	#[error("token exchange rejected: {0}")]
	TokenRejected(String),

	#[error("Discord API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	#[error("failed to parse response: {0}")]
	ParseError(String),

	#[error("invalid Discord OAuth configuration: {0}")]
	InvalidConfig(String),
}

impl From<DiscordError> for VerificationError {
	fn from(e: DiscordError) -> Self {
		match e {
			DiscordError::HttpRequest(e) => VerificationError::Network(e.to_string()),
			DiscordError::TokenRejected(msg) => VerificationError::Exchange(msg),
			e @ DiscordError::ApiError { .. } => VerificationError::Provider(e.to_string()),
			DiscordError::ParseError(msg) => VerificationError::MalformedResponse(msg),
			DiscordError::InvalidConfig(msg) => VerificationError::Provider(msg),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordEndpoints {
	pub authorize_url: String,
	pub token_url: String,
	pub user_url: String,
}

impl Default for DiscordEndpoints {
	fn default() -> Self {
		Self {
			authorize_url: DISCORD_AUTHORIZE_URL.to_string(),
			token_url: DISCORD_TOKEN_URL.to_string(),
			user_url: DISCORD_USER_URL.to_string(),
		}
	}
}

impl DiscordEndpoints {
	pub fn with_base(base: &str) -> Self {
		let base = base.trim_end_matches('/');
		Self {
			authorize_url: format!("{base}/oauth2/authorize"),
			token_url: format!("{base}/api/oauth2/token"),
			user_url: format!("{base}/api/users/@me"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct DiscordOAuthConfig {
	pub client_id: String,
	pub client_secret: SecretString,
	pub redirect_uri: String,
	pub endpoints: DiscordEndpoints,
}

impl DiscordOAuthConfig {
	pub fn new(
		client_id: impl Into<String>,
		client_secret: SecretString,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret,
			redirect_uri: redirect_uri.into(),
			endpoints: DiscordEndpoints::default(),
		}
	}

	pub fn with_endpoints(mut self, endpoints: DiscordEndpoints) -> Self {
		self.endpoints = endpoints;
		self
	}

	pub fn validate(&self) -> Result<(), DiscordError> {
		if self.client_id.trim().is_empty() {
			return Err(DiscordError::InvalidConfig("client_id cannot be empty".into()));
		}
		if self.client_secret.is_blank() {
			return Err(DiscordError::InvalidConfig("client_secret cannot be empty".into()));
		}
		if self.redirect_uri.trim().is_empty() {
			return Err(DiscordError::InvalidConfig("redirect_uri cannot be empty".into()));
		}
		Ok(())
	}
}

#[derive(Debug, Deserialize)]
pub struct DiscordTokenResponse {
	pub access_token: SecretString,
	#[serde(default)]
	pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscordErrorBody {
	error: String,
	error_description: Option<String>,
}

/// The subset of `/users/@me` the service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
	pub id: String,
	pub username: String,
	#[serde(default)]
	pub discriminator: Option<String>,
	#[serde(default)]
	pub global_name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
}

impl DiscordUser {
	/// Stable handle used as the chat identity.
	///
	/// Migrated accounts report discriminator `"0"` and are identified by
	/// username alone.
	pub fn handle(&self) -> String {
		match self.discriminator.as_deref() {
			Some(d) if !d.is_empty() && d != "0" => format!("{}#{}", self.username, d),
			_ => self.username.clone(),
		}
	}

	pub fn into_identity(self) -> IdentityRecord {
		let mut identity = IdentityRecord::chat(self.handle());
		identity.display_name = self.global_name.filter(|n| !n.is_empty());
		identity.email = self.email.filter(|e| !e.is_empty());
		identity
	}
}

#[derive(Debug, Clone)]
pub struct DiscordOAuthClient {
	config: DiscordOAuthConfig,
	http: reqwest::Client,
}

impl DiscordOAuthClient {
	pub fn new(config: DiscordOAuthConfig) -> Result<Self, DiscordError> {
		config.validate()?;
		let http = gatekeeper_common_http::builder().build()?;
		Ok(Self { config, http })
	}

	pub fn authorization_url(&self, state: &str) -> Result<String, DiscordError> {
		let mut url = Url::parse(&self.config.endpoints.authorize_url)
			.map_err(|e| DiscordError::InvalidConfig(format!("authorize URL: {e}")))?;
		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", &self.config.redirect_uri)
			.append_pair("scope", "identify")
			.append_pair("state", state)
			.append_pair("prompt", "consent");
		Ok(url.to_string())
	}

	#[instrument(skip(self, code), name = "DiscordOAuthClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<DiscordTokenResponse, DiscordError> {
		let response = self
			.http
			.post(&self.config.endpoints.token_url)
			.form(&[
				("grant_type", "authorization_code"),
				("code", code),
				("redirect_uri", self.config.redirect_uri.as_str()),
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose().as_str()),
			])
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		if !status.is_success() {
			let message = serde_json::from_str::<DiscordErrorBody>(&body)
				.map(|e| e.error_description.unwrap_or(e.error))
				.unwrap_or_else(|_| format!("token endpoint returned {status}"));
			return Err(DiscordError::TokenRejected(message));
		}

		serde_json::from_str(&body).map_err(|e| DiscordError::ParseError(e.to_string()))
	}

	#[instrument(skip(self, access_token), name = "DiscordOAuthClient::get_user")]
	pub async fn get_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
		let response = self
			.http
			.get(&self.config.endpoints.user_url)
			.bearer_auth(access_token)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(DiscordError::ApiError {
				status: status.as_u16(),
				message,
			});
		}

		let user: DiscordUser = response
			.json()
			.await
			.map_err(|e| DiscordError::ParseError(e.to_string()))?;
		tracing::info!(discord_user_id = %user.id, handle = %user.handle(), "Discord user fetched");
		Ok(user)
	}
}

#[async_trait]
impl ProviderAdapter for DiscordOAuthClient {
	fn provider(&self) -> Provider {
		Provider::Chat
	}

	fn authorization_url(&self, state: &str) -> String {
		DiscordOAuthClient::authorization_url(self, state)
			.unwrap_or_else(|_| self.config.endpoints.authorize_url.clone())
	}

	async fn exchange(&self, code: &str) -> Result<Credential, VerificationError> {
		let token = self.exchange_code(code).await?;
		Ok(Credential::new(Provider::Chat, token.access_token))
	}

	async fn fetch_identity(
		&self,
		credential: &Credential,
	) -> Result<IdentityRecord, VerificationError> {
		let user = self.get_user(credential.access_token.expose()).await?;
		Ok(user.into_identity())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn user(username: &str, discriminator: Option<&str>) -> DiscordUser {
		DiscordUser {
			id: "80351110224678912".to_string(),
			username: username.to_string(),
			discriminator: discriminator.map(str::to_string),
			global_name: None,
			email: None,
		}
	}

	#[test]
	fn handle_uses_discriminator_only_for_legacy_accounts() {
		assert_eq!(user("nelly", Some("1337")).handle(), "nelly#1337");
		assert_eq!(user("nelly", Some("0")).handle(), "nelly");
		assert_eq!(user("nelly", None).handle(), "nelly");
	}

	#[test]
	fn identity_is_active_with_no_amounts() {
		let mut u = user("nelly", Some("0"));
		u.global_name = Some("Nelly".to_string());
		let identity = u.into_identity();

		assert_eq!(identity.provider, Provider::Chat);
		assert_eq!(identity.external_id, "nelly");
		assert_eq!(identity.display_name.as_deref(), Some("Nelly"));
		assert!(identity.active);
		assert_eq!(identity.tier_amount, 0);
	}

	#[test]
	fn authorization_url_requests_identify_only() {
		let client = DiscordOAuthClient::new(DiscordOAuthConfig::new(
			"did",
			SecretString::from("dsecret"),
			"https://gatekeeper.example.com/auth/discord/callback",
		))
		.unwrap();
		let url = Url::parse(&client.authorization_url("xyz").unwrap()).unwrap();
		let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

		assert!(pairs.contains(&("scope".into(), "identify".into())));
		assert!(pairs.contains(&("state".into(), "xyz".into())));
	}

	#[test]
	fn token_is_redacted() {
		let token: DiscordTokenResponse =
			serde_json::from_str(r#"{"access_token":"dsc_abc123","token_type":"Bearer"}"#).unwrap();
		assert!(!format!("{token:?}").contains("dsc_abc123"));
	}
}
