// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use gatekeeper_linking_core::{
	Credential, IdentityRecord, Provider, ProviderAdapter, VerificationError,
};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::PatreonOAuthConfig;
use crate::error::PatreonError;
use crate::types::{IdentityDocument, OAuthErrorBody, PatreonTokenResponse};

#[derive(Debug, Clone)]
pub struct PatreonOAuthClient {
	config: PatreonOAuthConfig,
	http: reqwest::Client,
}

impl PatreonOAuthClient {
	pub fn new(config: PatreonOAuthConfig) -> Result<Self, PatreonError> {
		config.validate()?;
		let http = gatekeeper_common_http::builder().build()?;
		Ok(Self { config, http })
	}

	pub fn config(&self) -> &PatreonOAuthConfig {
		&self.config
	}

	pub fn authorization_url(&self, state: &str) -> Result<String, PatreonError> {
		let mut url = Url::parse(&self.config.endpoints.authorize_url)
			.map_err(|e| PatreonError::Config(format!("invalid authorize URL: {e}")))?;
		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", &self.config.redirect_uri)
			.append_pair("scope", &self.config.scopes.join(" "))
			.append_pair("state", state);
		Ok(url.to_string())
	}

	#[instrument(skip(self, code), name = "PatreonOAuthClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<PatreonTokenResponse, PatreonError> {
		debug!("exchanging Patreon authorization code");

		let response = self
			.http
			.post(&self.config.endpoints.token_url)
			.header("Accept", "application/json")
			.form(&[
				("grant_type", "authorization_code"),
				("code", code),
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose().as_str()),
				("redirect_uri", self.config.redirect_uri.as_str()),
			])
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		if !status.is_success() {
			let message = serde_json::from_str::<OAuthErrorBody>(&body)
				.map(|e| e.error_description.unwrap_or(e.error))
				.unwrap_or_else(|_| format!("token endpoint returned {status}"));
			return Err(PatreonError::TokenRejected(message));
		}

		serde_json::from_str(&body)
			.map_err(|e| PatreonError::InvalidResponse(format!("token response: {e}")))
	}

	#[instrument(
		skip(self, access_token),
		fields(campaign_id = %self.config.campaign_id),
		name = "PatreonOAuthClient::get_membership"
	)]
	pub async fn get_membership(&self, access_token: &str) -> Result<IdentityRecord, PatreonError> {
		let url = self.config.identity_request_url()?;

		let response = self
			.http
			.get(url)
			.bearer_auth(access_token)
			.header("Accept", "application/vnd.api+json")
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(PatreonError::api_error(status.as_u16(), body));
		}

		let document: IdentityDocument = response
			.json()
			.await
			.map_err(|e| PatreonError::InvalidResponse(format!("identity document: {e}")))?;

		let identity = document.into_identity(&self.config.campaign_id);
		info!(
			patreon_user_id = %identity.external_id,
			active = identity.active,
			tier_amount = identity.tier_amount,
			"Patreon membership fetched"
		);
		Ok(identity)
	}
}

#[async_trait]
impl ProviderAdapter for PatreonOAuthClient {
	fn provider(&self) -> Provider {
		Provider::Membership
	}

	fn authorization_url(&self, state: &str) -> String {
		// The endpoint is validated when the config is loaded; fall back to
		// the bare endpoint rather than failing the redirect.
		PatreonOAuthClient::authorization_url(self, state)
			.unwrap_or_else(|_| self.config.endpoints.authorize_url.clone())
	}

	async fn exchange(&self, code: &str) -> Result<Credential, VerificationError> {
		let token = self.exchange_code(code).await?;
		Ok(Credential::new(Provider::Membership, token.access_token))
	}

	async fn fetch_identity(
		&self,
		credential: &Credential,
	) -> Result<IdentityRecord, VerificationError> {
		Ok(self.get_membership(credential.access_token.expose()).await?)
	}
}
