// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_common_secret::SecretString;
use url::Url;

use crate::error::PatreonError;

pub const PATREON_AUTHORIZE_URL: &str = "https://www.patreon.com/oauth2/authorize";
pub const PATREON_TOKEN_URL: &str = "https://www.patreon.com/api/oauth2/token";
pub const PATREON_IDENTITY_URL: &str = "https://www.patreon.com/api/oauth2/v2/identity";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatreonEndpoints {
	pub authorize_url: String,
	pub token_url: String,
	pub identity_url: String,
}

impl Default for PatreonEndpoints {
	fn default() -> Self {
		Self {
			authorize_url: PATREON_AUTHORIZE_URL.to_string(),
			token_url: PATREON_TOKEN_URL.to_string(),
			identity_url: PATREON_IDENTITY_URL.to_string(),
		}
	}
}

impl PatreonEndpoints {
	pub fn with_base(base: &str) -> Self {
		let base = base.trim_end_matches('/');
		Self {
			authorize_url: format!("{base}/oauth2/authorize"),
			token_url: format!("{base}/api/oauth2/token"),
			identity_url: format!("{base}/api/oauth2/v2/identity"),
		}
	}
}

/// Patreon OAuth client settings.
///
/// `campaign_id` selects which of the user's memberships counts; pledges to
/// other creators are ignored.
#[derive(Debug, Clone)]
pub struct PatreonOAuthConfig {
	pub client_id: String,
	pub client_secret: SecretString,
	pub redirect_uri: String,
	pub campaign_id: String,
	pub scopes: Vec<String>,
	pub endpoints: PatreonEndpoints,
}

impl PatreonOAuthConfig {
	pub fn new(
		client_id: impl Into<String>,
		client_secret: SecretString,
		redirect_uri: impl Into<String>,
		campaign_id: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret,
			redirect_uri: redirect_uri.into(),
			campaign_id: campaign_id.into(),
			scopes: vec!["identity".to_string(), "identity.memberships".to_string()],
			endpoints: PatreonEndpoints::default(),
		}
	}

	pub fn with_endpoints(mut self, endpoints: PatreonEndpoints) -> Self {
		self.endpoints = endpoints;
		self
	}

	pub fn validate(&self) -> Result<(), PatreonError> {
		if self.client_id.trim().is_empty() {
			return Err(PatreonError::Config("client_id cannot be empty".to_string()));
		}
		if self.client_secret.is_blank() {
			return Err(PatreonError::Config("client_secret cannot be empty".to_string()));
		}
		if self.campaign_id.trim().is_empty() {
			return Err(PatreonError::Config("campaign_id cannot be empty".to_string()));
		}
		Url::parse(&self.redirect_uri)
			.map_err(|e| PatreonError::Config(format!("invalid redirect_uri: {e}")))?;
		Ok(())
	}

	/// Identity URL with memberships and their campaigns included, and only
	/// the fields the client reads.
	pub(crate) fn identity_request_url(&self) -> Result<Url, PatreonError> {
		let mut url = Url::parse(&self.endpoints.identity_url)
			.map_err(|e| PatreonError::Config(format!("invalid identity URL: {e}")))?;
		url.query_pairs_mut()
			.append_pair("include", "memberships,memberships.campaign")
			.append_pair(
				"fields[member]",
				"patron_status,currently_entitled_amount_cents,campaign_lifetime_support_cents,pledge_relationship_start",
			)
			.append_pair("fields[user]", "full_name,email");
		Ok(url)
	}
}
