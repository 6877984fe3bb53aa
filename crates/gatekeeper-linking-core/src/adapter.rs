// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::identity::{Credential, IdentityRecord};
use crate::provider::Provider;

/// Why a provider could not vouch for the user.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
	/// The authorization code was rejected or the token endpoint failed.
	#[error("code exchange failed: {0}")]
	Exchange(String),

	/// The provider API returned an error for an otherwise valid token.
	#[error("provider API error: {0}")]
	Provider(String),

	#[error("malformed provider response: {0}")]
	MalformedResponse(String),

	#[error("network error: {0}")]
	Network(String),

	/// An adapter returned an identity for a different provider.
	#[error("expected a {expected} identity, got {actual}")]
	ProviderMismatch { expected: Provider, actual: Provider },
}

/// One OAuth identity provider.
///
/// The workflow only ever calls [`ProviderAdapter::verify`]; the two halves
/// exist separately so each can be exercised against a mock server.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
	fn provider(&self) -> Provider;

	/// Where to send the browser, carrying the single-use `state`.
	fn authorization_url(&self, state: &str) -> String;

	async fn exchange(&self, code: &str) -> Result<Credential, VerificationError>;

	async fn fetch_identity(&self, credential: &Credential)
		-> Result<IdentityRecord, VerificationError>;

	async fn verify(&self, code: &str) -> Result<IdentityRecord, VerificationError> {
		let credential = self.exchange(code).await?;
		let identity = self.fetch_identity(&credential).await?;
		if identity.provider != self.provider() {
			return Err(VerificationError::ProviderMismatch {
				expected: self.provider(),
				actual: identity.provider,
			});
		}
		Ok(identity)
	}
}
