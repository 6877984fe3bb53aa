// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process stand-ins for providers and the grant executor, used by the
//! workflow and server tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use gatekeeper_linking_core::{
	Credential, Grant, GrantExecutor, GrantFailed, IdentityRecord, Provider, ProviderAdapter,
	VerificationError,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
	m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Answers each authorization code with a preconfigured identity or error.
///
/// The code doubles as the access token, so `fetch_identity` can find the
/// answer again. Unknown codes are rejected at exchange.
pub struct StaticAdapter {
	provider: Provider,
	answers: Mutex<HashMap<String, Result<IdentityRecord, String>>>,
}

impl StaticAdapter {
	pub fn new(provider: Provider) -> Self {
		Self {
			provider,
			answers: Mutex::new(HashMap::new()),
		}
	}

	pub fn with_identity(self, code: &str, identity: IdentityRecord) -> Self {
		self.insert(code, Ok(identity));
		self
	}

	/// `code` exchanges fine but the provider API then fails.
	pub fn with_failure(self, code: &str, message: &str) -> Self {
		self.insert(code, Err(message.to_string()));
		self
	}

	pub fn insert(&self, code: &str, answer: Result<IdentityRecord, String>) {
		lock(&self.answers).insert(code.to_string(), answer);
	}
}

#[async_trait]
impl ProviderAdapter for StaticAdapter {
	fn provider(&self) -> Provider {
		self.provider
	}

	fn authorization_url(&self, state: &str) -> String {
		format!("https://{}.invalid/authorize?state={state}", self.provider.slug())
	}

	async fn exchange(&self, code: &str) -> Result<Credential, VerificationError> {
		if lock(&self.answers).contains_key(code) {
			Ok(Credential::new(self.provider, code))
		} else {
			Err(VerificationError::Exchange(format!("unknown code {code}")))
		}
	}

	async fn fetch_identity(
		&self,
		credential: &Credential,
	) -> Result<IdentityRecord, VerificationError> {
		match lock(&self.answers).get(credential.access_token.expose().as_str()) {
			Some(Ok(identity)) => Ok(identity.clone()),
			Some(Err(message)) => Err(VerificationError::Provider(message.clone())),
			None => Err(VerificationError::Exchange("token not issued".to_string())),
		}
	}
}

/// Records every grant call. Grants succeed with `Created` the first time a
/// user is seen and `AlreadyCollaborator` afterwards, unless a failure is set.
#[derive(Default)]
pub struct RecordingGrantExecutor {
	calls: Mutex<Vec<String>>,
	failure: Mutex<Option<GrantFailed>>,
}

impl RecordingGrantExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_failure(&self, failure: Option<GrantFailed>) {
		*lock(&self.failure) = failure;
	}

	pub fn calls(&self) -> Vec<String> {
		lock(&self.calls).clone()
	}

	pub fn call_count(&self) -> usize {
		lock(&self.calls).len()
	}
}

#[async_trait]
impl GrantExecutor for RecordingGrantExecutor {
	async fn grant(&self, code_host_username: &str) -> Result<Grant, GrantFailed> {
		let mut calls = lock(&self.calls);
		let seen = calls.iter().any(|c| c == code_host_username);
		calls.push(code_host_username.to_string());
		drop(calls);

		if let Some(failure) = lock(&self.failure).clone() {
			return Err(failure);
		}
		Ok(if seen {
			Grant::AlreadyCollaborator
		} else {
			Grant::Created
		})
	}
}

/// A code-host identity sponsoring at `tier_amount` cents.
pub fn code_host_sponsor(login: &str, tier_amount: u64, active: bool) -> IdentityRecord {
	IdentityRecord {
		provider: Provider::CodeHost,
		external_id: login.to_string(),
		display_name: None,
		email: None,
		tier_amount,
		lifetime_amount: tier_amount,
		active,
		sponsorship_started_at: None,
	}
}

/// A membership identity pledging `tier_amount` cents.
pub fn membership_patron(user_id: &str, tier_amount: u64, active: bool) -> IdentityRecord {
	IdentityRecord {
		provider: Provider::Membership,
		external_id: user_id.to_string(),
		display_name: None,
		email: None,
		tier_amount,
		lifetime_amount: tier_amount,
		active,
		sponsorship_started_at: None,
	}
}
