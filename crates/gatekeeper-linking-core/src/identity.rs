// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use gatekeeper_common_secret::SecretString;
use serde::Serialize;

use crate::provider::Provider;

/// Access token obtained from a provider's OAuth code exchange.
///
/// Lives only for the duration of one callback request and is never stored.
#[derive(Debug, Clone)]
pub struct Credential {
	pub provider: Provider,
	pub access_token: SecretString,
}

impl Credential {
	pub fn new(provider: Provider, access_token: impl Into<SecretString>) -> Self {
		Self {
			provider,
			access_token: access_token.into(),
		}
	}
}

/// What a provider says about a verified user, normalised across providers.
///
/// Amounts are in cents. For Discord the amounts are zero and `active` is
/// always true; for GitHub and Patreon they describe the sponsorship toward
/// the configured account or campaign only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityRecord {
	pub provider: Provider,
	/// Login (GitHub), user id (Patreon) or username (Discord).
	pub external_id: String,
	pub display_name: Option<String>,
	pub email: Option<String>,
	pub tier_amount: u64,
	pub lifetime_amount: u64,
	pub active: bool,
	pub sponsorship_started_at: Option<DateTime<Utc>>,
}

impl IdentityRecord {
	/// A chat identity carries no payment information.
	pub fn chat(username: impl Into<String>) -> Self {
		Self {
			provider: Provider::Chat,
			external_id: username.into(),
			display_name: None,
			email: None,
			tier_amount: 0,
			lifetime_amount: 0,
			active: true,
			sponsorship_started_at: None,
		}
	}
}
