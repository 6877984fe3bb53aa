// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::provider::Provider;

/// Latest known sponsorship state of one provider username.
///
/// There is at most one record per `(provider, username)`. It is refreshed
/// on every successful verification, eligible or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorRecord {
	pub provider: Provider,
	pub username: String,
	pub email: Option<String>,
	pub active_tier_amount: u64,
	pub lifetime_payments: u64,
	pub sponsorship_start: Option<DateTime<Utc>>,
	/// `None` while the sponsorship is active.
	pub sponsorship_end: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl SponsorRecord {
	pub fn is_active(&self) -> bool {
		self.sponsorship_end.is_none()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAccount {
	pub username: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Opaque identifier of a linkage row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkageId(Uuid);

impl LinkageId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn as_uuid(&self) -> Uuid {
		self.0
	}
}

impl Default for LinkageId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for LinkageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl FromStr for LinkageId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Self)
	}
}

/// Which GitHub, Patreon and Discord identities belong to one person.
///
/// Once `chat_username` is set the linkage is complete: access has been
/// granted and the row no longer accepts step writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkageRecord {
	pub id: LinkageId,
	pub code_host_username: Option<String>,
	pub membership_username: Option<String>,
	pub chat_username: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl LinkageRecord {
	pub fn is_complete(&self) -> bool {
		self.chat_username.is_some()
	}

	pub fn username_for(&self, provider: Provider) -> Option<&str> {
		match provider {
			Provider::CodeHost => self.code_host_username.as_deref(),
			Provider::Membership => self.membership_username.as_deref(),
			Provider::Chat => self.chat_username.as_deref(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn linkage(chat: Option<&str>) -> LinkageRecord {
		let now = Utc::now();
		LinkageRecord {
			id: LinkageId::new(),
			code_host_username: Some("alice".to_string()),
			membership_username: None,
			chat_username: chat.map(str::to_string),
			created_at: now,
			updated_at: now,
		}
	}

	#[test]
	fn linkage_is_complete_once_chat_is_set() {
		assert!(!linkage(None).is_complete());
		assert!(linkage(Some("alice#1234")).is_complete());
	}

	#[test]
	fn username_for_maps_each_provider_to_its_column() {
		let record = linkage(Some("alice#1234"));
		assert_eq!(record.username_for(Provider::CodeHost), Some("alice"));
		assert_eq!(record.username_for(Provider::Membership), None);
		assert_eq!(record.username_for(Provider::Chat), Some("alice#1234"));
	}

	#[test]
	fn linkage_id_parses_its_display_form() {
		let id = LinkageId::new();
		assert_eq!(id.to_string().parse::<LinkageId>().unwrap(), id);
		assert!("not-a-uuid".parse::<LinkageId>().is_err());
	}
}
