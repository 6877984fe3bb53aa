// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Patreon API v2 payloads (JSON:API documents).

use chrono::{DateTime, Utc};
use gatekeeper_common_secret::SecretString;
use gatekeeper_linking_core::{IdentityRecord, Provider};
use serde::Deserialize;

/// `patron_status` of a member whose pledge is current.
pub const ACTIVE_PATRON: &str = "active_patron";

#[derive(Debug, Deserialize)]
pub struct PatreonTokenResponse {
	pub access_token: SecretString,
	#[serde(default)]
	pub token_type: Option<String>,
	#[serde(default)]
	pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OAuthErrorBody {
	pub error: String,
	#[serde(default)]
	pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdentityDocument {
	pub data: UserResource,
	#[serde(default)]
	pub included: Vec<IncludedResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResource {
	pub id: String,
	#[serde(default)]
	pub attributes: UserAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserAttributes {
	pub full_name: Option<String>,
	pub email: Option<String>,
}

/// Included resources are mixed: members, campaigns and tiers share the array.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum IncludedResource {
	Member(MemberResource),
	#[serde(other)]
	Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberResource {
	#[serde(default)]
	pub attributes: MemberAttributes,
	#[serde(default)]
	pub relationships: Option<MemberRelationships>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MemberAttributes {
	pub patron_status: Option<String>,
	pub currently_entitled_amount_cents: Option<u64>,
	pub campaign_lifetime_support_cents: Option<u64>,
	pub pledge_relationship_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberRelationships {
	pub campaign: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Relationship {
	pub data: Option<ResourceRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceRef {
	pub id: String,
}

impl MemberResource {
	fn campaign_id(&self) -> Option<&str> {
		self.relationships
			.as_ref()?
			.campaign
			.as_ref()?
			.data
			.as_ref()
			.map(|r| r.id.as_str())
	}
}

impl IdentityDocument {
	/// Normalise to an identity, counting only the membership in `campaign_id`.
	pub(crate) fn into_identity(self, campaign_id: &str) -> IdentityRecord {
		let member = self.included.into_iter().find_map(|r| match r {
			IncludedResource::Member(m) if m.campaign_id() == Some(campaign_id) => Some(m),
			_ => None,
		});

		let attributes = member.map(|m| m.attributes).unwrap_or_default();
		let active = attributes.patron_status.as_deref() == Some(ACTIVE_PATRON);

		IdentityRecord {
			provider: Provider::Membership,
			external_id: self.data.id,
			display_name: self.data.attributes.full_name.filter(|n| !n.is_empty()),
			email: self.data.attributes.email.filter(|e| !e.is_empty()),
			tier_amount: if active {
				attributes.currently_entitled_amount_cents.unwrap_or(0)
			} else {
				0
			},
			lifetime_amount: attributes.campaign_lifetime_support_cents.unwrap_or(0),
			active,
			sponsorship_started_at: attributes.pledge_relationship_start,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DOC: &str = r#"{
		"data": {
			"id": "9001",
			"type": "user",
			"attributes": { "full_name": "Carol", "email": "carol@example.com" }
		},
		"included": [
			{
				"id": "m-other",
				"type": "member",
				"attributes": {
					"patron_status": "active_patron",
					"currently_entitled_amount_cents": 10000,
					"campaign_lifetime_support_cents": 90000
				},
				"relationships": { "campaign": { "data": { "id": "1", "type": "campaign" } } }
			},
			{
				"id": "m-ours",
				"type": "member",
				"attributes": {
					"patron_status": "active_patron",
					"currently_entitled_amount_cents": 700,
					"campaign_lifetime_support_cents": 2100,
					"pledge_relationship_start": "2024-05-01T12:00:00.000+00:00"
				},
				"relationships": { "campaign": { "data": { "id": "4242", "type": "campaign" } } }
			},
			{ "id": "4242", "type": "campaign", "attributes": {} },
			{ "id": "t1", "type": "tier", "attributes": {} }
		]
	}"#;

	#[test]
	fn picks_membership_of_configured_campaign() {
		let doc: IdentityDocument = serde_json::from_str(DOC).unwrap();
		let identity = doc.into_identity("4242");

		assert_eq!(identity.provider, Provider::Membership);
		assert_eq!(identity.external_id, "9001");
		assert_eq!(identity.tier_amount, 700);
		assert_eq!(identity.lifetime_amount, 2100);
		assert!(identity.active);
		assert!(identity.sponsorship_started_at.is_some());
	}

	#[test]
	fn missing_membership_is_inactive() {
		let doc: IdentityDocument = serde_json::from_str(DOC).unwrap();
		let identity = doc.into_identity("7777");

		assert!(!identity.active);
		assert_eq!(identity.tier_amount, 0);
		assert_eq!(identity.lifetime_amount, 0);
	}

	#[test]
	fn former_patron_keeps_lifetime_but_no_tier() {
		let json = r#"{
			"data": { "id": "1", "type": "user", "attributes": {} },
			"included": [{
				"id": "m", "type": "member",
				"attributes": {
					"patron_status": "former_patron",
					"currently_entitled_amount_cents": 500,
					"campaign_lifetime_support_cents": 1500
				},
				"relationships": { "campaign": { "data": { "id": "c", "type": "campaign" } } }
			}]
		}"#;
		let doc: IdentityDocument = serde_json::from_str(json).unwrap();
		let identity = doc.into_identity("c");

		assert!(!identity.active);
		assert_eq!(identity.tier_amount, 0);
		assert_eq!(identity.lifetime_amount, 1500);
	}

	#[test]
	fn document_without_included_parses() {
		let json = r#"{ "data": { "id": "5", "type": "user" } }"#;
		let doc: IdentityDocument = serde_json::from_str(json).unwrap();
		assert!(!doc.into_identity("c").active);
	}
}
