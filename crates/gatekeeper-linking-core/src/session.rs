// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Link session state.
//!
//! ```text
//! Start ─github─► EligibleForChat ──────────────────┐
//!   │                                               ├─discord─► ChatLinked ─grant─► Granted
//!   └─github─► IneligibleRequireMembership          │
//!                ├─patreon─► MembershipVerified ────┘
//!                ├─patreon─► InsufficientTier
//!                └─patreon─► NotSponsor
//! ```
//!
//! A linkage conflict at any step ends in `AlreadyLinked`. A failed grant
//! leaves the session in `ChatLinked` so the grant can be retried.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::records::LinkageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
	Start,
	EligibleForChat,
	IneligibleRequireMembership,
	MembershipVerified,
	ChatLinked,
	Granted,
	AlreadyLinked,
	InsufficientTier,
	NotSponsor,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown workflow state: {0}")]
pub struct UnknownWorkflowState(pub String);

impl WorkflowState {
	const ALL: [WorkflowState; 9] = [
		WorkflowState::Start,
		WorkflowState::EligibleForChat,
		WorkflowState::IneligibleRequireMembership,
		WorkflowState::MembershipVerified,
		WorkflowState::ChatLinked,
		WorkflowState::Granted,
		WorkflowState::AlreadyLinked,
		WorkflowState::InsufficientTier,
		WorkflowState::NotSponsor,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			WorkflowState::Start => "start",
			WorkflowState::EligibleForChat => "eligible_for_chat",
			WorkflowState::IneligibleRequireMembership => "ineligible_require_membership",
			WorkflowState::MembershipVerified => "membership_verified",
			WorkflowState::ChatLinked => "chat_linked",
			WorkflowState::Granted => "granted",
			WorkflowState::AlreadyLinked => "already_linked",
			WorkflowState::InsufficientTier => "insufficient_tier",
			WorkflowState::NotSponsor => "not_sponsor",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			WorkflowState::Granted
				| WorkflowState::AlreadyLinked
				| WorkflowState::InsufficientTier
				| WorkflowState::NotSponsor
		)
	}
}

impl fmt::Display for WorkflowState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for WorkflowState {
	type Err = UnknownWorkflowState;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|state| state.as_str() == s)
			.ok_or_else(|| UnknownWorkflowState(s.to_string()))
	}
}

/// The operations a session can be driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
	VerifyCodeHost,
	VerifyMembership,
	VerifyChat,
	CompleteGrant,
}

impl WorkflowStep {
	pub fn allowed_from(&self, state: WorkflowState) -> bool {
		use WorkflowState::*;
		match self {
			// Signing in with GitHub always restarts the session.
			WorkflowStep::VerifyCodeHost => true,
			WorkflowStep::VerifyMembership => state == IneligibleRequireMembership,
			WorkflowStep::VerifyChat => {
				matches!(state, EligibleForChat | MembershipVerified | ChatLinked)
			}
			WorkflowStep::CompleteGrant => state == ChatLinked,
		}
	}
}

impl fmt::Display for WorkflowStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			WorkflowStep::VerifyCodeHost => "verify_code_host",
			WorkflowStep::VerifyMembership => "verify_membership",
			WorkflowStep::VerifyChat => "verify_chat",
			WorkflowStep::CompleteGrant => "complete_grant",
		};
		f.write_str(name)
	}
}

/// Random identifier carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSessionId(Uuid);

impl LinkSessionId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for LinkSessionId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for LinkSessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl FromStr for LinkSessionId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Self)
	}
}

/// One user's progress through the linking workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSession {
	pub id: LinkSessionId,
	pub state: WorkflowState,
	pub linkage_id: Option<LinkageId>,
	/// Chat username verified but not yet written to the linkage, kept so a
	/// failed grant can be retried without another Discord sign-in.
	pub pending_chat_username: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

impl LinkSession {
	pub fn new(ttl: Duration) -> Self {
		let now = Utc::now();
		Self {
			id: LinkSessionId::new(),
			state: WorkflowState::Start,
			linkage_id: None,
			pending_chat_username: None,
			created_at: now,
			updated_at: now,
			expires_at: now + ttl,
		}
	}

	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		now >= self.expires_at
	}

	pub fn transition(&mut self, state: WorkflowState) {
		self.state = state;
		self.updated_at = Utc::now();
	}

	/// Back to `Start` with no linkage, as after a failed verification.
	pub fn reset(&mut self) {
		self.linkage_id = None;
		self.pending_chat_username = None;
		self.transition(WorkflowState::Start);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn states_round_trip_through_their_column_form() {
		for state in WorkflowState::ALL {
			assert_eq!(state.as_str().parse::<WorkflowState>().unwrap(), state);
		}
		assert!("bogus".parse::<WorkflowState>().is_err());
	}

	#[test]
	fn code_host_step_is_allowed_from_every_state() {
		for state in WorkflowState::ALL {
			assert!(WorkflowStep::VerifyCodeHost.allowed_from(state));
		}
	}

	#[test]
	fn membership_step_requires_ineligible_code_host() {
		for state in WorkflowState::ALL {
			assert_eq!(
				WorkflowStep::VerifyMembership.allowed_from(state),
				state == WorkflowState::IneligibleRequireMembership
			);
		}
	}

	#[test]
	fn chat_step_allowed_after_either_path_or_on_retry() {
		assert!(WorkflowStep::VerifyChat.allowed_from(WorkflowState::EligibleForChat));
		assert!(WorkflowStep::VerifyChat.allowed_from(WorkflowState::MembershipVerified));
		assert!(WorkflowStep::VerifyChat.allowed_from(WorkflowState::ChatLinked));
		assert!(!WorkflowStep::VerifyChat.allowed_from(WorkflowState::Start));
		assert!(!WorkflowStep::VerifyChat.allowed_from(WorkflowState::IneligibleRequireMembership));
		assert!(!WorkflowStep::VerifyChat.allowed_from(WorkflowState::Granted));
	}

	#[test]
	fn grant_step_only_from_chat_linked() {
		assert!(WorkflowStep::CompleteGrant.allowed_from(WorkflowState::ChatLinked));
		assert!(!WorkflowStep::CompleteGrant.allowed_from(WorkflowState::Granted));
		assert!(!WorkflowStep::CompleteGrant.allowed_from(WorkflowState::EligibleForChat));
	}

	#[test]
	fn reset_clears_progress() {
		let mut session = LinkSession::new(Duration::minutes(10));
		session.linkage_id = Some(LinkageId::new());
		session.pending_chat_username = Some("alice#1234".to_string());
		session.transition(WorkflowState::ChatLinked);

		session.reset();

		assert_eq!(session.state, WorkflowState::Start);
		assert!(session.linkage_id.is_none());
		assert!(session.pending_chat_username.is_none());
	}

	#[test]
	fn expiry_is_relative_to_creation() {
		let session = LinkSession::new(Duration::minutes(10));
		assert!(!session.is_expired(session.created_at));
		assert!(session.is_expired(session.created_at + Duration::minutes(10)));
	}

	#[test]
	fn terminal_states() {
		assert!(WorkflowState::Granted.is_terminal());
		assert!(WorkflowState::NotSponsor.is_terminal());
		assert!(!WorkflowState::ChatLinked.is_terminal());
	}
}
