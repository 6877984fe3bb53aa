// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{Duration, Utc};
use gatekeeper_linking_core::{
	EligibilityPolicy, GrantFailed, IdentityRecord, LinkSession, Provider, WorkflowState,
};
use gatekeeper_server_db::testing::create_migrated_test_pool;
use gatekeeper_server_db::{
	ChatAccountRepository, LinkSessionRepository, LinkageRepository, SponsorRepository,
};
use gatekeeper_server_linking::testing::{
	code_host_sponsor, membership_patron, RecordingGrantExecutor, StaticAdapter,
};
use gatekeeper_server_linking::{LinkingWorkflow, ProviderAdapters, WorkflowError, WorkflowStores};
use sqlx::SqlitePool;

struct Harness {
	workflow: LinkingWorkflow,
	grants: Arc<RecordingGrantExecutor>,
	code_host: Arc<StaticAdapter>,
	membership: Arc<StaticAdapter>,
	chat: Arc<StaticAdapter>,
	pool: SqlitePool,
}

impl Harness {
	async fn new() -> Self {
		Self::with_min_tier(500).await
	}

	async fn with_min_tier(min_tier_amount: u64) -> Self {
		let pool = create_migrated_test_pool().await;
		let grants = Arc::new(RecordingGrantExecutor::new());
		let code_host = Arc::new(StaticAdapter::new(Provider::CodeHost));
		let membership = Arc::new(StaticAdapter::new(Provider::Membership));
		let chat = Arc::new(StaticAdapter::new(Provider::Chat));

		let workflow = LinkingWorkflow::new(
			WorkflowStores {
				sponsors: Arc::new(SponsorRepository::new(pool.clone())),
				chat_accounts: Arc::new(ChatAccountRepository::new(pool.clone())),
				linkages: Arc::new(LinkageRepository::new(pool.clone())),
				sessions: Arc::new(LinkSessionRepository::new(pool.clone())),
			},
			ProviderAdapters {
				code_host: code_host.clone(),
				membership: membership.clone(),
				chat: chat.clone(),
			},
			grants.clone(),
			EligibilityPolicy { min_tier_amount },
			Duration::hours(1),
		);

		Self {
			workflow,
			grants,
			code_host,
			membership,
			chat,
			pool,
		}
	}

	fn linkages(&self) -> LinkageRepository {
		LinkageRepository::new(self.pool.clone())
	}

	async fn stored(&self, session: &LinkSession) -> LinkSession {
		self.workflow
			.load_session(session.id, Utc::now())
			.await
			.unwrap()
			.expect("session persisted")
	}
}

#[tokio::test]
async fn code_host_sponsor_is_granted_after_chat_link() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("alice", 1000, true)));
	h.chat.insert("dc", Ok(IdentityRecord::chat("alice#1234")));

	let mut session = h.workflow.start_session().await.unwrap();

	let state = h.workflow.verify_code_host(&mut session, "gh").await.unwrap();
	assert_eq!(state, WorkflowState::EligibleForChat);

	let linkage = h
		.linkages()
		.find_by_identity(Provider::CodeHost, "alice")
		.await
		.unwrap()
		.unwrap();
	assert_eq!(linkage.membership_username, None);
	assert_eq!(linkage.chat_username, None);
	assert_eq!(session.linkage_id, Some(linkage.id));

	let state = h.workflow.verify_chat(&mut session, "dc").await.unwrap();
	assert_eq!(state, WorkflowState::Granted);
	assert_eq!(h.grants.calls(), vec!["alice".to_string()]);

	let linkage = h.linkages().get_linkage(linkage.id).await.unwrap().unwrap();
	assert_eq!(linkage.chat_username.as_deref(), Some("alice#1234"));
	assert!(linkage.is_complete());

	let stored = h.stored(&session).await;
	assert_eq!(stored.state, WorkflowState::Granted);
}

#[tokio::test]
async fn replaying_completed_identity_is_already_linked_without_grant() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("alice", 1000, true)));
	h.chat.insert("dc", Ok(IdentityRecord::chat("alice#1234")));

	let mut first = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut first, "gh").await.unwrap();
	h.workflow.verify_chat(&mut first, "dc").await.unwrap();
	assert_eq!(h.grants.call_count(), 1);

	let mut second = h.workflow.start_session().await.unwrap();
	let state = h.workflow.verify_code_host(&mut second, "gh").await.unwrap();
	assert_eq!(state, WorkflowState::AlreadyLinked);

	// A terminal session cannot reach the chat step.
	let err = h.workflow.verify_chat(&mut second, "dc").await.unwrap_err();
	assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
	assert_eq!(h.grants.call_count(), 1);
}

#[tokio::test]
async fn membership_below_minimum_is_insufficient_and_leaves_linkage() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("bob", 0, false)));
	h.membership.insert("pt", Ok(membership_patron("p-77", 200, true)));

	let mut session = h.workflow.start_session().await.unwrap();
	let state = h.workflow.verify_code_host(&mut session, "gh").await.unwrap();
	assert_eq!(state, WorkflowState::IneligibleRequireMembership);

	let state = h.workflow.verify_membership(&mut session, "pt").await.unwrap();
	assert_eq!(state, WorkflowState::InsufficientTier);

	let linkage = h
		.linkages()
		.find_by_identity(Provider::CodeHost, "bob")
		.await
		.unwrap()
		.unwrap();
	assert_eq!(linkage.membership_username, None);

	let sponsor = SponsorRepository::new(h.pool.clone())
		.get_sponsor(Provider::Membership, "p-77")
		.await
		.unwrap()
		.unwrap();
	assert_eq!(sponsor.active_tier_amount, 200);
	assert_eq!(h.grants.call_count(), 0);
}

#[tokio::test]
async fn inactive_patron_is_not_sponsor() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("bob", 0, false)));
	h.membership.insert("pt", Ok(membership_patron("p-1", 0, false)));

	let mut session = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut session, "gh").await.unwrap();
	let state = h.workflow.verify_membership(&mut session, "pt").await.unwrap();
	assert_eq!(state, WorkflowState::NotSponsor);
}

#[tokio::test]
async fn membership_path_links_all_three_identities() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("carol", 100, true)));
	h.membership.insert("pt", Ok(membership_patron("p-5", 500, true)));
	h.chat.insert("dc", Ok(IdentityRecord::chat("carol")));

	let mut session = h.workflow.start_session().await.unwrap();
	assert_eq!(
		h.workflow.verify_code_host(&mut session, "gh").await.unwrap(),
		WorkflowState::IneligibleRequireMembership
	);
	assert_eq!(
		h.workflow.verify_membership(&mut session, "pt").await.unwrap(),
		WorkflowState::MembershipVerified
	);
	assert_eq!(
		h.workflow.verify_chat(&mut session, "dc").await.unwrap(),
		WorkflowState::Granted
	);

	let linkage = h
		.linkages()
		.find_by_identity_pair(Some("carol"), Some("p-5"))
		.await
		.unwrap()
		.unwrap();
	assert_eq!(linkage.chat_username.as_deref(), Some("carol"));
	assert_eq!(h.grants.calls(), vec!["carol".to_string()]);
}

#[tokio::test]
async fn membership_already_used_by_another_linkage_is_already_linked() {
	let h = Harness::new().await;
	h.code_host.insert("gh-a", Ok(code_host_sponsor("dan", 0, false)));
	h.code_host.insert("gh-b", Ok(code_host_sponsor("dan-alt", 0, false)));
	h.membership.insert("pt", Ok(membership_patron("p-9", 900, true)));

	let mut first = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut first, "gh-a").await.unwrap();
	assert_eq!(
		h.workflow.verify_membership(&mut first, "pt").await.unwrap(),
		WorkflowState::MembershipVerified
	);

	let mut second = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut second, "gh-b").await.unwrap();
	assert_eq!(
		h.workflow.verify_membership(&mut second, "pt").await.unwrap(),
		WorkflowState::AlreadyLinked
	);
	assert_eq!(second.linkage_id, None);
	assert_eq!(h.stored(&second).await.linkage_id, None);
}

#[tokio::test]
async fn membership_from_abandoned_session_can_be_linked_again() {
	let h = Harness::new().await;
	h.code_host.insert("gh-typo", Ok(code_host_sponsor("dan-typo", 0, false)));
	h.code_host.insert("gh", Ok(code_host_sponsor("dan", 0, false)));
	h.membership.insert("pt", Ok(membership_patron("p-9", 900, true)));
	h.chat.insert("dc-bad", Err("discord is down".to_string()));
	h.chat.insert("dc", Ok(IdentityRecord::chat("dan#0001")));

	let mut first = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut first, "gh-typo").await.unwrap();
	assert_eq!(
		h.workflow.verify_membership(&mut first, "pt").await.unwrap(),
		WorkflowState::MembershipVerified
	);
	let abandoned = first.linkage_id.unwrap();
	h.workflow.verify_chat(&mut first, "dc-bad").await.unwrap_err();
	assert_eq!(first.state, WorkflowState::Start);

	let mut second = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut second, "gh").await.unwrap();
	assert_eq!(
		h.workflow.verify_membership(&mut second, "pt").await.unwrap(),
		WorkflowState::MembershipVerified
	);
	assert_eq!(
		h.workflow.verify_chat(&mut second, "dc").await.unwrap(),
		WorkflowState::Granted
	);
	assert_eq!(h.grants.calls(), vec!["dan".to_string()]);

	let linkage = h
		.linkages()
		.find_by_identity_pair(Some("dan"), Some("p-9"))
		.await
		.unwrap()
		.unwrap();
	assert!(linkage.is_complete());
	let abandoned = h.linkages().get_linkage(abandoned).await.unwrap().unwrap();
	assert_eq!(abandoned.membership_username, None);
}

#[tokio::test]
async fn membership_of_granted_linkage_is_not_released() {
	let h = Harness::new().await;
	h.code_host.insert("gh-a", Ok(code_host_sponsor("gus", 0, false)));
	h.code_host.insert("gh-b", Ok(code_host_sponsor("gus-alt", 0, false)));
	h.membership.insert("pt", Ok(membership_patron("p-3", 900, true)));
	h.chat.insert("dc", Ok(IdentityRecord::chat("gus")));

	let mut first = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut first, "gh-a").await.unwrap();
	h.workflow.verify_membership(&mut first, "pt").await.unwrap();
	assert_eq!(
		h.workflow.verify_chat(&mut first, "dc").await.unwrap(),
		WorkflowState::Granted
	);

	let mut second = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut second, "gh-b").await.unwrap();
	assert_eq!(
		h.workflow.verify_membership(&mut second, "pt").await.unwrap(),
		WorkflowState::AlreadyLinked
	);
	assert_eq!(h.grants.call_count(), 1);
}

#[tokio::test]
async fn failed_grant_keeps_session_for_retry() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("erin", 1000, true)));
	h.chat.insert("dc", Ok(IdentityRecord::chat("erin")));
	h.grants
		.set_failure(Some(GrantFailed::new(Some(502), "Bad Gateway")));

	let mut session = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut session, "gh").await.unwrap();

	let err = h.workflow.verify_chat(&mut session, "dc").await.unwrap_err();
	assert!(err.is_retryable());
	assert_eq!(session.state, WorkflowState::ChatLinked);

	let stored = h.stored(&session).await;
	assert_eq!(stored.state, WorkflowState::ChatLinked);
	assert_eq!(stored.pending_chat_username.as_deref(), Some("erin"));

	let linkage = h.linkages().get_linkage(session.linkage_id.unwrap()).await.unwrap().unwrap();
	assert!(!linkage.is_complete());

	h.grants.set_failure(None);
	let mut reloaded = stored;
	let state = h.workflow.complete_grant(&mut reloaded).await.unwrap();
	assert_eq!(state, WorkflowState::Granted);
	assert_eq!(h.grants.call_count(), 2);
}

#[tokio::test]
async fn verification_error_resets_session() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("fay", 1000, true)));
	h.chat.insert("dc-bad", Err("discord is down".to_string()));

	let mut session = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut session, "gh").await.unwrap();

	let err = h.workflow.verify_chat(&mut session, "dc-bad").await.unwrap_err();
	assert!(matches!(err, WorkflowError::Verification(_)));
	assert_eq!(session.state, WorkflowState::Start);
	assert_eq!(session.linkage_id, None);

	let stored = h.stored(&session).await;
	assert_eq!(stored.state, WorkflowState::Start);
	assert_eq!(h.grants.call_count(), 0);
}

#[tokio::test]
async fn unknown_code_is_a_verification_error() {
	let h = Harness::new().await;
	let mut session = h.workflow.start_session().await.unwrap();

	let err = h
		.workflow
		.verify_code_host(&mut session, "never-issued")
		.await
		.unwrap_err();
	assert!(matches!(err, WorkflowError::Verification(_)));
	assert_eq!(session.state, WorkflowState::Start);
}

#[tokio::test]
async fn out_of_order_steps_leave_session_unchanged() {
	let h = Harness::new().await;
	h.membership.insert("pt", Ok(membership_patron("p-1", 900, true)));

	let mut session = h.workflow.start_session().await.unwrap();
	let before = session.clone();

	let err = h.workflow.verify_membership(&mut session, "pt").await.unwrap_err();
	assert!(matches!(
		err,
		WorkflowError::InvalidTransition {
			state: WorkflowState::Start,
			..
		}
	));
	assert_eq!(session, before);

	let err = h.workflow.complete_grant(&mut session).await.unwrap_err();
	assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn eligible_code_host_sponsor_skips_membership() {
	let h = Harness::with_min_tier(100).await;
	h.code_host.insert("gh", Ok(code_host_sponsor("gus", 100, true)));
	h.membership.insert("pt", Ok(membership_patron("p-2", 900, true)));

	let mut session = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut session, "gh").await.unwrap();

	let err = h.workflow.verify_membership(&mut session, "pt").await.unwrap_err();
	assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn code_host_sign_in_restarts_an_incomplete_linkage() {
	let h = Harness::new().await;
	h.code_host.insert("gh", Ok(code_host_sponsor("hal", 1000, true)));

	let mut first = h.workflow.start_session().await.unwrap();
	h.workflow.verify_code_host(&mut first, "gh").await.unwrap();

	let mut second = h.workflow.start_session().await.unwrap();
	let state = h.workflow.verify_code_host(&mut second, "gh").await.unwrap();

	assert_eq!(state, WorkflowState::EligibleForChat);
	assert_eq!(second.linkage_id, first.linkage_id);
}

#[tokio::test]
async fn expired_sessions_are_not_loaded() {
	let h = Harness::new().await;
	let session = h.workflow.start_session().await.unwrap();

	let later = Utc::now() + Duration::hours(2);
	assert!(h.workflow.load_session(session.id, later).await.unwrap().is_none());
	assert!(h
		.workflow
		.load_session(session.id, Utc::now())
		.await
		.unwrap()
		.is_some());
}
