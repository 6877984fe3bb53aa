// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gatekeeper_linking_core::{
	evaluate, ChatAccountStore, Eligibility, EligibilityPolicy, GrantExecutor, LinkSession,
	LinkSessionId, LinkSessionStore, LinkageRecord, LinkageStore, Provider, ProviderAdapter,
	SponsorStore, StoreError, WorkflowState, WorkflowStep,
};
use tracing::{debug, info, instrument, warn};

use crate::error::WorkflowError;

type Result<T> = std::result::Result<T, WorkflowError>;

/// Persistence the workflow reads and writes.
#[derive(Clone)]
pub struct WorkflowStores {
	pub sponsors: Arc<dyn SponsorStore>,
	pub chat_accounts: Arc<dyn ChatAccountStore>,
	pub linkages: Arc<dyn LinkageStore>,
	pub sessions: Arc<dyn LinkSessionStore>,
}

/// One adapter per provider.
#[derive(Clone)]
pub struct ProviderAdapters {
	pub code_host: Arc<dyn ProviderAdapter>,
	pub membership: Arc<dyn ProviderAdapter>,
	pub chat: Arc<dyn ProviderAdapter>,
}

impl ProviderAdapters {
	pub fn get(&self, provider: Provider) -> &dyn ProviderAdapter {
		match provider {
			Provider::CodeHost => self.code_host.as_ref(),
			Provider::Membership => self.membership.as_ref(),
			Provider::Chat => self.chat.as_ref(),
		}
	}
}

#[derive(Clone)]
pub struct LinkingWorkflow {
	stores: WorkflowStores,
	adapters: ProviderAdapters,
	grants: Arc<dyn GrantExecutor>,
	policy: EligibilityPolicy,
	session_ttl: Duration,
}

impl LinkingWorkflow {
	pub fn new(
		stores: WorkflowStores,
		adapters: ProviderAdapters,
		grants: Arc<dyn GrantExecutor>,
		policy: EligibilityPolicy,
		session_ttl: Duration,
	) -> Self {
		Self {
			stores,
			adapters,
			grants,
			policy,
			session_ttl,
		}
	}

	pub fn policy(&self) -> &EligibilityPolicy {
		&self.policy
	}

	pub fn authorization_url(&self, provider: Provider, state: &str) -> String {
		self.adapters.get(provider).authorization_url(state)
	}

	/// Create and persist a fresh session in `Start`.
	#[instrument(skip(self))]
	pub async fn start_session(&self) -> Result<LinkSession> {
		let session = LinkSession::new(self.session_ttl);
		self.stores.sessions.save_session(&session).await?;
		debug!(session_id = %session.id, "link session started");
		Ok(session)
	}

	/// The stored session, unless it is missing or expired.
	pub async fn load_session(
		&self,
		id: LinkSessionId,
		now: DateTime<Utc>,
	) -> Result<Option<LinkSession>> {
		let session = self.stores.sessions.get_session(id).await?;
		Ok(session.filter(|s| !s.is_expired(now)))
	}

	/// Run the step that belongs to `provider`'s callback.
	pub async fn handle_callback(
		&self,
		provider: Provider,
		session: &mut LinkSession,
		code: &str,
	) -> Result<WorkflowState> {
		match provider {
			Provider::CodeHost => self.verify_code_host(session, code).await,
			Provider::Membership => self.verify_membership(session, code).await,
			Provider::Chat => self.verify_chat(session, code).await,
		}
	}

	/// Sign in with the code host. Restarts the session from any state.
	#[instrument(skip(self, session, code), fields(session_id = %session.id))]
	pub async fn verify_code_host(
		&self,
		session: &mut LinkSession,
		code: &str,
	) -> Result<WorkflowState> {
		let step = WorkflowStep::VerifyCodeHost;
		check_transition(step, session)?;
		let result = self.verify_code_host_inner(session, code).await;
		self.persist(step, session, result).await
	}

	#[instrument(skip(self, session, code), fields(session_id = %session.id))]
	pub async fn verify_membership(
		&self,
		session: &mut LinkSession,
		code: &str,
	) -> Result<WorkflowState> {
		let step = WorkflowStep::VerifyMembership;
		check_transition(step, session)?;
		let result = self.verify_membership_inner(session, code).await;
		self.persist(step, session, result).await
	}

	#[instrument(skip(self, session, code), fields(session_id = %session.id))]
	pub async fn verify_chat(&self, session: &mut LinkSession, code: &str) -> Result<WorkflowState> {
		let step = WorkflowStep::VerifyChat;
		check_transition(step, session)?;
		let result = self.verify_chat_inner(session, code).await;
		self.persist(step, session, result).await
	}

	/// Retry the grant for a session left in `ChatLinked`.
	#[instrument(skip(self, session), fields(session_id = %session.id))]
	pub async fn complete_grant(&self, session: &mut LinkSession) -> Result<WorkflowState> {
		let step = WorkflowStep::CompleteGrant;
		check_transition(step, session)?;
		let result = self.complete_grant_inner(session).await;
		self.persist(step, session, result).await
	}

	/// Save the session whatever the step's outcome. A verification failure
	/// resets the session first.
	async fn persist(
		&self,
		step: WorkflowStep,
		session: &mut LinkSession,
		result: Result<WorkflowState>,
	) -> Result<WorkflowState> {
		if let Err(WorkflowError::Verification(e)) = &result {
			warn!(%step, error = %e, "verification failed, session reset");
			session.reset();
		}

		match self.stores.sessions.save_session(session).await {
			Ok(()) => result,
			Err(save_err) => match result {
				Ok(_) => Err(save_err.into()),
				Err(e) => {
					warn!(error = %save_err, "failed to save session after step error");
					Err(e)
				}
			},
		}
	}

	async fn verify_code_host_inner(
		&self,
		session: &mut LinkSession,
		code: &str,
	) -> Result<WorkflowState> {
		let identity = self.adapters.code_host.verify(code).await?;
		let login = identity.external_id.clone();
		self.stores.sponsors.upsert_sponsor(&identity).await?;
		let eligibility = evaluate(&identity, &self.policy);

		let linkage = match self
			.stores
			.linkages
			.find_by_identity(Provider::CodeHost, &login)
			.await?
		{
			Some(existing) if existing.is_complete() => {
				info!(username = %login, linkage_id = %existing.id, "code host identity already linked");
				return Ok(self.finish(session, Some(&existing), WorkflowState::AlreadyLinked));
			}
			Some(existing) => existing,
			None => match self.stores.linkages.create_linkage(&login).await {
				Ok(created) => created,
				Err(StoreError::Conflict(reason)) => {
					info!(username = %login, %reason, "code host identity claimed concurrently");
					return Ok(self.finish(session, None, WorkflowState::AlreadyLinked));
				}
				Err(e) => return Err(e.into()),
			},
		};

		let next = match eligibility {
			Eligibility::Eligible => WorkflowState::EligibleForChat,
			Eligibility::InsufficientTier | Eligibility::NotSponsor => {
				WorkflowState::IneligibleRequireMembership
			}
		};
		info!(username = %login, linkage_id = %linkage.id, ?eligibility, state = %next, "code host verified");
		Ok(self.finish(session, Some(&linkage), next))
	}

	async fn verify_membership_inner(
		&self,
		session: &mut LinkSession,
		code: &str,
	) -> Result<WorkflowState> {
		let identity = self.adapters.membership.verify(code).await?;
		self.stores.sponsors.upsert_sponsor(&identity).await?;

		match evaluate(&identity, &self.policy) {
			Eligibility::NotSponsor => {
				info!(patreon_user_id = %identity.external_id, "not a patron of the campaign");
				session.transition(WorkflowState::NotSponsor);
				return Ok(WorkflowState::NotSponsor);
			}
			Eligibility::InsufficientTier => {
				info!(
					patreon_user_id = %identity.external_id,
					tier_amount = identity.tier_amount,
					min_tier_amount = self.policy.min_tier_amount,
					"patron tier below minimum"
				);
				session.transition(WorkflowState::InsufficientTier);
				return Ok(WorkflowState::InsufficientTier);
			}
			Eligibility::Eligible => {}
		}

		let linkage = self.session_linkage(session).await?;
		if let Some(existing) = self
			.stores
			.linkages
			.find_by_identity_pair(
				linkage.code_host_username.as_deref(),
				Some(&identity.external_id),
			)
			.await?
		{
			if existing.is_complete() {
				return Ok(self.finish(session, Some(&existing), WorkflowState::AlreadyLinked));
			}
		}

		match self.claim_membership(&linkage, &identity.external_id).await? {
			Some(updated) => {
				info!(linkage_id = %updated.id, patreon_user_id = %identity.external_id, "membership linked");
				Ok(self.finish(session, Some(&updated), WorkflowState::MembershipVerified))
			}
			None => Ok(self.finish(session, None, WorkflowState::AlreadyLinked)),
		}
	}

	/// Write the membership identity onto `linkage`. A claim held by an
	/// abandoned linkage is released and the write retried once; `None`
	/// means the identity stays with another linkage.
	async fn claim_membership(
		&self,
		linkage: &LinkageRecord,
		membership_username: &str,
	) -> Result<Option<LinkageRecord>> {
		let linkages = &self.stores.linkages;
		let reason = match linkages
			.upsert_step(linkage.id, Provider::Membership, membership_username)
			.await
		{
			Ok(updated) => return Ok(Some(updated)),
			Err(StoreError::Conflict(reason)) => reason,
			Err(e) => return Err(e.into()),
		};

		if !linkages.release_membership(membership_username).await? {
			info!(linkage_id = %linkage.id, %reason, "membership identity already linked");
			return Ok(None);
		}

		match linkages
			.upsert_step(linkage.id, Provider::Membership, membership_username)
			.await
		{
			Ok(updated) => Ok(Some(updated)),
			Err(StoreError::Conflict(reason)) => {
				info!(linkage_id = %linkage.id, %reason, "membership identity claimed concurrently");
				Ok(None)
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn verify_chat_inner(&self, session: &mut LinkSession, code: &str) -> Result<WorkflowState> {
		let identity = self.adapters.chat.verify(code).await?;
		self.stores
			.chat_accounts
			.upsert_chat_account(&identity.external_id)
			.await?;

		session.pending_chat_username = Some(identity.external_id);
		session.transition(WorkflowState::ChatLinked);
		self.complete_grant_inner(session).await
	}

	async fn complete_grant_inner(&self, session: &mut LinkSession) -> Result<WorkflowState> {
		let linkage = self.session_linkage(session).await?;
		if linkage.is_complete() {
			info!(linkage_id = %linkage.id, "linkage already complete, not granting again");
			return Ok(self.finish(session, Some(&linkage), WorkflowState::AlreadyLinked));
		}

		let code_host_username = linkage
			.code_host_username
			.as_deref()
			.ok_or(WorkflowError::InconsistentSession("linkage has no code host identity"))?;
		let chat_username = session
			.pending_chat_username
			.clone()
			.ok_or(WorkflowError::InconsistentSession("no verified chat identity"))?;

		let grant = match self.grants.grant(code_host_username).await {
			Ok(grant) => grant,
			Err(failed) => {
				warn!(
					linkage_id = %linkage.id,
					username = %code_host_username,
					status = ?failed.status,
					error = %failed.message,
					"grant failed, session kept for retry"
				);
				return Err(failed.into());
			}
		};

		match self
			.stores
			.linkages
			.upsert_step(linkage.id, Provider::Chat, &chat_username)
			.await
		{
			Ok(completed) => {
				info!(
					linkage_id = %completed.id,
					username = %code_host_username,
					chat_username = %chat_username,
					?grant,
					"access granted"
				);
				session.pending_chat_username = None;
				session.transition(WorkflowState::Granted);
				Ok(WorkflowState::Granted)
			}
			Err(StoreError::Conflict(reason)) => {
				info!(linkage_id = %linkage.id, %reason, "linkage completed by another session");
				Ok(self.finish(session, None, WorkflowState::AlreadyLinked))
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn session_linkage(&self, session: &LinkSession) -> Result<LinkageRecord> {
		let id = session
			.linkage_id
			.ok_or(WorkflowError::InconsistentSession("session has no linkage"))?;
		self.stores
			.linkages
			.get_linkage(id)
			.await?
			.ok_or(WorkflowError::InconsistentSession("session linkage no longer exists"))
	}

	fn finish(
		&self,
		session: &mut LinkSession,
		linkage: Option<&LinkageRecord>,
		state: WorkflowState,
	) -> WorkflowState {
		session.linkage_id = linkage.map(|l| l.id);
		session.pending_chat_username = None;
		session.transition(state);
		state
	}
}

fn check_transition(step: WorkflowStep, session: &LinkSession) -> Result<()> {
	if step.allowed_from(session.state) {
		return Ok(());
	}
	warn!(%step, state = %session.state, "step not allowed from current state");
	Err(WorkflowError::InvalidTransition {
		step,
		state: session.state,
	})
}
