// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence seams used by the linking workflow.
//!
//! Implementations must make every write a single atomic statement. In
//! particular, uniqueness of linked identities is enforced by the store
//! itself and reported as [`StoreError::Conflict`], never by a read followed
//! by a write in the caller.

use async_trait::async_trait;

use crate::identity::IdentityRecord;
use crate::provider::Provider;
use crate::records::{ChatAccount, LinkageId, LinkageRecord, SponsorRecord};
use crate::session::{LinkSession, LinkSessionId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// A uniqueness rule rejected the write, or the linkage is already
	/// complete and can no longer be changed.
	#[error("conflict: {0}")]
	Conflict(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("storage backend error: {0}")]
	Backend(String),
}

#[async_trait]
pub trait SponsorStore: Send + Sync {
	/// Insert or refresh the sponsor row for `identity.provider` and
	/// `identity.external_id`, returning the stored row.
	async fn upsert_sponsor(&self, identity: &IdentityRecord) -> Result<SponsorRecord, StoreError>;

	async fn get_sponsor(
		&self,
		provider: Provider,
		username: &str,
	) -> Result<Option<SponsorRecord>, StoreError>;
}

#[async_trait]
pub trait ChatAccountStore: Send + Sync {
	async fn upsert_chat_account(&self, username: &str) -> Result<ChatAccount, StoreError>;

	async fn get_chat_account(&self, username: &str) -> Result<Option<ChatAccount>, StoreError>;
}

#[async_trait]
pub trait LinkageStore: Send + Sync {
	/// Null-safe lookup on the pair: `None` matches a null column.
	async fn find_by_identity_pair(
		&self,
		code_host_username: Option<&str>,
		membership_username: Option<&str>,
	) -> Result<Option<LinkageRecord>, StoreError>;

	async fn find_by_identity(
		&self,
		provider: Provider,
		username: &str,
	) -> Result<Option<LinkageRecord>, StoreError>;

	async fn get_linkage(&self, id: LinkageId) -> Result<Option<LinkageRecord>, StoreError>;

	/// Create a linkage that claims `code_host_username`. Fails with
	/// `Conflict` if another linkage already holds it.
	async fn create_linkage(&self, code_host_username: &str) -> Result<LinkageRecord, StoreError>;

	/// Set one identity column on an incomplete linkage. Fails with
	/// `Conflict` when the username is held by another linkage or the
	/// linkage is already complete, and `NotFound` for an unknown id.
	async fn upsert_step(
		&self,
		id: LinkageId,
		provider: Provider,
		username: &str,
	) -> Result<LinkageRecord, StoreError>;

	/// Clear `membership_username` from the incomplete linkage holding it,
	/// unless a live session is still past the membership step on that
	/// linkage. Returns whether a claim was released.
	async fn release_membership(&self, membership_username: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait LinkSessionStore: Send + Sync {
	async fn get_session(&self, id: LinkSessionId) -> Result<Option<LinkSession>, StoreError>;

	/// Insert or overwrite the session row.
	async fn save_session(&self, session: &LinkSession) -> Result<(), StoreError>;
}
