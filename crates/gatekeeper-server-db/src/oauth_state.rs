// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted OAuth `state` parameters.
//!
//! A state is issued for one session and one provider and can be consumed
//! exactly once: consumption is a single `DELETE ... RETURNING`, so two
//! concurrent callbacks carrying the same state cannot both succeed.

use chrono::{DateTime, Duration, Utc};
use gatekeeper_linking_core::{LinkSessionId, Provider};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::time::{format_ts, parse_ts};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStateEntry {
	pub session_id: LinkSessionId,
	pub provider: Provider,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OAuthStateRepository {
	pool: SqlitePool,
}

impl OAuthStateRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, state), fields(session_id = %session_id, provider = %provider))]
	pub async fn store(
		&self,
		state: &str,
		session_id: LinkSessionId,
		provider: Provider,
		ttl: Duration,
	) -> Result<(), DbError> {
		let now = Utc::now();
		sqlx::query(
			r#"
			INSERT INTO oauth_states (state, session_id, provider, created_at, expires_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(state)
		.bind(session_id.to_string())
		.bind(provider.slug())
		.bind(format_ts(now))
		.bind(format_ts(now + ttl))
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::from_write(e, || "OAuth state already issued".to_string()))?;

		tracing::debug!("stored OAuth state");
		Ok(())
	}

	/// Remove `state` and return it if it was issued for `expected_provider`
	/// and has not expired. The row is removed even when validation fails.
	#[tracing::instrument(skip(self, state), fields(provider = %expected_provider))]
	pub async fn consume(
		&self,
		state: &str,
		expected_provider: Provider,
	) -> Result<Option<OAuthStateEntry>, DbError> {
		let row = sqlx::query(
			r#"
			DELETE FROM oauth_states
			WHERE state = ?
			RETURNING session_id, provider, created_at, expires_at
			"#,
		)
		.bind(state)
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			tracing::warn!("OAuth state not found or already used");
			return Ok(None);
		};
		let entry = row_to_entry(&row)?;

		if entry.expires_at <= Utc::now() {
			tracing::warn!(session_id = %entry.session_id, "OAuth state expired");
			return Ok(None);
		}
		if entry.provider != expected_provider {
			tracing::warn!(
				issued_for = %entry.provider,
				"OAuth state presented to the wrong provider callback"
			);
			return Ok(None);
		}

		Ok(Some(entry))
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at <= ?")
			.bind(format_ts(now))
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<OAuthStateEntry, DbError> {
	let session_id: String = row.get("session_id");
	let provider: String = row.get("provider");
	let created_at: String = row.get("created_at");
	let expires_at: String = row.get("expires_at");

	Ok(OAuthStateEntry {
		session_id: session_id
			.parse()
			.map_err(|e: uuid::Error| DbError::Internal(e.to_string()))?,
		provider: provider
			.parse()
			.map_err(|e: gatekeeper_linking_core::UnknownProvider| DbError::Internal(e.to_string()))?,
		created_at: parse_ts(&created_at)?,
		expires_at: parse_ts(&expires_at)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	async fn make_repo() -> OAuthStateRepository {
		OAuthStateRepository::new(crate::testing::create_migrated_test_pool().await)
	}

	#[tokio::test]
	async fn state_is_single_use() {
		let repo = make_repo().await;
		let session = LinkSessionId::new();
		repo.store("state-1", session, Provider::CodeHost, Duration::minutes(10))
			.await
			.unwrap();

		let entry = repo
			.consume("state-1", Provider::CodeHost)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(entry.session_id, session);
		assert_eq!(entry.provider, Provider::CodeHost);

		assert!(repo
			.consume("state-1", Provider::CodeHost)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn state_is_bound_to_its_provider() {
		let repo = make_repo().await;
		repo.store("state-2", LinkSessionId::new(), Provider::Membership, Duration::minutes(10))
			.await
			.unwrap();

		assert!(repo
			.consume("state-2", Provider::Chat)
			.await
			.unwrap()
			.is_none());
		// A mismatched attempt burns the state.
		assert!(repo
			.consume("state-2", Provider::Membership)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn expired_state_is_rejected() {
		let repo = make_repo().await;
		repo.store("state-3", LinkSessionId::new(), Provider::Chat, Duration::seconds(-1))
			.await
			.unwrap();
		assert!(repo
			.consume("state-3", Provider::Chat)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn unknown_state_is_rejected() {
		let repo = make_repo().await;
		assert!(repo
			.consume("never-issued", Provider::CodeHost)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn cleanup_removes_only_expired_states() {
		let repo = make_repo().await;
		repo.store("live", LinkSessionId::new(), Provider::CodeHost, Duration::minutes(10))
			.await
			.unwrap();
		repo.store("dead", LinkSessionId::new(), Provider::CodeHost, Duration::seconds(-5))
			.await
			.unwrap();

		assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 1);
		assert!(repo
			.consume("live", Provider::CodeHost)
			.await
			.unwrap()
			.is_some());
	}

	#[tokio::test]
	async fn reissuing_the_same_state_conflicts() {
		let repo = make_repo().await;
		let session = LinkSessionId::new();
		repo.store("dup", session, Provider::CodeHost, Duration::minutes(10))
			.await
			.unwrap();
		let err = repo
			.store("dup", session, Provider::CodeHost, Duration::minutes(10))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}
}
