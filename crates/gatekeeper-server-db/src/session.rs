// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatekeeper_linking_core::{LinkSession, LinkSessionId, LinkSessionStore, StoreError};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::time::{format_ts, parse_ts};

#[derive(Clone)]
pub struct LinkSessionRepository {
	pool: SqlitePool,
}

impl LinkSessionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(session_id = %id))]
	pub async fn get_session(&self, id: LinkSessionId) -> Result<Option<LinkSession>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, state, linkage_id, pending_chat_username, created_at, updated_at, expires_at
			FROM link_sessions
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_session(&r)).transpose()
	}

	#[tracing::instrument(skip(self, session), fields(session_id = %session.id, state = %session.state))]
	pub async fn save_session(&self, session: &LinkSession) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO link_sessions (id, state, linkage_id, pending_chat_username, created_at, updated_at, expires_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT (id) DO UPDATE SET
				state = excluded.state,
				linkage_id = excluded.linkage_id,
				pending_chat_username = excluded.pending_chat_username,
				updated_at = excluded.updated_at,
				expires_at = excluded.expires_at
			"#,
		)
		.bind(session.id.to_string())
		.bind(session.state.as_str())
		.bind(session.linkage_id.map(|id| id.to_string()))
		.bind(&session.pending_chat_username)
		.bind(format_ts(session.created_at))
		.bind(format_ts(session.updated_at))
		.bind(format_ts(session.expires_at))
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Remove sessions whose expiry is at or before `now`.
	#[tracing::instrument(skip(self))]
	pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM link_sessions WHERE expires_at <= ?")
			.bind(format_ts(now))
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}
}

#[async_trait]
impl LinkSessionStore for LinkSessionRepository {
	async fn get_session(&self, id: LinkSessionId) -> Result<Option<LinkSession>, StoreError> {
		Ok(LinkSessionRepository::get_session(self, id).await?)
	}

	async fn save_session(&self, session: &LinkSession) -> Result<(), StoreError> {
		Ok(LinkSessionRepository::save_session(self, session).await?)
	}
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<LinkSession, DbError> {
	let id: String = row.get("id");
	let state: String = row.get("state");
	let linkage_id: Option<String> = row.get("linkage_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let expires_at: String = row.get("expires_at");

	Ok(LinkSession {
		id: id
			.parse()
			.map_err(|e: uuid::Error| DbError::Internal(e.to_string()))?,
		state: state
			.parse()
			.map_err(|e: gatekeeper_linking_core::session::UnknownWorkflowState| {
				DbError::Internal(e.to_string())
			})?,
		linkage_id: linkage_id
			.map(|s| s.parse())
			.transpose()
			.map_err(|e: uuid::Error| DbError::Internal(e.to_string()))?,
		pending_chat_username: row.get("pending_chat_username"),
		created_at: parse_ts(&created_at)?,
		updated_at: parse_ts(&updated_at)?,
		expires_at: parse_ts(&expires_at)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use gatekeeper_linking_core::WorkflowState;

	async fn make_repo() -> LinkSessionRepository {
		LinkSessionRepository::new(crate::testing::create_migrated_test_pool().await)
	}

	#[tokio::test]
	async fn save_then_load_round_trips_progress() {
		let repo = make_repo().await;
		let linkages = crate::LinkageRepository::new(repo.pool.clone());
		let linkage = linkages.create_linkage("alice").await.unwrap();

		let mut session = LinkSession::new(Duration::hours(1));
		repo.save_session(&session).await.unwrap();

		session.linkage_id = Some(linkage.id);
		session.pending_chat_username = Some("alice#1234".to_string());
		session.transition(WorkflowState::ChatLinked);
		repo.save_session(&session).await.unwrap();

		let loaded = repo.get_session(session.id).await.unwrap().unwrap();
		assert_eq!(loaded.state, WorkflowState::ChatLinked);
		assert_eq!(loaded.linkage_id, Some(linkage.id));
		assert_eq!(loaded.pending_chat_username.as_deref(), Some("alice#1234"));
	}

	#[tokio::test]
	async fn expired_sessions_are_deleted() {
		let repo = make_repo().await;
		let fresh = LinkSession::new(Duration::hours(1));
		let stale = LinkSession::new(Duration::seconds(-1));
		repo.save_session(&fresh).await.unwrap();
		repo.save_session(&stale).await.unwrap();

		let removed = repo.delete_expired(Utc::now()).await.unwrap();
		assert_eq!(removed, 1);
		assert!(repo.get_session(fresh.id).await.unwrap().is_some());
		assert!(repo.get_session(stale.id).await.unwrap().is_none());
	}
}
