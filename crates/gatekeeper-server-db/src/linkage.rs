// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::Utc;
use gatekeeper_linking_core::{LinkageId, LinkageRecord, LinkageStore, Provider, StoreError};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::time::{format_ts, parse_ts};

const LINKAGE_COLUMNS: &str =
	"id, code_host_username, membership_username, chat_username, created_at, updated_at";

fn column_for(provider: Provider) -> &'static str {
	match provider {
		Provider::CodeHost => "code_host_username",
		Provider::Membership => "membership_username",
		Provider::Chat => "chat_username",
	}
}

#[derive(Clone)]
pub struct LinkageRepository {
	pool: SqlitePool,
}

impl LinkageRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self))]
	pub async fn find_by_identity_pair(
		&self,
		code_host_username: Option<&str>,
		membership_username: Option<&str>,
	) -> Result<Option<LinkageRecord>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {LINKAGE_COLUMNS} FROM linkages \
			 WHERE code_host_username IS ? AND membership_username IS ?"
		))
		.bind(code_host_username)
		.bind(membership_username)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_linkage(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(provider = %provider, username = %username))]
	pub async fn find_by_identity(
		&self,
		provider: Provider,
		username: &str,
	) -> Result<Option<LinkageRecord>, DbError> {
		let column = column_for(provider);
		let row = sqlx::query(&format!(
			"SELECT {LINKAGE_COLUMNS} FROM linkages WHERE {column} = ? \
			 ORDER BY chat_username IS NULL, created_at ASC LIMIT 1"
		))
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_linkage(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(linkage_id = %id))]
	pub async fn get_linkage(&self, id: LinkageId) -> Result<Option<LinkageRecord>, DbError> {
		let row = sqlx::query(&format!("SELECT {LINKAGE_COLUMNS} FROM linkages WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_linkage(&r)).transpose()
	}

	/// Generate an id and claim `code_host_username` in a single insert. If
	/// another linkage holds the username the insert fails as a whole.
	#[tracing::instrument(skip(self), fields(code_host_username = %code_host_username))]
	pub async fn create_linkage(&self, code_host_username: &str) -> Result<LinkageRecord, DbError> {
		let id = LinkageId::new();
		let now = format_ts(Utc::now());

		let row = sqlx::query(&format!(
			r#"
			INSERT INTO linkages (id, code_host_username, created_at, updated_at)
			VALUES (?, ?, ?, ?)
			RETURNING {LINKAGE_COLUMNS}
			"#
		))
		.bind(id.to_string())
		.bind(code_host_username)
		.bind(&now)
		.bind(&now)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| {
			DbError::from_write(e, || {
				format!("GitHub account {code_host_username} is already linked")
			})
		})?;

		let record = row_to_linkage(&row)?;
		tracing::info!(linkage_id = %record.id, "linkage created");
		Ok(record)
	}

	/// Write one identity column of an incomplete linkage.
	///
	/// The `chat_username IS NULL` guard makes completed linkages immutable
	/// without a separate read: a zero-row update on an existing id means the
	/// linkage was already complete.
	#[tracing::instrument(skip(self), fields(linkage_id = %id, provider = %provider, username = %username))]
	pub async fn upsert_step(
		&self,
		id: LinkageId,
		provider: Provider,
		username: &str,
	) -> Result<LinkageRecord, DbError> {
		let column = column_for(provider);
		let now = format_ts(Utc::now());

		let row = sqlx::query(&format!(
			r#"
			UPDATE linkages SET {column} = ?, updated_at = ?
			WHERE id = ? AND chat_username IS NULL
			RETURNING {LINKAGE_COLUMNS}
			"#
		))
		.bind(username)
		.bind(&now)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| {
			DbError::from_write(e, || {
				format!("{provider} account {username} is already linked elsewhere")
			})
		})?;

		match row {
			Some(row) => {
				let record = row_to_linkage(&row)?;
				tracing::info!(linkage_id = %record.id, column, complete = record.is_complete(), "linkage updated");
				Ok(record)
			}
			None => match self.get_linkage(id).await? {
				Some(_) => Err(DbError::Conflict(format!("linkage {id} is already complete"))),
				None => Err(DbError::NotFound(format!("linkage {id}"))),
			},
		}
	}

	/// Free a membership identity held by an abandoned linkage.
	///
	/// Complete linkages keep their claim. So does a linkage that an
	/// unexpired session has carried to `membership_verified` or
	/// `chat_linked`, since that session may still be granted.
	#[tracing::instrument(skip(self), fields(membership_username = %membership_username))]
	pub async fn release_membership(&self, membership_username: &str) -> Result<bool, DbError> {
		let now = format_ts(Utc::now());

		let result = sqlx::query(
			r#"
			UPDATE linkages SET membership_username = NULL, updated_at = ?1
			WHERE membership_username = ?2
				AND chat_username IS NULL
				AND NOT EXISTS (
					SELECT 1 FROM link_sessions s
					WHERE s.linkage_id = linkages.id
						AND s.state IN ('membership_verified', 'chat_linked')
						AND s.expires_at > ?1
				)
			"#,
		)
		.bind(&now)
		.bind(membership_username)
		.execute(&self.pool)
		.await?;

		let released = result.rows_affected() > 0;
		if released {
			tracing::info!("abandoned membership claim released");
		}
		Ok(released)
	}
}

#[async_trait]
impl LinkageStore for LinkageRepository {
	async fn find_by_identity_pair(
		&self,
		code_host_username: Option<&str>,
		membership_username: Option<&str>,
	) -> Result<Option<LinkageRecord>, StoreError> {
		Ok(
			LinkageRepository::find_by_identity_pair(self, code_host_username, membership_username)
				.await?,
		)
	}

	async fn find_by_identity(
		&self,
		provider: Provider,
		username: &str,
	) -> Result<Option<LinkageRecord>, StoreError> {
		Ok(LinkageRepository::find_by_identity(self, provider, username).await?)
	}

	async fn get_linkage(&self, id: LinkageId) -> Result<Option<LinkageRecord>, StoreError> {
		Ok(LinkageRepository::get_linkage(self, id).await?)
	}

	async fn create_linkage(&self, code_host_username: &str) -> Result<LinkageRecord, StoreError> {
		Ok(LinkageRepository::create_linkage(self, code_host_username).await?)
	}

	async fn upsert_step(
		&self,
		id: LinkageId,
		provider: Provider,
		username: &str,
	) -> Result<LinkageRecord, StoreError> {
		Ok(LinkageRepository::upsert_step(self, id, provider, username).await?)
	}

	async fn release_membership(&self, membership_username: &str) -> Result<bool, StoreError> {
		Ok(LinkageRepository::release_membership(self, membership_username).await?)
	}
}

fn row_to_linkage(row: &sqlx::sqlite::SqliteRow) -> Result<LinkageRecord, DbError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(LinkageRecord {
		id: id.parse().map_err(|e: uuid::Error| DbError::Internal(e.to_string()))?,
		code_host_username: row.get("code_host_username"),
		membership_username: row.get("membership_username"),
		chat_username: row.get("chat_username"),
		created_at: parse_ts(&created_at)?,
		updated_at: parse_ts(&updated_at)?,
	})
}
