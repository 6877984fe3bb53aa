// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::Utc;
use gatekeeper_linking_core::{ChatAccount, ChatAccountStore, StoreError};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::time::{format_ts, parse_ts};

#[derive(Clone)]
pub struct ChatAccountRepository {
	pool: SqlitePool,
}

impl ChatAccountRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(username = %username))]
	pub async fn upsert_chat_account(&self, username: &str) -> Result<ChatAccount, DbError> {
		let now = format_ts(Utc::now());
		let row = sqlx::query(
			r#"
			INSERT INTO chat_accounts (username, created_at, updated_at)
			VALUES (?, ?, ?)
			ON CONFLICT (username) DO UPDATE SET updated_at = excluded.updated_at
			RETURNING username, created_at, updated_at
			"#,
		)
		.bind(username)
		.bind(&now)
		.bind(&now)
		.fetch_one(&self.pool)
		.await?;

		row_to_chat_account(&row)
	}

	#[tracing::instrument(skip(self), fields(username = %username))]
	pub async fn get_chat_account(&self, username: &str) -> Result<Option<ChatAccount>, DbError> {
		let row = sqlx::query(
			"SELECT username, created_at, updated_at FROM chat_accounts WHERE username = ?",
		)
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_chat_account(&r)).transpose()
	}
}

#[async_trait]
impl ChatAccountStore for ChatAccountRepository {
	async fn upsert_chat_account(&self, username: &str) -> Result<ChatAccount, StoreError> {
		Ok(ChatAccountRepository::upsert_chat_account(self, username).await?)
	}

	async fn get_chat_account(&self, username: &str) -> Result<Option<ChatAccount>, StoreError> {
		Ok(ChatAccountRepository::get_chat_account(self, username).await?)
	}
}

fn row_to_chat_account(row: &sqlx::sqlite::SqliteRow) -> Result<ChatAccount, DbError> {
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	Ok(ChatAccount {
		username: row.get("username"),
		created_at: parse_ts(&created_at)?,
		updated_at: parse_ts(&updated_at)?,
	})
}
