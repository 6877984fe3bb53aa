// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::Utc;
use gatekeeper_linking_core::{IdentityRecord, Provider, SponsorRecord, SponsorStore, StoreError};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::time::{format_ts, from_db_amount, parse_opt_ts, parse_ts, to_db_amount};

const SPONSOR_COLUMNS: &str = "provider, username, email, active_tier_amount, lifetime_payments, \
	sponsorship_start, sponsorship_end, created_at, updated_at";

#[derive(Clone)]
pub struct SponsorRepository {
	pool: SqlitePool,
}

impl SponsorRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert or refresh a sponsor in one statement.
	///
	/// - tier, lifetime and end are always taken from `identity`
	/// - email is only replaced when the provider returned one
	/// - start prefers the provider's date, then the stored one, then now
	///   (only when active)
	/// - end is NULL while active; the first inactive refresh stamps it and
	///   later inactive refreshes keep that first stamp
	/// - `created_at` is never touched, `updated_at` always is
	#[tracing::instrument(
		skip(self, identity),
		fields(provider = %identity.provider, username = %identity.external_id, tier = identity.tier_amount, active = identity.active)
	)]
	pub async fn upsert_sponsor(&self, identity: &IdentityRecord) -> Result<SponsorRecord, DbError> {
		if identity.provider == Provider::Chat {
			return Err(DbError::Internal(
				"chat identities are stored as chat accounts".to_string(),
			));
		}

		let now = format_ts(Utc::now());
		let provider_start = identity.sponsorship_started_at.map(format_ts);
		let insert_start = provider_start
			.clone()
			.or_else(|| identity.active.then(|| now.clone()));
		let insert_end = (!identity.active).then(|| now.clone());

		let row = sqlx::query(&format!(
			r#"
			INSERT INTO sponsors (provider, username, email, active_tier_amount, lifetime_payments,
				sponsorship_start, sponsorship_end, created_at, updated_at)
			VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
			ON CONFLICT (provider, username) DO UPDATE SET
				email = COALESCE(excluded.email, sponsors.email),
				active_tier_amount = excluded.active_tier_amount,
				lifetime_payments = excluded.lifetime_payments,
				sponsorship_start = COALESCE(?9, sponsors.sponsorship_start, excluded.sponsorship_start),
				sponsorship_end = CASE
					WHEN excluded.sponsorship_end IS NULL THEN NULL
					ELSE COALESCE(sponsors.sponsorship_end, excluded.sponsorship_end)
				END,
				updated_at = excluded.updated_at
			RETURNING {SPONSOR_COLUMNS}
			"#
		))
		.bind(identity.provider.slug())
		.bind(&identity.external_id)
		.bind(&identity.email)
		.bind(to_db_amount(identity.tier_amount)?)
		.bind(to_db_amount(identity.lifetime_amount)?)
		.bind(insert_start)
		.bind(insert_end)
		.bind(&now)
		.bind(provider_start)
		.fetch_one(&self.pool)
		.await?;

		let record = row_to_sponsor(&row)?;
		tracing::info!(
			provider = %record.provider,
			username = %record.username,
			active_tier_amount = record.active_tier_amount,
			"sponsor record refreshed"
		);
		Ok(record)
	}

	#[tracing::instrument(skip(self), fields(provider = %provider, username = %username))]
	pub async fn get_sponsor(
		&self,
		provider: Provider,
		username: &str,
	) -> Result<Option<SponsorRecord>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {SPONSOR_COLUMNS} FROM sponsors WHERE provider = ? AND username = ?"
		))
		.bind(provider.slug())
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_sponsor(&r)).transpose()
	}
}

#[async_trait]
impl SponsorStore for SponsorRepository {
	async fn upsert_sponsor(&self, identity: &IdentityRecord) -> Result<SponsorRecord, StoreError> {
		Ok(SponsorRepository::upsert_sponsor(self, identity).await?)
	}

	async fn get_sponsor(
		&self,
		provider: Provider,
		username: &str,
	) -> Result<Option<SponsorRecord>, StoreError> {
		Ok(SponsorRepository::get_sponsor(self, provider, username).await?)
	}
}

fn row_to_sponsor(row: &sqlx::sqlite::SqliteRow) -> Result<SponsorRecord, DbError> {
	let provider: String = row.get("provider");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(SponsorRecord {
		provider: provider
			.parse()
			.map_err(|e: gatekeeper_linking_core::UnknownProvider| DbError::Internal(e.to_string()))?,
		username: row.get("username"),
		email: row.get("email"),
		active_tier_amount: from_db_amount(row.get("active_tier_amount"))?,
		lifetime_payments: from_db_amount(row.get("lifetime_payments"))?,
		sponsorship_start: parse_opt_ts(row.get("sponsorship_start"))?,
		sponsorship_end: parse_opt_ts(row.get("sponsorship_end"))?,
		created_at: parse_ts(&created_at)?,
		updated_at: parse_ts(&updated_at)?,
	})
}
