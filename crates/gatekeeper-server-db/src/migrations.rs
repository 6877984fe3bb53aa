// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	("001_sponsors", include_str!("../migrations/001_sponsors.sql")),
	("002_linkages", include_str!("../migrations/002_linkages.sql")),
	("003_link_sessions", include_str!("../migrations/003_link_sessions.sql")),
];

/// Run all migrations. Every statement is `IF NOT EXISTS`, so this is safe
/// to call on every start.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}
	Ok(())
}
