// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for tests in this and downstream crates.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// In-memory database with one connection, so every query sees the same
/// schema and data.
pub async fn create_test_pool() -> SqlitePool {
	SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.expect("in-memory sqlite pool")
}

/// In-memory database with all migrations applied.
pub async fn create_migrated_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	crate::run_migrations(&pool)
		.await
		.expect("migrations apply to a fresh database");
	pool
}
