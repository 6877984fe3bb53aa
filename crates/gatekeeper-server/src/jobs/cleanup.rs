// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use chrono::{DateTime, Utc};
use gatekeeper_server_db::{DbError, LinkSessionRepository, OAuthStateRepository};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Removes expired OAuth states and link sessions.
#[derive(Clone)]
pub struct CleanupJob {
	oauth_states: OAuthStateRepository,
	sessions: LinkSessionRepository,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
	pub oauth_states: u64,
	pub sessions: u64,
}

impl CleanupJob {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			oauth_states: OAuthStateRepository::new(pool.clone()),
			sessions: LinkSessionRepository::new(pool),
		}
	}

	#[instrument(skip(self), fields(job_id = "expired-cleanup"))]
	pub async fn run(&self, now: DateTime<Utc>) -> Result<CleanupReport, DbError> {
		let report = CleanupReport {
			oauth_states: self.oauth_states.delete_expired(now).await?,
			sessions: self.sessions.delete_expired(now).await?,
		};
		tracing::debug!(
			oauth_states = report.oauth_states,
			sessions = report.sessions,
			"expired rows removed"
		);
		Ok(report)
	}

	/// Run every `interval` until the runtime shuts down. Failures are logged
	/// and the next tick tries again.
	pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				if let Err(e) = self.run(Utc::now()).await {
					tracing::warn!(error = %e, "expired row cleanup failed");
				}
			}
		})
	}
}
