// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health check handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Healthy,
	Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub database: HealthStatus,
	pub latency_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// GET /health - 200 while the database answers, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let start = tokio::time::Instant::now();
	let result = gatekeeper_server_db::pool::ping(&state.pool).await;
	let latency_ms = start.elapsed().as_millis() as u64;

	match result {
		Ok(()) => (
			StatusCode::OK,
			Json(HealthResponse {
				status: HealthStatus::Healthy,
				database: HealthStatus::Healthy,
				latency_ms,
				error: None,
			}),
		),
		Err(e) => {
			tracing::warn!(error = %e, "database health check failed");
			(
				StatusCode::SERVICE_UNAVAILABLE,
				Json(HealthResponse {
					status: HealthStatus::Unhealthy,
					database: HealthStatus::Unhealthy,
					latency_ms,
					error: Some(e.to_string()),
				}),
			)
		}
	}
}
