// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
	pub service: &'static str,
	pub description: &'static str,
	pub start_url: String,
	pub steps: [&'static str; 3],
	pub min_tier_amount_cents: u64,
}

/// GET / - how the flow works and where it starts.
pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
	Json(IndexResponse {
		service: "gatekeeper",
		description: "Link your GitHub, Patreon and Discord accounts to get access to the private repository.",
		start_url: format!("{}/login/github", state.base_url),
		steps: [
			"Sign in with GitHub. Active GitHub sponsors at the minimum tier skip the Patreon step.",
			"Otherwise sign in with Patreon to prove an active pledge at the minimum tier.",
			"Sign in with Discord to finish. Repository access is granted to your GitHub account.",
		],
		min_tier_amount_cents: state.workflow.policy().min_tier_amount,
	})
}
