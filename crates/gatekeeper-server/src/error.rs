// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the HTTP layer and for start-up.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use gatekeeper_server_db::DbError;
use gatekeeper_server_linking::WorkflowError;
use serde::Serialize;

use crate::routes::outcome::Outcome;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("unknown provider: {0}")]
	UnknownProvider(String),

	#[error("no active link session")]
	MissingSession,

	#[error("invalid or expired OAuth state")]
	InvalidState,

	#[error(transparent)]
	Workflow(#[from] WorkflowError),

	#[error(transparent)]
	Database(#[from] DbError),

	#[error("session cookie is not a valid header value: {0}")]
	Cookie(#[from] axum::http::header::InvalidHeaderValue),
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		match self {
			ServerError::UnknownProvider(provider) => (
				StatusCode::BAD_REQUEST,
				Json(ErrorResponse::new(
					"unknown_provider",
					format!("'{provider}' is not a supported provider"),
				)),
			)
				.into_response(),
			ServerError::MissingSession | ServerError::InvalidState => {
				tracing::debug!(error = %self, "restarting flow");
				Redirect::to("/").into_response()
			}
			ServerError::Workflow(err) => workflow_response(err),
			ServerError::Database(err) => {
				tracing::error!(error = %err, "database error");
				internal_error()
			}
			ServerError::Cookie(err) => {
				tracing::error!(error = %err, "failed to build session cookie");
				internal_error()
			}
		}
	}
}

fn workflow_response(err: WorkflowError) -> Response {
	match err {
		WorkflowError::Verification(e) => {
			tracing::warn!(error = %e, "provider verification failed");
			Redirect::to(&Outcome::VerificationFailed.path()).into_response()
		}
		WorkflowError::GrantFailed(e) => {
			tracing::warn!(status = ?e.status, error = %e.message, "grant failed");
			Redirect::to(&Outcome::GrantFailed.path()).into_response()
		}
		WorkflowError::InvalidTransition { step, state } => {
			tracing::debug!(%step, %state, "step out of order, restarting flow");
			Redirect::to("/").into_response()
		}
		WorkflowError::InconsistentSession(reason) => {
			tracing::error!(reason, "inconsistent link session");
			internal_error()
		}
		WorkflowError::Store(e) => {
			tracing::error!(error = %e, "store error");
			internal_error()
		}
	}
}

fn internal_error() -> Response {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(ErrorResponse::new("internal_error", "An internal error occurred")),
	)
		.into_response()
}

/// Failures while wiring the server from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
	#[error("GitHub OAuth: {0}")]
	GitHubConfig(#[from] gatekeeper_server_auth_github::ConfigError),

	#[error("GitHub OAuth: {0}")]
	GitHub(#[from] gatekeeper_server_auth_github::OAuthError),

	#[error("Patreon OAuth: {0}")]
	Patreon(#[from] gatekeeper_server_auth_patreon::PatreonError),

	#[error("Discord OAuth: {0}")]
	Discord(#[from] gatekeeper_server_auth_discord::DiscordError),

	#[error("collaborator grant: {0}")]
	Grant(#[from] gatekeeper_server_github_grant::GrantError),

	#[error("duration out of range: {0}")]
	Duration(#[from] chrono::OutOfRangeError),
}
