// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Documents shown when the flow ends.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatekeeper_linking_core::WorkflowState;
use serde::Serialize;

use crate::error::ErrorResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Granted,
	AlreadyLinked,
	NotEnough,
	NotSponsor,
	GrantFailed,
	VerificationFailed,
}

impl Outcome {
	pub const ALL: [Outcome; 6] = [
		Outcome::Granted,
		Outcome::AlreadyLinked,
		Outcome::NotEnough,
		Outcome::NotSponsor,
		Outcome::GrantFailed,
		Outcome::VerificationFailed,
	];

	pub fn slug(&self) -> &'static str {
		match self {
			Outcome::Granted => "granted",
			Outcome::AlreadyLinked => "already-linked",
			Outcome::NotEnough => "not-enough",
			Outcome::NotSponsor => "not-sponsor",
			Outcome::GrantFailed => "grant-failed",
			Outcome::VerificationFailed => "verification-failed",
		}
	}

	pub fn from_slug(slug: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|o| o.slug() == slug)
	}

	pub fn path(&self) -> String {
		format!("/outcome/{}", self.slug())
	}

	/// The outcome for a terminal workflow state.
	pub fn for_state(state: WorkflowState) -> Option<Self> {
		match state {
			WorkflowState::Granted => Some(Outcome::Granted),
			WorkflowState::AlreadyLinked => Some(Outcome::AlreadyLinked),
			WorkflowState::InsufficientTier => Some(Outcome::NotEnough),
			WorkflowState::NotSponsor => Some(Outcome::NotSponsor),
			_ => None,
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Outcome::Granted => StatusCode::OK,
			Outcome::AlreadyLinked | Outcome::NotEnough | Outcome::NotSponsor => {
				StatusCode::FORBIDDEN
			}
			Outcome::GrantFailed | Outcome::VerificationFailed => StatusCode::BAD_GATEWAY,
		}
	}

	fn message(&self) -> &'static str {
		match self {
			Outcome::Granted => {
				"You have been added to the repository. Check your GitHub notifications for the invitation."
			}
			Outcome::AlreadyLinked => {
				"These accounts have already been used to claim access. Each sponsorship grants access once."
			}
			Outcome::NotEnough => "Your pledge is below the minimum tier required for access.",
			Outcome::NotSponsor => "No active sponsorship or pledge was found for this account.",
			Outcome::GrantFailed => {
				"Your accounts are linked but GitHub did not accept the invitation. Try again shortly."
			}
			Outcome::VerificationFailed => {
				"We could not verify your account with the provider. Start again from the beginning."
			}
		}
	}

	fn retry_url(&self) -> Option<&'static str> {
		match self {
			Outcome::GrantFailed => Some("/grant/retry"),
			Outcome::VerificationFailed => Some("/login/github"),
			_ => None,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
	pub outcome: &'static str,
	pub message: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub retry_url: Option<&'static str>,
}

/// GET /outcome/{outcome}
pub async fn show(Path(slug): Path<String>) -> Response {
	let Some(outcome) = Outcome::from_slug(&slug) else {
		return (
			StatusCode::NOT_FOUND,
			Json(ErrorResponse::new("not_found", format!("no outcome '{slug}'"))),
		)
			.into_response();
	};

	(
		outcome.status(),
		Json(OutcomeResponse {
			outcome: outcome.slug(),
			message: outcome.message(),
			retry_url: outcome.retry_url(),
		}),
	)
		.into_response()
}
