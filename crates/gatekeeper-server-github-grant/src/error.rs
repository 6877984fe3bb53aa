// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_linking_core::GrantFailed;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrantError {
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Request timed out")]
	Timeout,

	/// The token is missing, expired or lacks admin rights on the repository.
	#[error("Unauthorized or forbidden: {0}")]
	Unauthorized(String),

	#[error("Rate limit exceeded")]
	RateLimited,

	#[error("GitHub API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	#[error("Configuration error: {0}")]
	Config(String),
}

impl GrantError {
	pub fn api_error(status: u16, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			message: message.into(),
		}
	}

	pub fn status(&self) -> Option<u16> {
		match self {
			GrantError::ApiError { status, .. } => Some(*status),
			GrantError::RateLimited => Some(429),
			_ => None,
		}
	}
}

impl From<GrantError> for GrantFailed {
	fn from(e: GrantError) -> Self {
		GrantFailed::new(e.status(), e.to_string())
	}
}
