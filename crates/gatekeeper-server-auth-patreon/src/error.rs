// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_linking_core::VerificationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatreonError {
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// The token endpoint refused the code.
	#[error("Token exchange rejected: {0}")]
	TokenRejected(String),

	#[error("Patreon API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	#[error("Invalid response from Patreon: {0}")]
	InvalidResponse(String),

	#[error("Configuration error: {0}")]
	Config(String),
}

impl PatreonError {
	pub fn api_error(status: u16, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			message: message.into(),
		}
	}
}

impl From<PatreonError> for VerificationError {
	fn from(e: PatreonError) -> Self {
		match e {
			PatreonError::Network(e) => VerificationError::Network(e.to_string()),
			PatreonError::TokenRejected(msg) => VerificationError::Exchange(msg),
			e @ PatreonError::ApiError { .. } => VerificationError::Provider(e.to_string()),
			PatreonError::InvalidResponse(msg) => VerificationError::MalformedResponse(msg),
			PatreonError::Config(msg) => VerificationError::Provider(msg),
		}
	}
}
