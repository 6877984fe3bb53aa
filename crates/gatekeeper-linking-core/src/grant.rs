// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use serde::Serialize;

/// Successful outcomes of adding a collaborator. Both are idempotent
/// successes: repeating a grant for the same user is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
	/// An invitation was created.
	Created,
	/// The user already had access.
	AlreadyCollaborator,
}

/// The grant did not happen. Retryable; the linkage is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("grant failed (status {status:?}): {message}")]
pub struct GrantFailed {
	/// HTTP status from the repository host, if a response was received.
	pub status: Option<u16>,
	pub message: String,
}

impl GrantFailed {
	pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
		Self {
			status,
			message: message.into(),
		}
	}
}

#[async_trait]
pub trait GrantExecutor: Send + Sync {
	/// Give `code_host_username` access to the private repository.
	async fn grant(&self, code_host_username: &str) -> Result<Grant, GrantFailed>;
}
