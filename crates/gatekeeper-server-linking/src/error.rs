// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_linking_core::{
	GrantFailed, StoreError, VerificationError, WorkflowState, WorkflowStep,
};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
	/// The provider could not vouch for the user. The session is back at
	/// `Start`.
	#[error("verification failed: {0}")]
	Verification(#[from] VerificationError),

	/// The repository host refused the grant. The session stays in
	/// `ChatLinked` and the grant can be retried.
	#[error(transparent)]
	GrantFailed(#[from] GrantFailed),

	/// The step is not reachable from the session's state. The session is
	/// unchanged.
	#[error("{step} is not allowed from state {state}")]
	InvalidTransition {
		step: WorkflowStep,
		state: WorkflowState,
	},

	/// The session's state and its stored references disagree, for example
	/// a `ChatLinked` session without a linkage.
	#[error("inconsistent session: {0}")]
	InconsistentSession(&'static str),

	#[error(transparent)]
	Store(#[from] StoreError),
}

impl WorkflowError {
	pub fn is_retryable(&self) -> bool {
		matches!(self, WorkflowError::GrantFailed(_))
	}
}
