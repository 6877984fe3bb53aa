// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// A fresh OAuth `state` parameter. UUID v4 carries 122 random bits.
pub fn generate_state() -> String {
	let state = uuid::Uuid::new_v4().to_string();
	tracing::debug!("generated OAuth state");
	state
}
