// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_STATE_TTL_SECS: u64 = 600;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Lifetimes of link sessions and OAuth states, and how often expired rows
/// are swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
	pub state_ttl: Duration,
	pub session_ttl: Duration,
	pub cleanup_interval: Duration,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			state_ttl: Duration::from_secs(DEFAULT_STATE_TTL_SECS),
			session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
			cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfigLayer {
	#[serde(default)]
	pub state_ttl_secs: Option<u64>,
	#[serde(default)]
	pub session_ttl_secs: Option<u64>,
	#[serde(default)]
	pub cleanup_interval_secs: Option<u64>,
}

impl SessionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.state_ttl_secs.is_some() {
			self.state_ttl_secs = other.state_ttl_secs;
		}
		if other.session_ttl_secs.is_some() {
			self.session_ttl_secs = other.session_ttl_secs;
		}
		if other.cleanup_interval_secs.is_some() {
			self.cleanup_interval_secs = other.cleanup_interval_secs;
		}
	}

	pub fn finalize(self) -> Result<SessionConfig, ConfigError> {
		let state = self.state_ttl_secs.unwrap_or(DEFAULT_STATE_TTL_SECS);
		let session = self.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS);
		let cleanup = self
			.cleanup_interval_secs
			.unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS);

		for (key, value) in [
			("session.state_ttl_secs", state),
			("session.session_ttl_secs", session),
			("session.cleanup_interval_secs", cleanup),
		] {
			if value == 0 {
				return Err(ConfigError::InvalidValue {
					key: key.to_string(),
					message: "must be greater than zero".to_string(),
				});
			}
		}
		if state > session {
			return Err(ConfigError::Validation(
				"session.state_ttl_secs must not exceed session.session_ttl_secs".to_string(),
			));
		}

		Ok(SessionConfig {
			state_ttl: Duration::from_secs(state),
			session_ttl: Duration::from_secs(session),
			cleanup_interval: Duration::from_secs(cleanup),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = SessionConfigLayer::default().finalize().unwrap();
		assert_eq!(config, SessionConfig::default());
		assert_eq!(config.state_ttl, Duration::from_secs(600));
	}

	#[test]
	fn state_outliving_session_is_rejected() {
		let layer = SessionConfigLayer {
			state_ttl_secs: Some(7200),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn zero_interval_is_rejected() {
		let layer = SessionConfigLayer {
			cleanup_interval_secs: Some(0),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { ref key, .. }) if key == "session.cleanup_interval_secs"
		));
	}

	proptest::proptest! {
		#[test]
		fn accepted_values_round_trip(state in 1u64..10_000, extra in 0u64..10_000, cleanup in 1u64..10_000) {
			let config = SessionConfigLayer {
				state_ttl_secs: Some(state),
				session_ttl_secs: Some(state + extra),
				cleanup_interval_secs: Some(cleanup),
			}
			.finalize()
			.unwrap();
			proptest::prop_assert_eq!(config.state_ttl.as_secs(), state);
			proptest::prop_assert!(config.state_ttl <= config.session_ttl);
		}
	}
}
