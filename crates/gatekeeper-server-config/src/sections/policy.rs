// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_MIN_TIER_AMOUNT_CENTS: u64 = 500;

/// Eligibility policy: one minimum monthly tier for every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
	pub min_tier_amount_cents: u64,
}

impl Default for PolicyConfig {
	fn default() -> Self {
		Self {
			min_tier_amount_cents: DEFAULT_MIN_TIER_AMOUNT_CENTS,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfigLayer {
	#[serde(default)]
	pub min_tier_amount_cents: Option<u64>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.min_tier_amount_cents.is_some() {
			self.min_tier_amount_cents = other.min_tier_amount_cents;
		}
	}

	pub fn finalize(self) -> Result<PolicyConfig, ConfigError> {
		let min = self
			.min_tier_amount_cents
			.unwrap_or(DEFAULT_MIN_TIER_AMOUNT_CENTS);
		if min == 0 {
			return Err(ConfigError::InvalidValue {
				key: "policy.min_tier_amount_cents".to_string(),
				message: "must be greater than zero".to_string(),
			});
		}
		Ok(PolicyConfig {
			min_tier_amount_cents: min,
		})
	}
}
