// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The rule deciding whether a verified sponsorship earns repository access.

use serde::{Deserialize, Serialize};

use crate::identity::IdentityRecord;

/// Minimum monthly tier in cents when none is configured ($5).
pub const DEFAULT_MIN_TIER_AMOUNT: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
	/// Minimum active monthly tier, in cents, that qualifies.
	pub min_tier_amount: u64,
}

impl Default for EligibilityPolicy {
	fn default() -> Self {
		Self {
			min_tier_amount: DEFAULT_MIN_TIER_AMOUNT,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
	Eligible,
	InsufficientTier,
	NotSponsor,
}

/// Inactive sponsorships never qualify, whatever their amount. Lifetime
/// support is recorded but not consulted.
pub fn evaluate(record: &IdentityRecord, policy: &EligibilityPolicy) -> Eligibility {
	if !record.active {
		Eligibility::NotSponsor
	} else if record.tier_amount < policy.min_tier_amount {
		Eligibility::InsufficientTier
	} else {
		Eligibility::Eligible
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::Provider;
	use proptest::prelude::*;

	fn sponsor(tier_amount: u64, active: bool) -> IdentityRecord {
		IdentityRecord {
			provider: Provider::CodeHost,
			external_id: "alice".to_string(),
			display_name: None,
			email: None,
			tier_amount,
			lifetime_amount: 10_000,
			active,
			sponsorship_started_at: None,
		}
	}

	fn policy(min_tier_amount: u64) -> EligibilityPolicy {
		EligibilityPolicy { min_tier_amount }
	}

	#[test]
	fn zero_tier_is_insufficient() {
		assert_eq!(
			evaluate(&sponsor(0, true), &policy(1)),
			Eligibility::InsufficientTier
		);
	}

	#[test]
	fn inactive_is_not_a_sponsor_regardless_of_amount() {
		assert_eq!(
			evaluate(&sponsor(100_000, false), &policy(500)),
			Eligibility::NotSponsor
		);
	}

	#[test]
	fn exact_minimum_is_eligible() {
		assert_eq!(
			evaluate(&sponsor(500, true), &policy(500)),
			Eligibility::Eligible
		);
	}

	#[test]
	fn below_minimum_is_insufficient() {
		assert_eq!(
			evaluate(&sponsor(200, true), &policy(500)),
			Eligibility::InsufficientTier
		);
	}

	#[test]
	fn chat_identity_passes_a_zero_minimum() {
		let record = IdentityRecord::chat("alice#1234");
		assert_eq!(evaluate(&record, &policy(0)), Eligibility::Eligible);
	}

	#[test]
	fn default_minimum_is_five_dollars() {
		assert_eq!(EligibilityPolicy::default().min_tier_amount, 500);
	}

	proptest! {
		#[test]
		fn evaluate_is_deterministic(tier in 0u64..1_000_000, active: bool, min in 0u64..1_000_000) {
			let record = sponsor(tier, active);
			let p = policy(min);
			prop_assert_eq!(evaluate(&record, &p), evaluate(&record, &p));
		}

		#[test]
		fn eligible_iff_active_and_at_least_minimum(tier in 0u64..1_000_000, active: bool, min in 0u64..1_000_000) {
			let outcome = evaluate(&sponsor(tier, active), &policy(min));
			let expected = match (active, tier >= min) {
				(false, _) => Eligibility::NotSponsor,
				(true, false) => Eligibility::InsufficientTier,
				(true, true) => Eligibility::Eligible,
			};
			prop_assert_eq!(outcome, expected);
		}

		#[test]
		fn lifetime_amount_is_ignored(tier in 0u64..10_000, lifetime in 0u64..u64::MAX, min in 0u64..10_000) {
			let mut record = sponsor(tier, true);
			let before = evaluate(&record, &policy(min));
			record.lifetime_amount = lifetime;
			prop_assert_eq!(evaluate(&record, &policy(min)), before);
		}
	}
}
