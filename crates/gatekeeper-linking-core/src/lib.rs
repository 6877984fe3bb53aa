// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core model for linking a sponsor's identities across GitHub, Patreon and
//! Discord.
//!
//! This crate has no I/O. It defines:
//!
//! - the records the linking workflow reads and writes ([`SponsorRecord`],
//!   [`ChatAccount`], [`LinkageRecord`], [`LinkSession`])
//! - the pure eligibility rule ([`evaluate`])
//! - the seams the workflow talks through: [`ProviderAdapter`] for identity
//!   verification, the store traits in [`store`], and [`GrantExecutor`] for
//!   the repository access grant

pub mod adapter;
pub mod eligibility;
pub mod grant;
pub mod identity;
pub mod provider;
pub mod records;
pub mod session;
pub mod store;

pub use adapter::{ProviderAdapter, VerificationError};
pub use eligibility::{evaluate, Eligibility, EligibilityPolicy, DEFAULT_MIN_TIER_AMOUNT};
pub use grant::{Grant, GrantExecutor, GrantFailed};
pub use identity::{Credential, IdentityRecord};
pub use provider::{Provider, UnknownProvider};
pub use records::{ChatAccount, LinkageId, LinkageRecord, SponsorRecord};
pub use session::{LinkSession, LinkSessionId, WorkflowState, WorkflowStep};
pub use store::{ChatAccountStore, LinkSessionStore, LinkageStore, SponsorStore, StoreError};
