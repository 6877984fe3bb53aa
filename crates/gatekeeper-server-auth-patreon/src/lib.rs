// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Patreon sign-in for users who do not sponsor on GitHub.
//!
//! After the OAuth exchange the client reads the identity endpoint with the
//! user's memberships included, and keeps only the membership that belongs
//! to the configured campaign. A user with no such membership comes back as
//! an inactive identity with zero amounts.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::PatreonOAuthClient;
pub use config::{PatreonEndpoints, PatreonOAuthConfig};
pub use error::PatreonError;
pub use types::{PatreonTokenResponse, ACTIVE_PATRON};
