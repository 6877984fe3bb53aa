// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the Gatekeeper server.
//!
//! Each repository wraps a [`sqlx::SqlitePool`] and implements one of the
//! store traits from `gatekeeper-linking-core`. Uniqueness of linked
//! identities is enforced by unique indexes; a violated index surfaces as
//! [`DbError::Conflict`] and from there as `StoreError::Conflict`.

pub mod chat_account;
pub mod error;
pub mod linkage;
pub mod migrations;
pub mod oauth_state;
pub mod pool;
pub mod session;
pub mod sponsor;
pub mod testing;
mod time;

pub use chat_account::ChatAccountRepository;
pub use error::{DbError, Result};
pub use linkage::LinkageRepository;
pub use migrations::run_migrations;
pub use oauth_state::{OAuthStateEntry, OAuthStateRepository};
pub use pool::create_pool;
pub use session::LinkSessionRepository;
pub use sponsor::SponsorRepository;
