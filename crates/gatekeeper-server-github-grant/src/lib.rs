// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository access grants.
//!
//! Adds a GitHub user as a collaborator on one private repository using a
//! token that has admin rights on it. GitHub answers `201 Created` when it
//! sends an invitation and `204 No Content` when the user already has
//! access; both count as success.

pub mod client;
pub mod config;
pub mod error;

pub use client::CollaboratorGrantClient;
pub use config::{GrantConfig, Permission};
pub use error::GrantError;
