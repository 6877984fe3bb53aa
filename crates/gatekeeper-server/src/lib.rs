// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gatekeeper HTTP server.
//!
//! Walks a sponsor through GitHub, Patreon and Discord sign-ins and, once
//! the accounts are linked and the sponsorship qualifies, adds their GitHub
//! account as a collaborator on the private repository.

pub mod api;
pub mod cookies;
pub mod error;
pub mod jobs;
pub mod oauth_state;
pub mod routes;

pub use api::{build_workflow, create_app_state, create_router, AppState};
pub use error::{ErrorResponse, ServerError, SetupError};
pub use gatekeeper_server_config::ServerConfig;
