// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client for calls to GitHub, Patreon and Discord.
//!
//! Provider and grant calls are single attempts with no retry loop. The
//! client timeout bounds how long a link session step can block; a timed
//! out step is retried by the user, never automatically.

mod client;

pub use client::{builder, new_client, new_client_with_timeout, user_agent, DEFAULT_TIMEOUT};
