// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for gatekeeper-server.

pub mod database;
pub mod grant;
pub mod http;
pub mod logging;
pub mod oauth;
pub mod policy;
pub mod session;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use grant::{GrantConfigLayer, GrantSettings};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use oauth::{
	DiscordOAuthSettings, GitHubOAuthLayer, GitHubOAuthSettings, OAuthClientLayer,
	OAuthClientSettings, OAuthConfig, OAuthConfigLayer, PatreonOAuthLayer, PatreonOAuthSettings,
};
pub use policy::{PolicyConfig, PolicyConfigLayer};
pub use session::{SessionConfig, SessionConfigLayer};
