// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use gatekeeper_linking_core::EligibilityPolicy;
use gatekeeper_server_auth_discord::{DiscordOAuthClient, DiscordOAuthConfig};
use gatekeeper_server_auth_github::{GitHubOAuthClient, GitHubOAuthConfig};
use gatekeeper_server_auth_patreon::{PatreonOAuthClient, PatreonOAuthConfig};
use gatekeeper_server_config::{HttpConfig, ServerConfig, SessionConfig};
use gatekeeper_server_db::{
	ChatAccountRepository, LinkSessionRepository, LinkageRepository, OAuthStateRepository,
	SponsorRepository,
};
use gatekeeper_server_github_grant::{CollaboratorGrantClient, GrantConfig, Permission};
use gatekeeper_server_linking::{LinkingWorkflow, ProviderAdapters, WorkflowStores};
use sqlx::SqlitePool;

use crate::error::SetupError;
use crate::routes;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
	pub workflow: Arc<LinkingWorkflow>,
	pub oauth_states: Arc<OAuthStateRepository>,
	pub pool: SqlitePool,
	pub base_url: String,
	pub cookie_secure: bool,
	pub state_ttl: chrono::Duration,
}

pub fn create_app_state(
	pool: SqlitePool,
	workflow: LinkingWorkflow,
	http: &HttpConfig,
	session: &SessionConfig,
) -> Result<AppState, SetupError> {
	Ok(AppState {
		workflow: Arc::new(workflow),
		oauth_states: Arc::new(OAuthStateRepository::new(pool.clone())),
		pool,
		base_url: http.base_url.clone(),
		cookie_secure: http.cookie_secure,
		state_ttl: chrono::Duration::from_std(session.state_ttl)?,
	})
}

/// Wire the provider clients, grant client and repositories into a workflow.
pub fn build_workflow(
	pool: &SqlitePool,
	config: &ServerConfig,
) -> Result<LinkingWorkflow, SetupError> {
	let github = &config.oauth.github;
	let github_config = GitHubOAuthConfig::new(
		github.client.client_id.clone(),
		github.client.client_secret.clone(),
		github.client.redirect_uri.clone(),
		github.sponsorable_login.clone(),
	);
	github_config.validate()?;

	let patreon = &config.oauth.patreon;
	let patreon_config = PatreonOAuthConfig::new(
		patreon.client.client_id.clone(),
		patreon.client.client_secret.clone(),
		patreon.client.redirect_uri.clone(),
		patreon.campaign_id.clone(),
	);

	let discord = &config.oauth.discord;
	let discord_config = DiscordOAuthConfig::new(
		discord.client_id.clone(),
		discord.client_secret.clone(),
		discord.redirect_uri.clone(),
	);

	let adapters = ProviderAdapters {
		code_host: Arc::new(GitHubOAuthClient::new(github_config)?),
		membership: Arc::new(PatreonOAuthClient::new(patreon_config)?),
		chat: Arc::new(DiscordOAuthClient::new(discord_config)?),
	};

	let grant = &config.grant;
	let permission: Permission = grant.permission.parse()?;
	let grant_config = GrantConfig::new(&grant.owner, &grant.repo, grant.token.clone())?
		.with_permission(permission)
		.with_base_url(&grant.api_base_url)?;
	let grants = Arc::new(CollaboratorGrantClient::new(grant_config)?);

	let policy = EligibilityPolicy {
		min_tier_amount: config.policy.min_tier_amount_cents,
	};

	tracing::info!(
		owner = %grant.owner,
		repo = %grant.repo,
		permission = %permission,
		min_tier_amount = policy.min_tier_amount,
		"linking workflow configured"
	);

	Ok(LinkingWorkflow::new(
		stores(pool),
		adapters,
		grants,
		policy,
		chrono::Duration::from_std(config.session.session_ttl)?,
	))
}

/// Repository-backed stores over `pool`.
pub fn stores(pool: &SqlitePool) -> WorkflowStores {
	WorkflowStores {
		sponsors: Arc::new(SponsorRepository::new(pool.clone())),
		chat_accounts: Arc::new(ChatAccountRepository::new(pool.clone())),
		linkages: Arc::new(LinkageRepository::new(pool.clone())),
		sessions: Arc::new(LinkSessionRepository::new(pool.clone())),
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/", get(routes::index::index))
		.route("/health", get(routes::health::health_check))
		.route("/login/{provider}", get(routes::flow::login))
		.route("/auth/{provider}/callback", get(routes::flow::callback))
		.route("/grant/retry", post(routes::flow::retry_grant))
		.route("/outcome/{outcome}", get(routes::outcome::show))
		.with_state(state)
}
