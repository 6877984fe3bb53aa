// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Login redirects, provider callbacks and the grant retry.
//!
//! The browser carries its link session id in a cookie. Every login issues a
//! single-use OAuth `state` bound to that session and provider; the callback
//! consumes it and only proceeds when it was issued to the same session.

use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use gatekeeper_linking_core::{LinkSession, Provider, WorkflowState, WorkflowStep};
use gatekeeper_server_linking::WorkflowError;
use serde::Deserialize;

use crate::api::AppState;
use crate::cookies::{extract_session_id, session_cookie};
use crate::error::ServerError;
use crate::oauth_state::generate_state;
use crate::routes::outcome::Outcome;

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
	pub code: Option<String>,
	pub state: Option<String>,
	pub error: Option<String>,
}

fn parse_provider(raw: &str) -> Result<Provider, ServerError> {
	raw.parse()
		.map_err(|_| ServerError::UnknownProvider(raw.to_string()))
}

fn step_for(provider: Provider) -> WorkflowStep {
	match provider {
		Provider::CodeHost => WorkflowStep::VerifyCodeHost,
		Provider::Membership => WorkflowStep::VerifyMembership,
		Provider::Chat => WorkflowStep::VerifyChat,
	}
}

/// Where the browser goes after a step leaves the session in `state`.
pub fn next_location(state: WorkflowState) -> String {
	match state {
		WorkflowState::Start => "/".to_string(),
		WorkflowState::EligibleForChat | WorkflowState::MembershipVerified => {
			format!("/login/{}", Provider::Chat.slug())
		}
		WorkflowState::IneligibleRequireMembership => {
			format!("/login/{}", Provider::Membership.slug())
		}
		WorkflowState::ChatLinked => Outcome::GrantFailed.path(),
		terminal => Outcome::for_state(terminal)
			.map(|o| o.path())
			.unwrap_or_else(|| "/".to_string()),
	}
}

async fn current_session(
	state: &AppState,
	headers: &HeaderMap,
) -> Result<Option<LinkSession>, ServerError> {
	match extract_session_id(headers) {
		Some(id) => Ok(state.workflow.load_session(id, Utc::now()).await?),
		None => Ok(None),
	}
}

/// GET /login/{provider}
///
/// GitHub starts a new session. The other providers continue the session in
/// the cookie, and only from a state where their step is allowed.
#[tracing::instrument(skip(state, headers))]
pub async fn login(
	State(state): State<AppState>,
	Path(provider): Path<String>,
	headers: HeaderMap,
) -> Result<Response, ServerError> {
	let provider = parse_provider(&provider)?;

	let (session, issued) = if provider == Provider::CodeHost {
		(state.workflow.start_session().await?, true)
	} else {
		let session = current_session(&state, &headers)
			.await?
			.ok_or(ServerError::MissingSession)?;
		let step = step_for(provider);
		if !step.allowed_from(session.state) {
			return Err(WorkflowError::InvalidTransition {
				step,
				state: session.state,
			}
			.into());
		}
		(session, false)
	};

	let oauth_state = generate_state();
	state
		.oauth_states
		.store(&oauth_state, session.id, provider, state.state_ttl)
		.await?;

	tracing::debug!(session_id = %session.id, %provider, "redirecting to provider");
	let mut response =
		Redirect::to(&state.workflow.authorization_url(provider, &oauth_state)).into_response();

	if issued {
		let max_age = (session.expires_at - Utc::now()).num_seconds();
		let cookie = session_cookie(session.id, max_age, state.cookie_secure);
		response
			.headers_mut()
			.insert(SET_COOKIE, HeaderValue::from_str(&cookie)?);
	}
	Ok(response)
}

/// GET /auth/{provider}/callback
#[tracing::instrument(skip(state, headers, query))]
pub async fn callback(
	State(state): State<AppState>,
	Path(provider): Path<String>,
	headers: HeaderMap,
	Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, ServerError> {
	let provider = parse_provider(&provider)?;

	if let Some(error) = &query.error {
		tracing::warn!(%provider, error = %error, "provider returned an OAuth error");
		return Err(ServerError::InvalidState);
	}
	let (Some(code), Some(oauth_state)) = (&query.code, &query.state) else {
		return Err(ServerError::InvalidState);
	};

	let entry = state
		.oauth_states
		.consume(oauth_state, provider)
		.await?
		.ok_or(ServerError::InvalidState)?;

	if extract_session_id(&headers) != Some(entry.session_id) {
		tracing::warn!(
			session_id = %entry.session_id,
			"OAuth state presented without its session cookie"
		);
		return Err(ServerError::InvalidState);
	}

	let mut session = state
		.workflow
		.load_session(entry.session_id, Utc::now())
		.await?
		.ok_or(ServerError::MissingSession)?;

	let next = state
		.workflow
		.handle_callback(provider, &mut session, code)
		.await?;

	tracing::info!(session_id = %session.id, %provider, state = %next, "link step completed");
	Ok(Redirect::to(&next_location(next)).into_response())
}

/// POST /grant/retry
#[tracing::instrument(skip(state, headers))]
pub async fn retry_grant(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Response, ServerError> {
	let mut session = current_session(&state, &headers)
		.await?
		.ok_or(ServerError::MissingSession)?;

	let next = state.workflow.complete_grant(&mut session).await?;

	tracing::info!(session_id = %session.id, state = %next, "grant retried");
	Ok(Redirect::to(&next_location(next)).into_response())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn next_location_follows_the_flow() {
		assert_eq!(next_location(WorkflowState::EligibleForChat), "/login/discord");
		assert_eq!(next_location(WorkflowState::MembershipVerified), "/login/discord");
		assert_eq!(
			next_location(WorkflowState::IneligibleRequireMembership),
			"/login/patreon"
		);
		assert_eq!(next_location(WorkflowState::Granted), "/outcome/granted");
		assert_eq!(
			next_location(WorkflowState::AlreadyLinked),
			"/outcome/already-linked"
		);
		assert_eq!(
			next_location(WorkflowState::InsufficientTier),
			"/outcome/not-enough"
		);
		assert_eq!(next_location(WorkflowState::NotSponsor), "/outcome/not-sponsor");
		assert_eq!(next_location(WorkflowState::Start), "/");
	}

	#[test]
	fn provider_slugs_parse() {
		assert_eq!(parse_provider("patreon").unwrap(), Provider::Membership);
		assert!(matches!(
			parse_provider("gitlab"),
			Err(ServerError::UnknownProvider(_))
		));
	}
}
