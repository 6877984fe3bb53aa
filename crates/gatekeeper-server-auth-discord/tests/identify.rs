// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_common_secret::SecretString;
use gatekeeper_linking_core::{Provider, ProviderAdapter, VerificationError};
use gatekeeper_server_auth_discord::{DiscordEndpoints, DiscordOAuthClient, DiscordOAuthConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> DiscordOAuthClient {
	DiscordOAuthClient::new(
		DiscordOAuthConfig::new(
			"did",
			SecretString::from("dsecret"),
			"http://localhost:8080/auth/discord/callback",
		)
		.with_endpoints(DiscordEndpoints::with_base(&server.uri())),
	)
	.unwrap()
}

#[tokio::test]
async fn verify_returns_chat_identity() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/api/oauth2/token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"access_token": "dsc_token",
			"token_type": "Bearer",
			"scope": "identify"
		})))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/api/users/@me"))
		.and(header("Authorization", "Bearer dsc_token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"id": "1",
			"username": "erin",
			"discriminator": "0",
			"global_name": "Erin"
		})))
		.expect(1)
		.mount(&server)
		.await;

	let identity = client_for(&server).verify("code").await.unwrap();
	assert_eq!(identity.provider, Provider::Chat);
	assert_eq!(identity.external_id, "erin");
}

#[tokio::test]
async fn rejected_code_is_an_exchange_error() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/api/oauth2/token"))
		.respond_with(ResponseTemplate::new(400).set_body_json(json!({
			"error": "invalid_grant",
			"error_description": "Invalid \"code\" in request."
		})))
		.mount(&server)
		.await;

	let err = client_for(&server).verify("bad").await.unwrap_err();
	assert!(matches!(err, VerificationError::Exchange(ref m) if m.contains("Invalid")));
}
