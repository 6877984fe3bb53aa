// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_common_secret::SecretString;
use gatekeeper_linking_core::{Grant, GrantExecutor};
use gatekeeper_server_github_grant::{CollaboratorGrantClient, GrantConfig, Permission};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, permission: Permission) -> CollaboratorGrantClient {
	let config = GrantConfig::new("acme", "secret-sauce", SecretString::from("ghp_admin"))
		.unwrap()
		.with_unchecked_base_url(&server.uri())
		.unwrap()
		.with_permission(permission);
	CollaboratorGrantClient::new(config).unwrap()
}

#[tokio::test]
async fn created_invitation_is_a_grant() {
	let server = MockServer::start().await;

	Mock::given(method("PUT"))
		.and(path("/repos/acme/secret-sauce/collaborators/alice"))
		.and(header("Authorization", "Bearer ghp_admin"))
		.and(body_json(json!({ "permission": "pull" })))
		.respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
		.expect(1)
		.mount(&server)
		.await;

	let grant = client_for(&server, Permission::Pull).grant("alice").await.unwrap();
	assert_eq!(grant, Grant::Created);
}

#[tokio::test]
async fn existing_collaborator_is_a_grant() {
	let server = MockServer::start().await;

	Mock::given(method("PUT"))
		.and(path("/repos/acme/secret-sauce/collaborators/bob"))
		.and(body_json(json!({ "permission": "push" })))
		.respond_with(ResponseTemplate::new(204))
		.mount(&server)
		.await;

	let grant = client_for(&server, Permission::Push).grant("bob").await.unwrap();
	assert_eq!(grant, Grant::AlreadyCollaborator);
}

#[tokio::test]
async fn rejection_carries_status() {
	let server = MockServer::start().await;

	Mock::given(method("PUT"))
		.and(path("/repos/acme/secret-sauce/collaborators/carol"))
		.respond_with(
			ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation Failed" })),
		)
		.mount(&server)
		.await;

	let failed = client_for(&server, Permission::Pull)
		.grant("carol")
		.await
		.unwrap_err();
	assert_eq!(failed.status, Some(422));
	assert!(failed.message.contains("Validation Failed"));
}

#[tokio::test]
async fn unreachable_host_has_no_status() {
	let port = {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		listener.local_addr().unwrap().port()
	};
	let config = GrantConfig::new("acme", "secret-sauce", SecretString::from("ghp_admin"))
		.unwrap()
		.with_unchecked_base_url(&format!("http://127.0.0.1:{port}"))
		.unwrap();
	let client = CollaboratorGrantClient::new(config).unwrap();

	let failed = client.grant("dave").await.unwrap_err();
	assert_eq!(failed.status, None);
}
