// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Upper bound for a single provider or grant request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Client builder with the Gatekeeper User-Agent and default timeout.
///
/// GitHub rejects API requests that carry no User-Agent, so every outbound
/// client must start here.
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.timeout(DEFAULT_TIMEOUT)
}

/// Build a client with the defaults from [`builder`].
pub fn new_client() -> Result<Client, reqwest::Error> {
	builder().build()
}

/// Build a client with a custom per-request timeout.
pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).build()
}

/// `gatekeeper/{crate version}`
pub fn user_agent() -> String {
	format!("gatekeeper/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_names_product_and_version() {
		let ua = user_agent();
		let (product, version) = ua.split_once('/').unwrap();
		assert_eq!(product, "gatekeeper");
		assert!(!version.is_empty());
	}

	#[test]
	fn clients_build() {
		assert!(new_client().is_ok());
		assert!(new_client_with_timeout(Duration::from_secs(1)).is_ok());
	}
}
