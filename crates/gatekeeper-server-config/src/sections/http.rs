// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Public URL of the service, used to derive OAuth redirect URIs.
	pub base_url: String,
	/// Mark the session cookie `Secure`. On whenever `base_url` is https.
	pub cookie_secure: bool,
}

impl Default for HttpConfig {
	fn default() -> Self {
		HttpConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub cookie_secure: Option<bool>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.cookie_secure.is_some() {
			self.cookie_secure = other.cookie_secure;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let port = self.port.unwrap_or(DEFAULT_PORT);
		let base_url = self
			.base_url
			.map(|u| u.trim_end_matches('/').to_string())
			.unwrap_or_else(|| format!("http://localhost:{port}"));
		let cookie_secure = self
			.cookie_secure
			.unwrap_or_else(|| base_url.starts_with("https://"));
		HttpConfig {
			host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
			port,
			base_url,
			cookie_secure,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = HttpConfigLayer::default().finalize();
		assert_eq!(config.host, "0.0.0.0");
		assert_eq!(config.port, 8080);
		assert_eq!(config.base_url, "http://localhost:8080");
		assert!(!config.cookie_secure);
	}

	#[test]
	fn https_base_url_implies_secure_cookie() {
		let config = HttpConfigLayer {
			base_url: Some("https://sponsors.example.com/".to_string()),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.base_url, "https://sponsors.example.com");
		assert!(config.cookie_secure);
	}

	#[test]
	fn merge_prefers_other() {
		let mut base = HttpConfigLayer {
			host: Some("127.0.0.1".to_string()),
			port: Some(3000),
			..Default::default()
		};
		base.merge(HttpConfigLayer {
			port: Some(9000),
			cookie_secure: Some(true),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.host, "127.0.0.1");
		assert_eq!(config.port, 9000);
		assert!(config.cookie_secure);
	}
}
