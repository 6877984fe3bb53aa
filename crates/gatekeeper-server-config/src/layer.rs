// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by each source, merged in precedence order.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, GrantConfigLayer, HttpConfigLayer, LoggingConfigLayer, OAuthConfigLayer,
	PolicyConfigLayer, SessionConfigLayer,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub oauth: Option<OAuthConfigLayer>,
	#[serde(default)]
	pub grant: Option<GrantConfigLayer>,
	#[serde(default)]
	pub policy: Option<PolicyConfigLayer>,
	#[serde(default)]
	pub session: Option<SessionConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge `other` into this layer; values set in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_option(&mut self.oauth, other.oauth, OAuthConfigLayer::merge);
		merge_option(&mut self.grant, other.grant, GrantConfigLayer::merge);
		merge_option(&mut self.policy, other.policy, PolicyConfigLayer::merge);
		merge_option(&mut self.session, other.session, SessionConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn later_layer_wins_field_by_field() {
		let mut base: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			host = "127.0.0.1"
			port = 3000

			[policy]
			min_tier_amount_cents = 1000
			"#,
		)
		.unwrap();
		let env: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			port = 9000
			"#,
		)
		.unwrap();

		base.merge(env);

		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(9000));
		assert_eq!(base.policy.unwrap().min_tier_amount_cents, Some(1000));
	}

	#[test]
	fn unknown_section_is_rejected() {
		let result: Result<ServerConfigLayer, _> = toml::from_str("[llm]\nprovider = \"x\"\n");
		assert!(result.is_err());
	}
}
