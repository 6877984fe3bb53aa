// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The cookie that carries a browser's link session id.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use gatekeeper_linking_core::LinkSessionId;

pub const SESSION_COOKIE_NAME: &str = "gatekeeper_session";

/// The session id from the `Cookie` header, if present and well formed.
pub fn extract_session_id(headers: &HeaderMap) -> Option<LinkSessionId> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.find_map(|cookie| {
			let (name, value) = cookie.trim().split_once('=')?;
			if name == SESSION_COOKIE_NAME {
				value.parse().ok()
			} else {
				None
			}
		})
}

/// `Set-Cookie` value for `id`, valid for `max_age_secs`.
pub fn session_cookie(id: LinkSessionId, max_age_secs: i64, secure: bool) -> String {
	let mut cookie = format!(
		"{SESSION_COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
		max_age_secs.max(0)
	);
	if secure {
		cookie.push_str("; Secure");
	}
	cookie
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn headers(cookie: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
		headers
	}

	#[test]
	fn finds_session_among_other_cookies() {
		let id = LinkSessionId::new();
		let found = extract_session_id(&headers(&format!(
			"theme=dark; {SESSION_COOKIE_NAME}={id} ; other=1"
		)));
		assert_eq!(found, Some(id));
	}

	#[test]
	fn ignores_malformed_session_id() {
		assert_eq!(
			extract_session_id(&headers("gatekeeper_session=not-a-uuid")),
			None
		);
		assert_eq!(extract_session_id(&HeaderMap::new()), None);
	}

	#[test]
	fn secure_flag_follows_configuration() {
		let id = LinkSessionId::new();
		let plain = session_cookie(id, 3600, false);
		assert!(plain.contains("HttpOnly"));
		assert!(plain.contains("SameSite=Lax"));
		assert!(plain.contains("Max-Age=3600"));
		assert!(!plain.contains("Secure"));
		assert!(session_cookie(id, 3600, true).ends_with("; Secure"));
	}

	#[test]
	fn cookie_is_a_valid_header_value() {
		let id = LinkSessionId::new();
		for secure in [false, true] {
			assert!(HeaderValue::from_str(&session_cookie(id, 3600, secure)).is_ok());
		}
	}
}
