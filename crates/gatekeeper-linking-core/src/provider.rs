// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three identity systems a sponsor links together.
///
/// The slug is what appears in URLs (`/login/github`) and in the `provider`
/// column of persisted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
	/// GitHub: the identity that receives repository access.
	CodeHost,
	/// Patreon: fallback proof of sponsorship.
	Membership,
	/// Discord: the community account recorded on completion.
	Chat,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl Provider {
	pub const ALL: [Provider; 3] = [Provider::CodeHost, Provider::Membership, Provider::Chat];

	pub fn slug(&self) -> &'static str {
		match self {
			Provider::CodeHost => "github",
			Provider::Membership => "patreon",
			Provider::Chat => "discord",
		}
	}

	pub fn from_slug(slug: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.slug() == slug)
	}
}

impl fmt::Display for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.slug())
	}
}

impl FromStr for Provider {
	type Err = UnknownProvider;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_slug(s).ok_or_else(|| UnknownProvider(s.to_string()))
	}
}
