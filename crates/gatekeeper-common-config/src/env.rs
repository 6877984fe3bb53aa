// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from the environment.
//!
//! Every secret Gatekeeper reads (OAuth client secrets, the repository grant
//! token) can be supplied either directly as `VAR` or as a path in
//! `VAR_FILE`, which is how container orchestrators mount secrets.

use std::path::PathBuf;
use std::{env, fs};

use gatekeeper_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

#[derive(Debug, Error)]
pub enum RequiredSecretError {
	#[error("required secret not found: set either {var} or {file_var}")]
	Missing { var: String, file_var: String },

	#[error(transparent)]
	Load(#[from] SecretEnvError),
}

/// Read `VAR_FILE` if set, otherwise `VAR`. Returns `Ok(None)` when neither
/// is present. One trailing newline is stripped from file contents.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path) = env::var(&file_var) {
		if path.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}
		let path = PathBuf::from(path);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;
		let value = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(value)));
	}

	Ok(env::var(var).ok().map(SecretString::new))
}

/// Like [`load_secret_env`] but a missing secret is an error.
pub fn require_secret_env(var: &str) -> Result<SecretString, RequiredSecretError> {
	load_secret_env(var)?.ok_or_else(|| RequiredSecretError::Missing {
		var: var.to_string(),
		file_var: format!("{var}_FILE"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	// Each test uses its own variable name so they can run in parallel.

	#[test]
	fn missing_secret_is_none() {
		let var = "GATEKEEPER_TEST_SECRET_MISSING";
		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
		assert!(load_secret_env(var).unwrap().is_none());
	}

	#[test]
	fn reads_direct_value() {
		let var = "GATEKEEPER_TEST_SECRET_DIRECT";
		env::remove_var(format!("{var}_FILE"));
		env::set_var(var, "discord-secret");
		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "discord-secret");
		env::remove_var(var);
	}

	#[test]
	fn file_takes_precedence_and_strips_newline() {
		let var = "GATEKEEPER_TEST_SECRET_FILE";
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "ghp_from_file").unwrap();

		env::set_var(var, "ghp_from_env");
		env::set_var(format!("{var}_FILE"), file.path());

		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "ghp_from_file");

		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn empty_file_path_is_rejected() {
		let var = "GATEKEEPER_TEST_SECRET_EMPTY_PATH";
		env::set_var(format!("{var}_FILE"), "");
		assert!(matches!(
			load_secret_env(var),
			Err(SecretEnvError::EmptyPath { .. })
		));
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn unreadable_file_is_an_io_error() {
		let var = "GATEKEEPER_TEST_SECRET_BAD_PATH";
		env::set_var(format!("{var}_FILE"), "/nonexistent/gatekeeper/secret");
		assert!(matches!(load_secret_env(var), Err(SecretEnvError::Io { .. })));
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn require_reports_both_variable_names() {
		let var = "GATEKEEPER_TEST_SECRET_REQUIRED";
		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
		let err = require_secret_env(var).unwrap_err();
		let msg = err.to_string();
		assert!(msg.contains(var));
		assert!(msg.contains("_FILE"));
	}
}
