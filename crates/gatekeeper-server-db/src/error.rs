// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatekeeper_linking_core::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
	/// Map a unique-index violation to `Conflict`, anything else to `Sqlx`.
	pub(crate) fn from_write(e: sqlx::Error, conflict: impl FnOnce() -> String) -> Self {
		match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(conflict())
			}
			_ => DbError::Sqlx(e),
		}
	}
}

impl From<DbError> for StoreError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::Conflict(msg) => StoreError::Conflict(msg),
			DbError::NotFound(msg) => StoreError::NotFound(msg),
			other => StoreError::Backend(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conflict_and_not_found_keep_their_meaning() {
		assert!(matches!(
			StoreError::from(DbError::Conflict("taken".to_string())),
			StoreError::Conflict(_)
		));
		assert!(matches!(
			StoreError::from(DbError::NotFound("linkage".to_string())),
			StoreError::NotFound(_)
		));
		assert!(matches!(
			StoreError::from(DbError::Internal("bad row".to_string())),
			StoreError::Backend(_)
		));
	}
}
