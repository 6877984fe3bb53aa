// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Timestamps are stored as fixed-width RFC 3339 strings in UTC so that
//! string comparison in SQL orders them correctly.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DbError;

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(s)
		.map(|d| d.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp '{s}': {e}")))
}

pub(crate) fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>, DbError> {
	s.as_deref().map(parse_ts).transpose()
}

pub(crate) fn to_db_amount(amount: u64) -> Result<i64, DbError> {
	i64::try_from(amount).map_err(|_| DbError::Internal(format!("amount {amount} out of range")))
}

pub(crate) fn from_db_amount(amount: i64) -> Result<u64, DbError> {
	u64::try_from(amount).map_err(|_| DbError::Internal(format!("negative amount {amount}")))
}
