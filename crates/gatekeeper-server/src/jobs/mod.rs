// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background jobs.

pub mod cleanup;

pub use cleanup::{CleanupJob, CleanupReport};
