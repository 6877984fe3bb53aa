// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The verify-and-grant workflow.
//!
//! [`LinkingWorkflow`] drives one [`LinkSession`] through the provider steps.
//! It owns no state of its own: every call reloads what it needs from the
//! stores and persists the session before returning, so a callback can be
//! served by any instance and a retried request is never double-counted.
//!
//! [`LinkSession`]: gatekeeper_linking_core::LinkSession

pub mod error;
pub mod testing;
pub mod workflow;

pub use error::WorkflowError;
pub use workflow::{LinkingWorkflow, ProviderAdapters, WorkflowStores};
