// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition types and reasons for `DNSRecord` resources.
//!
//! Every `DNSRecord` carries a single `type: Ready` condition. Success reasons
//! are defined here; failure reasons come from
//! [`crate::dns_errors::DnsError::status_reason`] (e.g., `NoMatchingZone`,
//! `BackendUnreachable`).
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   zone: example.com
//!   lastOperation:
//!     type: Reconcile
//!     state: Succeeded
//!   conditions:
//!     - type: Ready
//!       status: "True"
//!       reason: Reconciled
//!       message: "2 record(s) in zone example.com"
//! ```

/// The encompassing condition type.
pub const CONDITION_TYPE_READY: &str = "Ready";

pub const CONDITION_STATUS_TRUE: &str = "True";
pub const CONDITION_STATUS_FALSE: &str = "False";

/// The backend record set matches the resource.
pub const REASON_RECONCILED: &str = "Reconciled";

/// The record set was re-established after a migration.
pub const REASON_RESTORED: &str = "Restored";

/// The resource was handed over; backend state was not touched.
pub const REASON_MIGRATED: &str = "Migrated";

/// The credential secret could not be read.
pub const REASON_SECRET_UNAVAILABLE: &str = "SecretUnavailable";

/// The operation annotation holds an unknown value.
pub const REASON_INVALID_OPERATION: &str = "InvalidOperation";

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;
