// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record-set convergence: make the backend's records for one name/type pair
//! match a desired value set.
//!
//! One call performs a single fresh read followed by sequential mutations:
//!
//! 1. List the observed records for `(zone, name, type)`.
//! 2. Collapse observed duplicates (same canonical value); the surplus copies
//!    are stale.
//! 3. An observed record is kept when its canonical value is desired and its
//!    TTL equals the desired TTL. Everything else is stale.
//! 4. Delete stale records, then create missing values. Both phases always
//!    run; within a phase every operation is attempted and the first error is
//!    remembered.
//!
//! Partial progress is never rolled back. Re-running the call converges the
//! remainder, and a call against an already converged backend performs no
//! mutations.

use super::run_cancellable;
use crate::backend::DnsBackend;
use crate::dns_errors::DnsError;
use crate::metrics;
use crate::record::{normalize_hostname, Record, RecordSet, RecordType, Ttl};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Desired state of one `(zone, name, type)` record set.
#[derive(Clone, Debug)]
pub struct ConvergeRequest<'a> {
    pub zone: &'a str,
    pub name: &'a str,
    /// Record type as given by the user (e.g., "A", "txt")
    pub record_type: &'a str,
    /// Desired values; may be empty to remove every record
    pub values: &'a [String],
    pub ttl: Ttl,
    pub view: &'a str,
}

/// Mutations performed by a successful convergence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvergeSummary {
    pub created: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl ConvergeSummary {
    /// True if the backend already matched the desired state.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.deleted == 0
    }
}

/// The mutations needed to converge an observed set.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConvergePlan {
    /// Observed records to delete, stale values and surplus duplicates
    pub to_delete: Vec<Record>,
    /// Canonical values to create
    pub to_create: Vec<String>,
    /// Observed records that already match
    pub unchanged: usize,
}

/// Diff an observed record set against canonical desired values.
///
/// `desired` must already be canonical and free of duplicates.
#[must_use]
pub fn plan(observed: RecordSet, desired: &[String], ttl: Ttl) -> ConvergePlan {
    let (observed, mut to_delete) = observed.collapse_duplicates();

    let mut satisfied = HashSet::new();
    let mut unchanged = 0;
    for record in observed {
        let value = record.canonical_value();
        if record.ttl == ttl && desired.contains(&value) {
            satisfied.insert(value);
            unchanged += 1;
        } else {
            to_delete.push(record);
        }
    }

    let to_create = desired
        .iter()
        .filter(|value| !satisfied.contains(*value))
        .cloned()
        .collect();

    ConvergePlan {
        to_delete,
        to_create,
        unchanged,
    }
}

/// Validate and canonicalize desired values, dropping duplicates.
///
/// # Errors
///
/// Returns [`crate::dns_errors::ConfigError::InvalidRecordValue`] for the
/// first value that is not valid for `record_type`.
pub fn canonical_values(record_type: RecordType, values: &[String]) -> Result<Vec<String>, DnsError> {
    let mut seen = HashSet::with_capacity(values.len());
    let mut canonical = Vec::with_capacity(values.len());
    for value in values {
        let value = record_type.canonicalize(value)?;
        if seen.insert(value.clone()) {
            canonical.push(value);
        }
    }
    Ok(canonical)
}

/// Converge the backend's record set for `request` to its desired values.
///
/// # Errors
///
/// - [`crate::dns_errors::ConfigError::UnsupportedRecordType`] or
///   [`crate::dns_errors::ConfigError::InvalidRecordValue`] before any backend call
/// - [`DnsError::Backend`] with the first failure after both phases ran
/// - [`DnsError::Cancelled`] as soon as `cancel` fires; remaining operations
///   are skipped
pub async fn converge(
    backend: &dyn DnsBackend,
    request: &ConvergeRequest<'_>,
    cancel: &CancellationToken,
) -> Result<ConvergeSummary, DnsError> {
    let record_type: RecordType = request.record_type.parse()?;
    let desired = canonical_values(record_type, request.values)?;
    let name = normalize_hostname(request.name);

    let observed = run_cancellable(
        cancel,
        backend.list_records(request.zone, &name, record_type),
    )
    .await?;
    let observed = RecordSet::for_name(observed, &name, record_type);

    let plan = plan(observed, &desired, request.ttl);
    debug!(
        zone = %request.zone,
        name = %name,
        record_type = %record_type,
        to_delete = plan.to_delete.len(),
        to_create = plan.to_create.len(),
        unchanged = plan.unchanged,
        "Computed record set changes"
    );

    let mut summary = ConvergeSummary {
        unchanged: plan.unchanged,
        ..ConvergeSummary::default()
    };
    let mut first_error: Option<DnsError> = None;

    for record in &plan.to_delete {
        let result = run_cancellable(cancel, backend.delete_record(&record.id)).await;
        metrics::record_backend_mutation(record_type.as_str(), "delete", result.is_ok());
        match result {
            Ok(()) => summary.deleted += 1,
            Err(DnsError::Cancelled) => return Err(DnsError::Cancelled),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    for value in &plan.to_create {
        let pending = Record::pending(record_type, &name, value, request.ttl, Some(request.view));
        let result = run_cancellable(cancel, backend.create_record(request.zone, &pending)).await;
        metrics::record_backend_mutation(record_type.as_str(), "create", result.is_ok());
        match result {
            Ok(_) => summary.created += 1,
            Err(DnsError::Cancelled) => return Err(DnsError::Cancelled),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

#[cfg(test)]
#[path = "converger_tests.rs"]
mod converger_tests;
