// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS record reconciliation engine.
//!
//! # Architecture
//!
//! ```text
//! Actuator::reconcile(desired)
//!   ├─ zone_resolver::resolve(name, explicit zone, prior zone) → zone
//!   ├─ converger::converge(zone, name, type, values, ttl)
//!   └─ converger::converge(zone, "comment-" + name, TXT, [])   (first reconciliation only)
//! ```
//!
//! - [`zone_resolver`] - Maps a name to the most specific managed zone
//! - [`converger`] - Diffs and applies one `(zone, name, type)` record set
//! - [`actuator`] - Reconcile, Delete, Restore and Migrate, plus retry classification
//! - [`retry`] - Backoff schedules for WAPI and Kubernetes API calls
//! - [`status`] - `DNSRecord` status conditions and the single-patch status updater
//!
//! Every call re-reads backend state; nothing is cached between calls. Calls
//! for different names are independent. The caller serializes calls for the
//! same name.

pub mod actuator;
pub mod converger;
pub mod retry;
pub mod status;
pub mod zone_resolver;

#[cfg(test)]
pub(crate) mod fake_backend;

pub use actuator::{Actuator, ActuatorError, DesiredRecord, ReconcileOutcome};
pub use converger::{converge, ConvergeRequest, ConvergeSummary};
pub use zone_resolver::{find_zone_for_name, resolve, resolve_for_delete};

use crate::dns_errors::DnsError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run a backend call unless `cancel` has fired, aborting it if `cancel`
/// fires while it is in flight.
pub(crate) async fn run_cancellable<T, F>(
    cancel: &CancellationToken,
    call: F,
) -> Result<T, DnsError>
where
    F: Future<Output = Result<T, DnsError>>,
{
    if cancel.is_cancelled() {
        return Err(DnsError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DnsError::Cancelled),
        result = call => result,
    }
}
