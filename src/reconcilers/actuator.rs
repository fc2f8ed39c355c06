// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lifecycle operations for one desired DNS record.
//!
//! The [`Actuator`] sequences zone resolution, record-set convergence and the
//! legacy ownership-marker cleanup, and is the only place that classifies
//! engine errors for retry:
//!
//! | Engine error | Result |
//! |---|---|
//! | any backend failure | [`ActuatorError::RequeueAfter`] with a fixed 30s delay |
//! | configuration error (incl. no matching zone) | [`ActuatorError::Terminal`] |
//! | cancellation | [`ActuatorError::Cancelled`] |

use super::converger::{canonical_values, converge, ConvergeRequest, ConvergeSummary};
use super::zone_resolver::{resolve, resolve_for_delete};
use crate::backend::DnsBackend;
use crate::constants::{META_RECORD_PREFIX, META_RECORD_TYPE, PROVIDER_ERROR_REQUEUE_SECS};
use crate::crd::LastOperationType;
use crate::dns_errors::DnsError;
use crate::record::{RecordType, Ttl};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Desired state of one DNS record resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DesiredRecord {
    /// Fully qualified record name
    pub name: String,
    /// Record type as written by the user
    pub record_type: String,
    pub values: Vec<String>,
    pub ttl: Ttl,
    /// Zone set on the resource, trusted without validation
    pub explicit_zone: Option<String>,
    /// Zone persisted by an earlier successful reconciliation
    pub prior_zone: Option<String>,
    /// Last completed lifecycle operation, `None` before the first one
    pub last_operation: Option<LastOperationType>,
}

/// Result of a successful Reconcile or Restore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Resolved zone, to be persisted by the caller
    pub zone: String,
    pub summary: ConvergeSummary,
    /// Whether the legacy ownership marker was checked and removed
    pub meta_record_cleaned: bool,
}

/// Failure of a lifecycle operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// Backend failure; retry after the fixed delay
    #[error("{cause} (retrying in {}s)", requeue_after.as_secs())]
    RequeueAfter {
        cause: DnsError,
        requeue_after: Duration,
    },

    /// Configuration error that needs operator intervention
    #[error(transparent)]
    Terminal(DnsError),

    /// The ambient cancellation signal fired
    #[error("reconciliation cancelled")]
    Cancelled,
}

impl ActuatorError {
    /// Delay after which the operation should be retried, if retryable.
    #[must_use]
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            Self::RequeueAfter { requeue_after, .. } => Some(*requeue_after),
            _ => None,
        }
    }

    /// Kubernetes condition reason for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::RequeueAfter { cause, .. } | Self::Terminal(cause) => cause.status_reason(),
            Self::Cancelled => DnsError::Cancelled.status_reason(),
        }
    }
}

impl From<DnsError> for ActuatorError {
    fn from(error: DnsError) -> Self {
        match error {
            DnsError::Cancelled => Self::Cancelled,
            e if e.is_retryable() => Self::RequeueAfter {
                cause: e,
                requeue_after: Duration::from_secs(PROVIDER_ERROR_REQUEUE_SECS),
            },
            e => Self::Terminal(e),
        }
    }
}

/// Whether the legacy `comment-<name>` TXT marker must be removed.
///
/// It is removed on the first reconciliation and after a `Create`.
#[must_use]
pub fn needs_meta_record_cleanup(last_operation: Option<LastOperationType>) -> bool {
    matches!(last_operation, None | Some(LastOperationType::Create))
}

/// Name of the legacy ownership marker for `name`.
///
/// A wildcard label stays in front: `*.apps.example.com` maps to
/// `*.comment-apps.example.com`.
#[must_use]
pub fn meta_record_name(name: &str) -> String {
    match name.strip_prefix("*.") {
        Some(rest) => format!("*.{META_RECORD_PREFIX}{rest}"),
        None => format!("{META_RECORD_PREFIX}{name}"),
    }
}

/// Drives DNS record lifecycle operations against one backend.
pub struct Actuator {
    backend: Arc<dyn DnsBackend>,
    view: String,
}

impl Actuator {
    #[must_use]
    pub fn new(backend: Arc<dyn DnsBackend>, view: impl Into<String>) -> Self {
        Self {
            backend,
            view: view.into(),
        }
    }

    /// Resolve the zone, converge the record set and, on the first
    /// reconciliation, remove the legacy ownership marker.
    ///
    /// Success is reported only after the marker cleanup also succeeded.
    ///
    /// # Errors
    ///
    /// See the module documentation for the error classification.
    pub async fn reconcile(
        &self,
        desired: &DesiredRecord,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ActuatorError> {
        let backend = self.backend.as_ref();

        // Invalid input fails before zone discovery touches the backend
        let record_type: RecordType = desired.record_type.parse().map_err(DnsError::from)?;
        canonical_values(record_type, &desired.values)?;

        let zone = resolve(
            backend,
            &desired.name,
            desired.explicit_zone.as_deref(),
            desired.prior_zone.as_deref(),
            cancel,
        )
        .await?;

        let summary = converge(
            backend,
            &ConvergeRequest {
                zone: &zone,
                name: &desired.name,
                record_type: &desired.record_type,
                values: &desired.values,
                ttl: desired.ttl,
                view: &self.view,
            },
            cancel,
        )
        .await?;

        let meta_record_cleaned = needs_meta_record_cleanup(desired.last_operation);
        if meta_record_cleaned {
            let meta_name = meta_record_name(&desired.name);
            let meta = converge(
                backend,
                &ConvergeRequest {
                    zone: &zone,
                    name: &meta_name,
                    record_type: META_RECORD_TYPE,
                    values: &[],
                    ttl: Ttl::Inherit,
                    view: &self.view,
                },
                cancel,
            )
            .await?;
            if meta.deleted > 0 {
                info!(zone = %zone, name = %meta_name, "Removed legacy ownership record");
            }
        }

        info!(
            zone = %zone,
            name = %desired.name,
            record_type = %desired.record_type,
            created = summary.created,
            deleted = summary.deleted,
            unchanged = summary.unchanged,
            "Reconciled DNS record"
        );

        Ok(ReconcileOutcome {
            zone,
            summary,
            meta_record_cleaned,
        })
    }

    /// Remove every record for the desired name/type.
    ///
    /// Only the explicit or persisted zone is used; a record that was never
    /// anchored to a zone is considered deleted without any backend call.
    /// Returns the zone that was cleaned, if any.
    ///
    /// # Errors
    ///
    /// See the module documentation for the error classification.
    pub async fn delete(
        &self,
        desired: &DesiredRecord,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ActuatorError> {
        let Some(zone) = resolve_for_delete(
            desired.explicit_zone.as_deref(),
            desired.prior_zone.as_deref(),
        ) else {
            info!(
                name = %desired.name,
                "DNS record was never anchored to a zone, nothing to delete"
            );
            return Ok(None);
        };

        let summary = converge(
            self.backend.as_ref(),
            &ConvergeRequest {
                zone: &zone,
                name: &desired.name,
                record_type: &desired.record_type,
                values: &[],
                ttl: desired.ttl,
                view: &self.view,
            },
            cancel,
        )
        .await?;

        info!(
            zone = %zone,
            name = %desired.name,
            record_type = %desired.record_type,
            deleted = summary.deleted,
            "Deleted DNS record"
        );
        Ok(Some(zone))
    }

    /// Re-establish backend state after a migration; same as [`Self::reconcile`].
    ///
    /// # Errors
    ///
    /// See the module documentation for the error classification.
    pub async fn restore(
        &self,
        desired: &DesiredRecord,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ActuatorError> {
        debug!(name = %desired.name, "Restoring DNS record");
        self.reconcile(desired, cancel).await
    }

    /// Hand the record over to another controller instance.
    ///
    /// Backend state is left untouched.
    pub fn migrate(&self, desired: &DesiredRecord) {
        info!(
            name = %desired.name,
            "Migrating DNS record, leaving backend state untouched"
        );
    }
}

#[cfg(test)]
#[path = "actuator_tests.rs"]
mod actuator_tests;
