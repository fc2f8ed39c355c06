// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `DNSRecord` controller.
//!
//! Wires the kube-runtime [`Controller`] to the [`Actuator`]:
//!
//! 1. Finalizer management (added on apply, removed after cleanup)
//! 2. Credential secret lookup and Infoblox client construction
//! 3. Reconcile / Restore / Migrate on apply, Delete on cleanup
//! 4. Status patch persisting the resolved zone and the last operation
//! 5. Metrics and the requeue policy

use crate::config::InfobloxConfig;
use crate::constants::{
    DNS_RECORD_FINALIZER, ERROR_REQUEUE_DURATION_SECS, KIND_DNS_RECORD, OPERATION_ANNOTATION,
    OPERATION_MIGRATE, OPERATION_RESTORE, RECONCILED_REQUEUE_SECS,
};
use crate::context::Context;
use crate::crd::{DNSRecord, LastOperationState, LastOperationType};
use crate::dns_errors::DnsError;
use crate::infoblox::InfobloxClient;
use crate::reconcilers::retry::retry_api_call;
use crate::reconcilers::status::DNSRecordStatusUpdater;
use crate::reconcilers::{Actuator, ActuatorError, DesiredRecord};
use crate::record::Ttl;
use crate::status_reasons::{
    REASON_INVALID_OPERATION, REASON_MIGRATED, REASON_RECONCILED, REASON_RESTORED,
    REASON_SECRET_UNAVAILABLE,
};
use anyhow::{anyhow, Result};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::runtime::finalizer;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Reconciliation error
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error("unknown dns.ibdns.io/operation annotation value {0:?}")]
    InvalidOperation(String),

    #[error("credential secret {name} unavailable: {message}")]
    SecretUnavailable { name: String, message: String },

    #[error(transparent)]
    Kube(#[from] anyhow::Error),
}

impl ReconcileError {
    /// Delay before the next attempt, `None` when only a spec change can help.
    #[must_use]
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            Self::Actuator(ActuatorError::Terminal(_)) | Self::InvalidOperation(_) => None,
            Self::Actuator(e @ ActuatorError::RequeueAfter { .. }) => e.requeue_after(),
            Self::Actuator(ActuatorError::Cancelled)
            | Self::SecretUnavailable { .. }
            | Self::Kube(_) => Some(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS)),
        }
    }

    /// Condition reason recorded in the status.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Actuator(e) => e.status_reason(),
            Self::InvalidOperation(_) => REASON_INVALID_OPERATION,
            Self::SecretUnavailable { .. } => REASON_SECRET_UNAVAILABLE,
            Self::Kube(_) => "KubernetesApiError",
        }
    }
}

impl From<DnsError> for ReconcileError {
    fn from(error: DnsError) -> Self {
        Self::Actuator(ActuatorError::from(error))
    }
}

/// Map a reconciliation error to the controller's next action.
#[must_use]
pub fn action_for_error(err: &ReconcileError) -> Action {
    match err.requeue_after() {
        Some(delay) => Action::requeue(delay),
        None => Action::await_change(),
    }
}

#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy(record: Arc<DNSRecord>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    let action = action_for_error(err);
    error!(
        error = %err,
        namespace = ?record.namespace(),
        name = %record.name_any(),
        reason = err.status_reason(),
        "DNSRecord reconciliation failed, next action: {action:?}"
    );
    action
}

/// Build the engine input from a `DNSRecord`.
#[must_use]
pub fn desired_record(record: &DNSRecord) -> DesiredRecord {
    DesiredRecord {
        name: record.spec.dns_name.clone(),
        record_type: record.spec.record_type.clone(),
        values: record.spec.values.clone(),
        ttl: Ttl::from_option(record.spec.ttl),
        explicit_zone: record.spec.zone.clone(),
        prior_zone: record.status_zone().map(str::to_string),
        last_operation: record.last_operation_type(),
    }
}

/// Operation to run when the resource is applied.
///
/// The `dns.ibdns.io/operation` annotation selects Restore or Migrate for as
/// long as it is present. Otherwise the operation is `Create` until the first
/// one succeeds, `Reconcile` afterwards.
///
/// # Errors
///
/// Returns [`ReconcileError::InvalidOperation`] for an unknown annotation value.
pub fn apply_operation(record: &DNSRecord) -> Result<LastOperationType, ReconcileError> {
    if let Some(value) = record.annotations().get(OPERATION_ANNOTATION) {
        return match value.trim().to_ascii_lowercase().as_str() {
            OPERATION_RESTORE => Ok(LastOperationType::Restore),
            OPERATION_MIGRATE => Ok(LastOperationType::Migrate),
            _ => Err(ReconcileError::InvalidOperation(value.clone())),
        };
    }

    let last = record.status.as_ref().and_then(|s| s.last_operation.as_ref());
    match last {
        None => Ok(LastOperationType::Create),
        Some(op)
            if op.r#type == LastOperationType::Create
                && op.state == LastOperationState::Error =>
        {
            Ok(LastOperationType::Create)
        }
        Some(_) => Ok(LastOperationType::Reconcile),
    }
}

/// Convert secret data into the credential bundle.
#[must_use]
pub fn secret_bundle(secret: &Secret) -> BTreeMap<String, Vec<u8>> {
    secret
        .data
        .as_ref()
        .map(|data| {
            data.iter()
                .map(|(key, ByteString(value))| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Build an [`Actuator`] from the credential secret the record references.
async fn load_actuator(ctx: &Context, record: &DNSRecord) -> Result<Actuator, ReconcileError> {
    let secret_ref = &record.spec.secret_ref;
    let namespace = secret_ref
        .namespace
        .clone()
        .or_else(|| record.namespace())
        .ok_or_else(|| anyhow!("{KIND_DNS_RECORD} {} has no namespace", record.name_any()))?;
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), &namespace);

    let secret = retry_api_call(
        || secrets.get(&secret_ref.name),
        &format!("get secret {namespace}/{}", secret_ref.name),
    )
    .await
    .map_err(|e| ReconcileError::SecretUnavailable {
        name: format!("{namespace}/{}", secret_ref.name),
        message: format!("{e:#}"),
    })?;

    let config =
        InfobloxConfig::from_secret_data(&secret_bundle(&secret)).map_err(DnsError::from)?;
    let client = InfobloxClient::new(&config)?;
    debug!(host = %config.credentials.host, view = %config.view, "Built Infoblox client");

    Ok(Actuator::new(Arc::new(client), config.view))
}

/// Run Reconcile, Restore or Migrate and report the status reason and message.
async fn run_apply(
    ctx: &Context,
    record: &DNSRecord,
    operation: LastOperationType,
    updater: &mut DNSRecordStatusUpdater,
) -> Result<(), ReconcileError> {
    let desired = desired_record(record);
    let actuator = load_actuator(ctx, record).await?;

    if operation == LastOperationType::Migrate {
        actuator.migrate(&desired);
        updater.succeeded(operation, REASON_MIGRATED, "Backend state left untouched");
        return Ok(());
    }

    let outcome = if operation == LastOperationType::Restore {
        actuator.restore(&desired, &ctx.cancel).await?
    } else {
        actuator.reconcile(&desired, &ctx.cancel).await?
    };

    let reason = if operation == LastOperationType::Restore {
        REASON_RESTORED
    } else {
        REASON_RECONCILED
    };
    let present = outcome.summary.created + outcome.summary.unchanged;
    updater.set_zone(&outcome.zone);
    updater.succeeded(
        operation,
        reason,
        &format!("{present} record(s) in zone {}", outcome.zone),
    );
    Ok(())
}

async fn apply(ctx: &Context, record: &DNSRecord) -> Result<Action, ReconcileError> {
    let mut updater = DNSRecordStatusUpdater::new(record);
    updater.set_observed_generation(record.metadata.generation);

    let result = match apply_operation(record) {
        Ok(operation) => run_apply(ctx, record, operation, &mut updater)
            .await
            .map_err(|e| (operation, e)),
        Err(e) => Err((LastOperationType::Reconcile, e)),
    };

    match result {
        Ok(()) => {
            updater.apply(&ctx.client).await?;
            info!(
                "Successfully reconciled {KIND_DNS_RECORD}: {}",
                record.name_any()
            );
            Ok(Action::requeue(Duration::from_secs(RECONCILED_REQUEUE_SECS)))
        }
        Err((_, e @ ReconcileError::Actuator(ActuatorError::Cancelled))) => Err(e),
        Err((operation, e)) => {
            updater.failed(operation, e.status_reason(), &e.to_string());
            if let Err(patch_err) = updater.apply(&ctx.client).await {
                warn!(
                    error = %patch_err,
                    "Failed to record error status for {}",
                    record.name_any()
                );
            }
            Err(e)
        }
    }
}

async fn cleanup(ctx: &Context, record: &DNSRecord) -> Result<Action, ReconcileError> {
    let desired = desired_record(record);
    if desired.explicit_zone.is_none() && desired.prior_zone.is_none() {
        info!(
            "{KIND_DNS_RECORD} {} was never anchored to a zone, removing finalizer",
            record.name_any()
        );
        return Ok(Action::await_change());
    }

    let result = match load_actuator(ctx, record).await {
        Ok(actuator) => actuator
            .delete(&desired, &ctx.cancel)
            .await
            .map_err(ReconcileError::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(zone) => {
            info!(
                zone = ?zone,
                "Successfully deleted {KIND_DNS_RECORD} from Infoblox: {}",
                record.name_any()
            );
            Ok(Action::await_change())
        }
        Err(e @ ReconcileError::Actuator(ActuatorError::Cancelled)) => Err(e),
        Err(e) => {
            let mut updater = DNSRecordStatusUpdater::new(record);
            updater.failed(LastOperationType::Delete, e.status_reason(), &e.to_string());
            if let Err(patch_err) = updater.apply(&ctx.client).await {
                warn!(
                    error = %patch_err,
                    "Failed to record error status for {}",
                    record.name_any()
                );
            }
            Err(e)
        }
    }
}

/// Operation label used for metrics.
fn metrics_operation(record: &DNSRecord) -> String {
    if record.metadata.deletion_timestamp.is_some() {
        return LastOperationType::Delete.to_string();
    }
    apply_operation(record).map_or_else(
        |_| LastOperationType::Reconcile.to_string(),
        |op| op.to_string(),
    )
}

/// Reconciliation entry point with finalizer support.
async fn reconcile(record: Arc<DNSRecord>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let operation = metrics_operation(&record);
    let namespace = record
        .namespace()
        .ok_or_else(|| anyhow!("{KIND_DNS_RECORD} {} has no namespace", record.name_any()))?;
    let api: Api<DNSRecord> = Api::namespaced(ctx.client.clone(), &namespace);

    let result = finalizer(&api, DNS_RECORD_FINALIZER, record.clone(), |event| async {
        match event {
            finalizer::Event::Apply(rec) => apply(&ctx, &rec).await,
            finalizer::Event::Cleanup(rec) => cleanup(&ctx, &rec).await,
        }
    })
    .await
    .map_err(|e: finalizer::Error<ReconcileError>| match e {
        finalizer::Error::ApplyFailed(err) | finalizer::Error::CleanupFailed(err) => err,
        finalizer::Error::AddFinalizer(err) | finalizer::Error::RemoveFinalizer(err) => {
            ReconcileError::from(anyhow!("Finalizer error: {err}"))
        }
        finalizer::Error::UnnamedObject => {
            ReconcileError::from(anyhow!("{KIND_DNS_RECORD} has no name"))
        }
        finalizer::Error::InvalidFinalizer => {
            ReconcileError::from(anyhow!("Invalid finalizer for {KIND_DNS_RECORD}"))
        }
    });

    let duration = start.elapsed();
    match &result {
        Ok(_) => crate::metrics::record_reconciliation_success(&operation, duration),
        Err(e) => {
            crate::metrics::record_reconciliation_error(&operation, e.status_reason(), duration);
        }
    }
    result
}

/// Run the `DNSRecord` controller until the context's token is cancelled.
///
/// Watches a single namespace when `namespace` is set, all namespaces otherwise.
///
/// # Errors
///
/// Returns an error if the controller cannot be started.
pub async fn run_controller(ctx: Arc<Context>, namespace: Option<String>) -> Result<()> {
    info!(namespace = ?namespace, "Starting {KIND_DNS_RECORD} controller");

    let api: Api<DNSRecord> = match &namespace {
        Some(ns) => Api::namespaced(ctx.client.clone(), ns),
        None => Api::all(ctx.client.clone()),
    };

    let shutdown = ctx.cancel.clone();
    Controller::new(api, WatcherConfig::default())
        .graceful_shutdown_on(async move { shutdown.cancelled().await })
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => debug!(object = %obj.name, ?action, "Reconciled"),
                Err(e) => debug!(error = %e, "Controller event failed"),
            }
        })
        .await;

    info!("{KIND_DNS_RECORD} controller stopped");
    Ok(())
}

#[cfg(test)]
#[path = "record_controller_tests.rs"]
mod record_controller_tests;
