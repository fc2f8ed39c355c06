// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status helpers for `DNSRecord` resources.
//!
//! Conditions follow the standard Kubernetes format (`type`, `status`,
//! `reason`, `message`, `lastTransitionTime`). [`DNSRecordStatusUpdater`]
//! collects every change of one reconciliation in memory and persists them
//! with a single merge patch, skipping the API call when nothing changed.
//!
//! # Example
//!
//! ```rust,no_run
//! use ibdns::reconcilers::status::create_condition;
//!
//! let condition = create_condition("Ready", "True", "Reconciled", "2 record(s) in zone example.com");
//! assert_eq!(condition.r#type, "Ready");
//! ```

use super::retry::retry_api_call;
use crate::crd::{
    Condition, DNSRecord, DNSRecordStatus, LastOperation, LastOperationState, LastOperationType,
};
use crate::status_reasons::{
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY,
};
use anyhow::Result;
use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Create a new condition stamped with the current time.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in place.
///
/// `lastTransitionTime` is kept when the status did not change.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists, ignoring timestamps.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }

    new.iter().all(|new_cond| {
        find_condition(current, &new_cond.r#type).is_some_and(|curr_cond| {
            curr_cond.status == new_cond.status
                && curr_cond.reason == new_cond.reason
                && curr_cond.message == new_cond.message
        })
    })
}

fn last_operation_equal(current: Option<&LastOperation>, new: Option<&LastOperation>) -> bool {
    match (current, new) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.r#type == b.r#type && a.state == b.state && a.description == b.description
        }
        _ => false,
    }
}

/// Collects the status changes of one `DNSRecord` reconciliation.
pub struct DNSRecordStatusUpdater {
    namespace: String,
    name: String,
    current_status: Option<DNSRecordStatus>,
    new_status: DNSRecordStatus,
}

impl DNSRecordStatusUpdater {
    #[must_use]
    pub fn new(record: &DNSRecord) -> Self {
        let current_status = record.status.clone();
        let new_status = current_status.clone().unwrap_or_default();

        Self {
            namespace: record.namespace().unwrap_or_default(),
            name: record.name_any(),
            current_status,
            new_status,
        }
    }

    /// Persist the zone the record was converged in.
    pub fn set_zone(&mut self, zone: &str) {
        self.new_status.zone = Some(zone.to_string());
    }

    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    /// Record a successful operation and mark the resource Ready.
    pub fn succeeded(&mut self, operation: LastOperationType, reason: &str, message: &str) {
        self.set_last_operation(operation, LastOperationState::Succeeded, message);
        update_condition_in_memory(
            &mut self.new_status.conditions,
            CONDITION_TYPE_READY,
            CONDITION_STATUS_TRUE,
            reason,
            message,
        );
    }

    /// Record a failed operation and mark the resource not Ready.
    ///
    /// The persisted zone is left untouched.
    pub fn failed(&mut self, operation: LastOperationType, reason: &str, message: &str) {
        self.set_last_operation(operation, LastOperationState::Error, message);
        update_condition_in_memory(
            &mut self.new_status.conditions,
            CONDITION_TYPE_READY,
            CONDITION_STATUS_FALSE,
            reason,
            message,
        );
    }

    fn set_last_operation(
        &mut self,
        operation: LastOperationType,
        state: LastOperationState,
        description: &str,
    ) {
        self.new_status.last_operation = Some(LastOperation {
            r#type: operation,
            state,
            description: Some(description.to_string()),
            last_update_time: Some(Utc::now().to_rfc3339()),
        });
    }

    #[must_use]
    pub fn status(&self) -> &DNSRecordStatus {
        &self.new_status
    }

    /// Whether the new status differs semantically from the current one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.zone != self.new_status.zone
                    || current.observed_generation != self.new_status.observed_generation
                    || !last_operation_equal(
                        current.last_operation.as_ref(),
                        self.new_status.last_operation.as_ref(),
                    )
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// Apply the collected status with a single merge patch.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes API call fails after retries.
    pub async fn apply(&self, client: &Client) -> Result<()> {
        if !self.has_changes() {
            debug!(
                "DNSRecord {}/{} status unchanged, skipping update",
                self.namespace, self.name
            );
            return Ok(());
        }

        let api: Api<DNSRecord> = Api::namespaced(client.clone(), &self.namespace);
        let patch = json!({ "status": self.new_status });
        let patch_params = PatchParams::default();
        let merge_patch = Patch::Merge(&patch);

        retry_api_call(
            || api.patch_status(&self.name, &patch_params, &merge_patch),
            "patch DNSRecord status",
        )
        .await?;

        debug!(
            "Updated DNSRecord {}/{} status: zone={:?}",
            self.namespace, self.name, self.new_status.zone
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
