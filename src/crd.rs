// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for Infoblox-managed DNS records.
//!
//! A [`DNSRecord`] describes the complete value set of one record type for one
//! DNS name. The controller converges the Infoblox grid to that set and
//! persists the resolved zone in the status so later reconciliations (and the
//! final delete) stay anchored to the same zone.
//!
//! # Example
//!
//! ```rust
//! use ibdns::crd::{DNSRecordSpec, SecretReference};
//!
//! let spec = DNSRecordSpec {
//!     secret_ref: SecretReference {
//!         name: "infoblox-credentials".to_string(),
//!         namespace: None,
//!     },
//!     zone: None,
//!     dns_name: "api.example.com".to_string(),
//!     record_type: "A".to_string(),
//!     values: vec!["192.0.2.10".to_string(), "192.0.2.11".to_string()],
//!     ttl: Some(300),
//! };
//! assert_eq!(spec.values.len(), 2);
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the `Secret` holding the Infoblox credential bundle.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret. Defaults to the namespace of the `DNSRecord`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `DNSRecord` declares the records of one type for one DNS name.
///
/// # Example
///
/// ```yaml
/// apiVersion: dns.ibdns.io/v1alpha1
/// kind: DNSRecord
/// metadata:
///   name: api-example-com
///   namespace: apps
/// spec:
///   secretRef:
///     name: infoblox-credentials
///   dnsName: api.example.com
///   recordType: A
///   values:
///     - 192.0.2.10
///     - 192.0.2.11
///   ttl: 300
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[kube(
    group = "dns.ibdns.io",
    version = "v1alpha1",
    kind = "DNSRecord",
    namespaced,
    doc = "DNSRecord declares the complete set of values of one record type (A, AAAA, CNAME or TXT) for one DNS name in an Infoblox grid."
)]
#[kube(status = "DNSRecordStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordSpec {
    /// Secret with the Infoblox credential bundle (username, password, host, ...).
    pub secret_ref: SecretReference,

    /// Zone that owns the record. Discovered by longest suffix match when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Fully qualified DNS name (e.g., "api.example.com").
    pub dns_name: String,

    /// Record type: A, AAAA, CNAME or TXT.
    pub record_type: String,

    /// Desired record values. An empty list removes every record of the type.
    #[serde(default)]
    pub values: Vec<String>,

    /// Time To Live in seconds. The zone default is used when omitted; 0 is a literal TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 2_147_483_647))]
    pub ttl: Option<u32>,
}

/// Lifecycle operation recorded in the status.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum LastOperationType {
    Create,
    Reconcile,
    Delete,
    Migrate,
    Restore,
}

impl fmt::Display for LastOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "Create",
            Self::Reconcile => "Reconcile",
            Self::Delete => "Delete",
            Self::Migrate => "Migrate",
            Self::Restore => "Restore",
        };
        f.write_str(s)
    }
}

/// Outcome of the last lifecycle operation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum LastOperationState {
    Succeeded,
    Error,
}

/// The last lifecycle operation performed on a `DNSRecord`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LastOperation {
    pub r#type: LastOperationType,
    pub state: LastOperationState,

    /// Human-readable description of the outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the operation finished (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g., "Ready").
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// `DNSRecord` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordStatus {
    /// Zone the record was converged in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl DNSRecord {
    /// Zone persisted by the last successful reconciliation.
    #[must_use]
    pub fn status_zone(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.zone.as_deref())
    }

    /// Type of the last completed lifecycle operation.
    #[must_use]
    pub fn last_operation_type(&self) -> Option<LastOperationType> {
        self.status
            .as_ref()
            .and_then(|s| s.last_operation.as_ref())
            .map(|op| op.r#type)
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
