// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the ibdns operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `DNSRecord` CRD
pub const API_GROUP: &str = "dns.ibdns.io";

/// API version for the `DNSRecord` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Kind name for `DNSRecord` resource
pub const KIND_DNS_RECORD: &str = "DNSRecord";

/// Finalizer placed on every `DNSRecord` so backend records are torn down before removal
pub const DNS_RECORD_FINALIZER: &str = "dns.ibdns.io/finalizer";

/// Annotation requesting a one-shot lifecycle operation (`restore` or `migrate`)
pub const OPERATION_ANNOTATION: &str = "dns.ibdns.io/operation";

/// Annotation value selecting the Restore operation
pub const OPERATION_RESTORE: &str = "restore";

/// Annotation value selecting the Migrate operation
pub const OPERATION_MIGRATE: &str = "migrate";

// ============================================================================
// DNS Record Constants
// ============================================================================

/// Prefix of the legacy ownership TXT record (`comment-<name>`)
pub const META_RECORD_PREFIX: &str = "comment-";

/// Record type of the legacy ownership record
pub const META_RECORD_TYPE: &str = "TXT";

/// DNS view used when the credential bundle names none
pub const DEFAULT_VIEW: &str = "default";

// ============================================================================
// Infoblox WAPI Constants
// ============================================================================

/// Default WAPI HTTPS port
pub const DEFAULT_WAPI_PORT: u16 = 443;

/// Default WAPI version
pub const DEFAULT_WAPI_VERSION: &str = "2.10";

/// Default per-request timeout for WAPI calls
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default number of pooled idle connections per host
pub const DEFAULT_HTTP_POOL_CONNECTIONS: usize = 10;

/// WAPI query parameter that forces a read to be served by the grid master
pub const WAPI_PROXY_SEARCH_PARAM: &str = "_proxy_search";

/// Grid master value for [`WAPI_PROXY_SEARCH_PARAM`]
pub const WAPI_PROXY_SEARCH_GRID_MASTER: &str = "GM";

// ============================================================================
// Controller Timing Constants
// ============================================================================

/// Fixed requeue delay after a backend failure, used instead of exponential backoff
pub const PROVIDER_ERROR_REQUEUE_SECS: u64 = 30;

/// Requeue delay for Kubernetes API failures and cancelled reconciliations
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 60;

/// Periodic drift check interval for reconciled records (5 minutes)
pub const RECONCILED_REQUEUE_SECS: u64 = 300;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of Tokio worker threads for the controller runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default bind address for the Prometheus metrics endpoint
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Path of the Prometheus metrics endpoint
pub const METRICS_PATH: &str = "/metrics";
