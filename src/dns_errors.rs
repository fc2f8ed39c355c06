// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS operation and Infoblox WAPI error types for ibdns.
//!
//! This module provides specialized error types for:
//! - Configuration problems an operator has to fix (missing credentials,
//!   unsupported record types, names outside every managed zone)
//! - Infoblox WAPI failures (connectivity, timeouts, unexpected responses,
//!   authorization)
//! - Cancellation of an in-flight reconciliation
//!
//! The [`DnsError::is_retryable`] classification is what the actuator uses to
//! decide between a fixed-delay requeue and a terminal error.

use thiserror::Error;

/// Errors caused by configuration or desired-state input.
///
/// These are never retried: repeating the operation cannot succeed until an
/// operator changes the credential bundle or the `DNSRecord` resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is missing from the credential bundle
    #[error("no {key} found in credential bundle")]
    MissingCredential {
        /// The missing key (e.g., "username")
        key: String,
    },

    /// An optional credential bundle key has a value that cannot be parsed
    #[error("invalid value for '{key}' in credential bundle: {reason}")]
    InvalidConfig {
        /// The offending key
        key: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// The desired record type is not one of A, AAAA, CNAME, TXT
    #[error("record type {record_type} is not supported")]
    UnsupportedRecordType {
        /// The rejected record type string
        record_type: String,
    },

    /// A desired value is not valid for its record type (e.g., malformed IPv4)
    #[error("invalid {record_type} value '{value}': {reason}")]
    InvalidRecordValue {
        /// Record type the value was given for
        record_type: String,
        /// The rejected value
        value: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// No managed zone is a suffix of the record name
    #[error("could not find DNS managed zone for name {name}")]
    NoMatchingZone {
        /// The record name that could not be placed
        name: String,
    },

    /// The record name does not lie in the zone it is written to
    #[error("name {name} is not in zone {zone}")]
    NameOutsideZone {
        /// The record name
        name: String,
        /// The explicit or persisted zone
        zone: String,
    },
}

/// Errors returned by the DNS backend (Infoblox WAPI).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The HTTP client could not reach the appliance
    #[error("HTTP connection to {endpoint} failed: {reason}")]
    ConnectionFailed {
        /// The WAPI endpoint that couldn't be reached
        endpoint: String,
        /// Reason for the connection failure
        reason: String,
    },

    /// A WAPI request exceeded the configured timeout
    #[error("HTTP request to {endpoint} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The WAPI endpoint that timed out
        endpoint: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The appliance rejected the credentials (HTTP 401/403)
    #[error("authorization against {endpoint} failed (HTTP {status_code})")]
    AuthorizationFailed {
        /// The WAPI endpoint that rejected the request
        endpoint: String,
        /// HTTP status code (401 or 403)
        status_code: u16,
    },

    /// The appliance returned a non-success status that maps to no other variant
    #[error("unexpected HTTP response from {endpoint}: {status_code} {reason}")]
    UnexpectedResponse {
        /// The WAPI endpoint that returned the response
        endpoint: String,
        /// HTTP status code
        status_code: u16,
        /// Response body or error message
        reason: String,
    },

    /// A success response whose body does not have the expected shape
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse {
        /// The WAPI endpoint that returned the body
        endpoint: String,
        /// Decoding failure
        reason: String,
    },

    /// Two zones normalize to the same FQDN
    #[error("backend returned zone '{fqdn}' more than once")]
    DuplicateZone {
        /// The normalized FQDN that occurred twice
        fqdn: String,
    },
}

impl BackendError {
    /// Returns true for failures that repeating the request cannot fix.
    ///
    /// The actuator still retries these (it does not distinguish them from
    /// transient failures); the flag only feeds status reasons and metrics.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::AuthorizationFailed { .. })
    }
}

/// Composite error type for every engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// Configuration or desired-state error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Backend call failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The ambient cancellation signal fired before the operation completed
    #[error("operation cancelled")]
    Cancelled,
}

impl DnsError {
    /// Returns true if the operation should be retried after a delay.
    ///
    /// Every backend failure is retryable at this layer, including
    /// authorization failures. Configuration errors and cancellation are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Returns the Kubernetes status reason code for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Config(ConfigError::MissingCredential { .. }) => "MissingCredential",
            Self::Config(ConfigError::InvalidConfig { .. }) => "InvalidConfig",
            Self::Config(ConfigError::UnsupportedRecordType { .. }) => "UnsupportedRecordType",
            Self::Config(ConfigError::InvalidRecordValue { .. }) => "InvalidRecordValue",
            Self::Config(ConfigError::NoMatchingZone { .. }) => "NoMatchingZone",
            Self::Config(ConfigError::NameOutsideZone { .. }) => "NameOutsideZone",

            Self::Backend(BackendError::ConnectionFailed { .. }) => "BackendUnreachable",
            Self::Backend(BackendError::RequestTimeout { .. }) => "BackendTimeout",
            Self::Backend(BackendError::AuthorizationFailed { .. }) => "BackendAuthFailed",
            Self::Backend(BackendError::UnexpectedResponse { .. }) => "BackendUnexpectedResponse",
            Self::Backend(BackendError::InvalidResponse { .. }) => "BackendInvalidResponse",
            Self::Backend(BackendError::DuplicateZone { .. }) => "BackendDuplicateZone",

            Self::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
#[path = "dns_errors_tests.rs"]
mod dns_errors_tests;
