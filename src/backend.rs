// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The DNS backend contract consumed by the reconciliation engine.
//!
//! The engine only ever talks to a [`DnsBackend`]; [`crate::infoblox::InfobloxClient`]
//! is the production implementation and the engine tests use an in-memory fake.
//! Implementations are constructed by the caller and handed to the engine by
//! reference, there is no process-wide connector.

use crate::dns_errors::DnsError;
use crate::record::{Record, RecordType, Zone};

/// Object CRUD over an authoritative DNS backend.
#[async_trait::async_trait]
pub trait DnsBackend: Send + Sync {
    /// List every authoritative zone visible to the client.
    ///
    /// Zone FQDNs are returned normalized (see [`crate::record::normalize_hostname`]).
    ///
    /// # Errors
    ///
    /// Returns [`DnsError::Backend`] if the listing cannot be read.
    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError>;

    /// List the records of `record_type` owned by `name` in `zone`.
    ///
    /// Implementations may return records for other names; callers filter with
    /// [`crate::record::RecordSet::for_name`].
    ///
    /// # Errors
    ///
    /// Returns [`DnsError::Backend`] if the listing cannot be read.
    async fn list_records(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>, DnsError>;

    /// Create `record` in `zone` and return it with its backend id assigned.
    ///
    /// # Errors
    ///
    /// Returns [`DnsError::Backend`] if the backend rejects the object.
    async fn create_record(&self, zone: &str, record: &Record) -> Result<Record, DnsError>;

    /// Delete the record with backend id `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DnsError::Backend`] if the deletion fails.
    async fn delete_record(&self, id: &str) -> Result<(), DnsError>;
}
