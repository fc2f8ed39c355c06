// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Owning-zone resolution for a record name.
//!
//! Resolution policy, in order:
//!
//! 1. An explicit zone on the resource is returned verbatim.
//! 2. A zone persisted by an earlier successful reconciliation is returned
//!    verbatim, so a record stays anchored even if a more specific zone is
//!    created later.
//! 3. Otherwise the backend's zones are listed and the longest zone that is a
//!    suffix of the name (on a label boundary) wins.
//!
//! Errors are returned, never logged.

use super::run_cancellable;
use crate::backend::DnsBackend;
use crate::dns_errors::{BackendError, ConfigError, DnsError};
use crate::record::{is_name_in_zone, Zone};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Determine the zone that owns `name`.
///
/// # Errors
///
/// - [`ConfigError::NoMatchingZone`] if discovery finds no zone for the name
/// - [`DnsError::Backend`] if the zone listing fails or contains duplicates
/// - [`DnsError::Cancelled`] if `cancel` fires during discovery
pub async fn resolve(
    backend: &dyn DnsBackend,
    name: &str,
    explicit_zone: Option<&str>,
    prior_zone: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, DnsError> {
    if let Some(zone) = anchored_zone(explicit_zone, prior_zone) {
        return Ok(zone);
    }

    let zones = run_cancellable(cancel, backend.list_zones()).await?;
    let zone = find_zone_for_name(&zones, name)?.ok_or_else(|| ConfigError::NoMatchingZone {
        name: name.to_string(),
    })?;

    debug!(name = %name, zone = %zone.fqdn, candidates = zones.len(), "Discovered owning zone");
    Ok(zone.fqdn.clone())
}

/// Zone to use when tearing a record down.
///
/// Only the explicit and prior zones are considered: a record that was never
/// anchored has nothing to delete, and discovery must not turn a vanished zone
/// into a failed delete.
#[must_use]
pub fn resolve_for_delete(explicit_zone: Option<&str>, prior_zone: Option<&str>) -> Option<String> {
    anchored_zone(explicit_zone, prior_zone)
}

fn anchored_zone(explicit_zone: Option<&str>, prior_zone: Option<&str>) -> Option<String> {
    explicit_zone
        .filter(|z| !z.is_empty())
        .or(prior_zone.filter(|z| !z.is_empty()))
        .map(str::to_string)
}

/// Select the most specific zone for `name` from a zone listing.
///
/// A zone matches when `name` equals its FQDN or ends with `"." + fqdn`.
/// Comparison is case-insensitive and ignores trailing dots.
///
/// # Errors
///
/// Returns [`BackendError::DuplicateZone`] if two zones normalize to the same
/// FQDN.
pub fn find_zone_for_name<'a>(
    zones: &'a [Zone],
    name: &str,
) -> Result<Option<&'a Zone>, BackendError> {
    let mut seen = HashSet::with_capacity(zones.len());
    for zone in zones {
        if !seen.insert(zone.fqdn.to_ascii_lowercase()) {
            return Err(BackendError::DuplicateZone {
                fqdn: zone.fqdn.clone(),
            });
        }
    }

    Ok(zones
        .iter()
        .filter(|zone| is_name_in_zone(name, &zone.fqdn))
        .max_by_key(|zone| zone.fqdn.len()))
}

#[cfg(test)]
#[path = "zone_resolver_tests.rs"]
mod zone_resolver_tests;
