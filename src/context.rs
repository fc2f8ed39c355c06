// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context passed to the `DNSRecord` controller.
//!
//! The context is deliberately small: Infoblox clients are built per
//! reconciliation from the credential secret each `DNSRecord` references,
//! so nothing backend-specific is shared between reconciliations.

use kube::Client;
use tokio_util::sync::CancellationToken;

/// Shared context for all `DNSRecord` reconciliations.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Fired on shutdown; in-flight reconciliations abort at the next backend call
    pub cancel: CancellationToken,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }
}
