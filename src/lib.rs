// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # ibdns - Infoblox DNS Record Operator for Kubernetes
//!
//! ibdns converges declarative `DNSRecord` resources into an Infoblox grid
//! through the WAPI REST interface.
//!
//! ## Overview
//!
//! A `DNSRecord` names one DNS name, one record type (A, AAAA, CNAME or TXT)
//! and the complete set of values it should carry. For every reconciliation
//! the operator:
//!
//! 1. Resolves the owning zone by longest suffix match (or uses the zone
//!    persisted by an earlier reconciliation)
//! 2. Reads the record set from Infoblox, diffs it against the desired values
//!    and deletes/creates the difference
//! 3. Persists the zone and the last operation in the resource status
//!
//! ## Modules
//!
//! - [`crd`] - The `DNSRecord` custom resource
//! - [`reconcilers`] - Zone resolution, record-set convergence and the lifecycle actuator
//! - [`backend`] - The DNS backend contract
//! - [`infoblox`] - WAPI implementation of the backend contract
//! - [`record`] - Record types, values, TTLs and zones
//! - [`config`] - Credential bundle decoding
//! - [`record_controller`] - kube-runtime controller wiring
//!
//! ## Example
//!
//! ```rust,no_run
//! use ibdns::config::{Credentials, InfobloxConfig};
//! use ibdns::infoblox::InfobloxClient;
//! use ibdns::reconcilers::{Actuator, DesiredRecord};
//! use ibdns::record::Ttl;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = InfobloxConfig::new(Credentials {
//!     username: "admin".to_string(),
//!     password: "secret".to_string(),
//!     host: "gm.example.com".to_string(),
//! });
//! let client = InfobloxClient::new(&config)?;
//! let actuator = Actuator::new(Arc::new(client), config.view.clone());
//!
//! let desired = DesiredRecord {
//!     name: "api.example.com".to_string(),
//!     record_type: "A".to_string(),
//!     values: vec!["192.0.2.10".to_string()],
//!     ttl: Ttl::Seconds(300),
//!     explicit_zone: None,
//!     prior_zone: None,
//!     last_operation: None,
//! };
//! let outcome = actuator.reconcile(&desired, &CancellationToken::new()).await?;
//! println!("converged in zone {}", outcome.zone);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod dns_errors;
pub mod infoblox;
pub mod metrics;
pub mod reconcilers;
pub mod record;
pub mod record_controller;
pub mod status_reasons;
