// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Infoblox WAPI implementation of [`DnsBackend`].
//!
//! All requests go through [`InfobloxClient::wapi_request`], which retries
//! transient failures (HTTP 429/5xx, connection errors) with jittered
//! exponential backoff before surfacing a [`BackendError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ibdns::backend::DnsBackend;
//! use ibdns::config::{Credentials, InfobloxConfig};
//! use ibdns::infoblox::InfobloxClient;
//!
//! # async fn example() -> Result<(), ibdns::dns_errors::DnsError> {
//! let config = InfobloxConfig::new(Credentials {
//!     username: "admin".to_string(),
//!     password: "secret".to_string(),
//!     host: "gm.example.com".to_string(),
//! });
//! let client = InfobloxClient::new(&config)?;
//!
//! for zone in client.list_zones().await? {
//!     println!("{}", zone.fqdn);
//! }
//! # Ok(())
//! # }
//! ```

pub mod types;

use crate::backend::DnsBackend;
use crate::config::{InfobloxConfig, KEY_CA_CERT, KEY_HOST, KEY_PROXY_URL};
use crate::constants::{WAPI_PROXY_SEARCH_GRID_MASTER, WAPI_PROXY_SEARCH_PARAM};
use crate::dns_errors::{BackendError, ConfigError, DnsError};
use crate::metrics;
use crate::reconcilers::retry::{is_retryable_http_status, wapi_backoff};
use crate::record::{is_name_in_zone, Record, RecordType, Zone};
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use types::{CreateRecordRequest, WapiRecord, WapiZone};
use url::Url;

/// Client for one Infoblox grid.
///
/// Constructed per reconciliation from the resource's credential bundle and
/// dropped when the reconciliation finishes.
pub struct InfobloxClient {
    http: HttpClient,
    base: Url,
    username: String,
    password: String,
    view: String,
    max_results: Option<u32>,
    request_timeout: Duration,
}

impl std::fmt::Debug for InfobloxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfobloxClient")
            .field("base", &self.base.as_str())
            .field("username", &self.username)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl InfobloxClient {
    /// Build a client from decoded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if the host, CA certificate or
    /// proxy URL cannot be used, and [`BackendError::ConnectionFailed`] if the
    /// HTTP client cannot be initialised.
    pub fn new(config: &InfobloxConfig) -> Result<Self, DnsError> {
        let base_url = config.base_url();
        let base = Url::parse(&base_url).map_err(|e| ConfigError::InvalidConfig {
            key: KEY_HOST.to_string(),
            reason: format!("{base_url}: {e}"),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidConfig {
                key: KEY_HOST.to_string(),
                reason: format!("{base_url} is not a hierarchical URL"),
            }
            .into());
        }

        let mut builder = HttpClient::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_connections);

        if !config.ssl_verify {
            builder = builder.danger_accept_invalid_certs(true);
        } else if let Some(pem) = &config.ca_cert {
            let cert = reqwest::Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                ConfigError::InvalidConfig {
                    key: KEY_CA_CERT.to_string(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| ConfigError::InvalidConfig {
                key: KEY_PROXY_URL.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().map_err(|e| BackendError::ConnectionFailed {
            endpoint: base_url.clone(),
            reason: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            base,
            username: config.credentials.username.clone(),
            password: config.credentials.password.clone(),
            view: config.view.clone(),
            max_results: config.max_results,
            request_timeout: config.request_timeout,
        })
    }

    /// The DNS view this client was configured with.
    #[must_use]
    pub fn view(&self) -> &str {
        &self.view
    }

    /// URL of a WAPI object type or object reference below the base URL.
    fn object_url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.split('/'));
        }
        url
    }

    async fn get_records(&self, url: Url) -> Result<Vec<WapiRecord>, BackendError> {
        let body = self.wapi_request(Method::GET, url.clone(), None).await?;
        decode(&url, &body)
    }

    /// Execute a WAPI request, retrying transient failures.
    ///
    /// Returns the response body on success.
    async fn wapi_request(
        &self,
        method: Method,
        url: Url,
        body: Option<&CreateRecordRequest>,
    ) -> Result<String, BackendError> {
        let mut backoff = wapi_backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let e = match self.wapi_request_once(&method, &url, body).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(
                            method = %method,
                            url = %url,
                            attempt = attempt,
                            elapsed = ?backoff.elapsed(),
                            "WAPI call succeeded after retries"
                        );
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !is_retryable(&e) {
                return Err(e);
            }

            let Some(duration) = backoff.next_backoff() else {
                warn!(
                    method = %method,
                    url = %url,
                    attempt = attempt,
                    elapsed = ?backoff.elapsed(),
                    error = %e,
                    "WAPI backoff exhausted, giving up"
                );
                return Err(e);
            };

            warn!(
                method = %method,
                url = %url,
                attempt = attempt,
                retry_after = ?duration,
                error = %e,
                "Retryable WAPI error, will retry"
            );
            tokio::time::sleep(duration).await;
        }
    }

    async fn wapi_request_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&CreateRecordRequest>,
    ) -> Result<String, BackendError> {
        let endpoint = endpoint(url);
        debug!(method = %method, url = %url, body = ?body, "WAPI request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send().await;
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                metrics::record_wapi_request(method.as_str(), "error", start.elapsed());
                return Err(self.transport_error(&endpoint, &e));
            }
        };

        let status = response.status();
        metrics::record_wapi_request(method.as_str(), status.as_str(), start.elapsed());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::AuthorizationFailed {
                endpoint,
                status_code: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&endpoint, &e))?;

        if !status.is_success() {
            return Err(BackendError::UnexpectedResponse {
                endpoint,
                status_code: status.as_u16(),
                reason: wapi_error_text(&text),
            });
        }

        debug!(
            method = %method,
            url = %url,
            status = %status,
            response_len = text.len(),
            "WAPI request successful"
        );
        Ok(text)
    }

    fn transport_error(&self, endpoint: &str, e: &reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::RequestTimeout {
                endpoint: endpoint.to_string(),
                timeout_ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            BackendError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait::async_trait]
impl DnsBackend for InfobloxClient {
    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        let mut url = self.object_url("zone_auth");
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("_return_fields", "fqdn")
                .append_pair("view", &self.view);
            if let Some(max) = self.max_results {
                query.append_pair("_max_results", &max.to_string());
            }
        }

        let body = self.wapi_request(Method::GET, url.clone(), None).await?;
        let zones: Vec<WapiZone> = decode(&url, &body)?;
        Ok(zones.into_iter().map(Zone::from).collect())
    }

    async fn list_records(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>, DnsError> {
        let mut url = self.object_url(record_type.wapi_object());
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("name", name)
                .append_pair("zone", zone)
                .append_pair("view", &self.view)
                .append_pair("_return_fields", record_type.return_fields());
            if let Some(max) = self.max_results {
                query.append_pair("_max_results", &max.to_string());
            }
        }

        // A read served by a grid member can fail where the grid master
        // succeeds, so a failed read is re-issued once against the master.
        let records = match self.get_records(url.clone()).await {
            Ok(records) => records,
            Err(first) => {
                debug!(
                    url = %url,
                    error = %first,
                    "Record listing failed, retrying with grid master proxy search"
                );
                url.query_pairs_mut()
                    .append_pair(WAPI_PROXY_SEARCH_PARAM, WAPI_PROXY_SEARCH_GRID_MASTER);
                self.get_records(url).await?
            }
        };

        Ok(records
            .into_iter()
            .map(|r| r.into_record(record_type, &self.view))
            .collect())
    }

    /// WAPI places a new record in the most specific zone containing its
    /// name; `zone` is not sent. A name outside `zone` is rejected up front,
    /// since `list_records` for `zone` could never see the created object.
    /// Zones delegated below `zone` are assumed absent.
    async fn create_record(&self, zone: &str, record: &Record) -> Result<Record, DnsError> {
        if !is_name_in_zone(&record.name, zone) {
            return Err(ConfigError::NameOutsideZone {
                name: record.name.clone(),
                zone: zone.to_string(),
            }
            .into());
        }

        let url = self.object_url(record.record_type.wapi_object());
        let body = CreateRecordRequest::from_record(record);

        let response = self
            .wapi_request(Method::POST, url.clone(), Some(&body))
            .await?;
        let reference: String = decode(&url, &response)?;

        Ok(Record {
            id: reference,
            ..record.clone()
        })
    }

    async fn delete_record(&self, id: &str) -> Result<(), DnsError> {
        let url = self.object_url(id);
        self.wapi_request(Method::DELETE, url, None).await?;
        Ok(())
    }
}

fn is_retryable(error: &BackendError) -> bool {
    match error {
        BackendError::ConnectionFailed { .. } => true,
        BackendError::UnexpectedResponse { status_code, .. } => StatusCode::from_u16(*status_code)
            .map(is_retryable_http_status)
            .unwrap_or(false),
        _ => false,
    }
}

/// URL without the query string, used as the error endpoint.
fn endpoint(url: &Url) -> String {
    let mut endpoint = url.clone();
    endpoint.set_query(None);
    endpoint.to_string()
}

fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse {
        endpoint: endpoint(url),
        reason: e.to_string(),
    })
}

/// Extract the `text` of a WAPI error document, falling back to the raw body.
fn wapi_error_text(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("text").and_then(|t| t.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
