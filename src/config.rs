// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Infoblox connection configuration decoded from a credential bundle.
//!
//! The bundle is the data of a Kubernetes `Secret`: a map of keys to raw
//! bytes. Keys are matched case-insensitively so that both `username` and the
//! historical `USERNAME` spelling work.
//!
//! | Key | Required | Default |
//! |-----|----------|---------|
//! | `username` | yes | |
//! | `password` | yes | |
//! | `host` | yes | |
//! | `view` | no | `default` |
//! | `port` | no | `443` |
//! | `version` | no | `2.10` |
//! | `sslVerify` | no | `true` |
//! | `caCert` | no | |
//! | `httpRequestTimeout` | no | `60` (seconds) |
//! | `httpPoolConnections` | no | `10` |
//! | `maxResults` | no | |
//! | `proxyUrl` | no | |

use crate::constants::{
    DEFAULT_HTTP_POOL_CONNECTIONS, DEFAULT_HTTP_REQUEST_TIMEOUT_SECS, DEFAULT_VIEW,
    DEFAULT_WAPI_PORT, DEFAULT_WAPI_VERSION,
};
use crate::dns_errors::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const KEY_USERNAME: &str = "username";
pub const KEY_PASSWORD: &str = "password";
pub const KEY_HOST: &str = "host";
pub const KEY_VIEW: &str = "view";
pub const KEY_PORT: &str = "port";
pub const KEY_VERSION: &str = "version";
pub const KEY_SSL_VERIFY: &str = "sslVerify";
pub const KEY_CA_CERT: &str = "caCert";
pub const KEY_HTTP_REQUEST_TIMEOUT: &str = "httpRequestTimeout";
pub const KEY_HTTP_POOL_CONNECTIONS: &str = "httpPoolConnections";
pub const KEY_MAX_RESULTS: &str = "maxResults";
pub const KEY_PROXY_URL: &str = "proxyUrl";

/// Credentials for the WAPI.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub host: String,
}

// Keep the password out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .finish()
    }
}

/// Full client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfobloxConfig {
    pub credentials: Credentials,
    pub view: String,
    pub port: u16,
    /// WAPI version (e.g., "2.10")
    pub version: String,
    pub ssl_verify: bool,
    /// PEM-encoded CA certificate trusted in addition to the system roots
    pub ca_cert: Option<String>,
    pub request_timeout: Duration,
    pub pool_connections: usize,
    /// Upper bound on objects returned by a listing
    pub max_results: Option<u32>,
    pub proxy_url: Option<String>,
}

impl InfobloxConfig {
    /// Configuration with default connection settings.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            view: DEFAULT_VIEW.to_string(),
            port: DEFAULT_WAPI_PORT,
            version: DEFAULT_WAPI_VERSION.to_string(),
            ssl_verify: true,
            ca_cert: None,
            request_timeout: Duration::from_secs(DEFAULT_HTTP_REQUEST_TIMEOUT_SECS),
            pool_connections: DEFAULT_HTTP_POOL_CONNECTIONS,
            max_results: None,
            proxy_url: None,
        }
    }

    /// Decode a credential bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when `username`, `password`
    /// or `host` is absent or empty, and [`ConfigError::InvalidConfig`] when an
    /// optional key cannot be parsed.
    pub fn from_secret_data(data: &BTreeMap<String, Vec<u8>>) -> Result<Self, ConfigError> {
        let bundle = Bundle { data };

        let credentials = Credentials {
            username: bundle.required(KEY_USERNAME)?,
            password: bundle.required(KEY_PASSWORD)?,
            host: bundle.required(KEY_HOST)?,
        };

        let mut config = Self::new(credentials);
        if let Some(view) = bundle.optional(KEY_VIEW)? {
            config.view = view;
        }
        if let Some(port) = bundle.parsed(KEY_PORT)? {
            config.port = port;
        }
        if let Some(version) = bundle.optional(KEY_VERSION)? {
            config.version = version.trim_start_matches('v').to_string();
        }
        if let Some(ssl_verify) = bundle.parsed(KEY_SSL_VERIFY)? {
            config.ssl_verify = ssl_verify;
        }
        config.ca_cert = bundle.optional(KEY_CA_CERT)?;
        if let Some(timeout) = bundle.parsed::<u64>(KEY_HTTP_REQUEST_TIMEOUT)? {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(pool) = bundle.parsed(KEY_HTTP_POOL_CONNECTIONS)? {
            config.pool_connections = pool;
        }
        config.max_results = bundle.parsed(KEY_MAX_RESULTS)?;
        config.proxy_url = bundle.optional(KEY_PROXY_URL)?;

        Ok(config)
    }

    /// Base URL of the WAPI, e.g. `https://gm.example.com:443/wapi/v2.10`.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.credentials.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}/wapi/v{}", self.version)
        } else {
            format!("https://{host}:{}/wapi/v{}", self.port, self.version)
        }
    }
}

struct Bundle<'a> {
    data: &'a BTreeMap<String, Vec<u8>>,
}

impl Bundle<'_> {
    fn raw(&self, key: &str) -> Option<&[u8]> {
        self.data
            .get(key)
            .or_else(|| {
                self.data
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(Vec::as_slice)
    }

    fn optional(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };
        let value = std::str::from_utf8(raw).map_err(|e| ConfigError::InvalidConfig {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let value = value.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)?
            .ok_or_else(|| ConfigError::MissingCredential {
                key: key.to_string(),
            })
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key)?
            .map(|v| {
                v.parse::<T>().map_err(|e| ConfigError::InvalidConfig {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
