// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for credential bundle decoding.

#[cfg(test)]
mod tests {
    use crate::config::InfobloxConfig;
    use crate::dns_errors::ConfigError;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn bundle(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_minimal_bundle_uses_defaults() {
        let data = bundle(&[
            ("username", "admin"),
            ("password", "secret"),
            ("host", "gm.example.com"),
        ]);

        let config = InfobloxConfig::from_secret_data(&data).unwrap();

        assert_eq!(config.credentials.username, "admin");
        assert_eq!(config.credentials.password, "secret");
        assert_eq!(config.credentials.host, "gm.example.com");
        assert_eq!(config.view, "default");
        assert_eq!(config.port, 443);
        assert_eq!(config.version, "2.10");
        assert!(config.ssl_verify);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.pool_connections, 10);
        assert_eq!(config.max_results, None);
        assert_eq!(config.proxy_url, None);
    }

    #[test]
    fn test_uppercase_keys_are_accepted() {
        let data = bundle(&[
            ("USERNAME", "admin"),
            ("PASSWORD", "secret"),
            ("HOST", "10.16.198.17"),
        ]);

        let config = InfobloxConfig::from_secret_data(&data).unwrap();
        assert_eq!(config.credentials.host, "10.16.198.17");
    }

    #[test]
    fn test_missing_required_keys() {
        for (missing, data) in [
            ("username", bundle(&[("password", "p"), ("host", "h")])),
            ("password", bundle(&[("username", "u"), ("host", "h")])),
            ("host", bundle(&[("username", "u"), ("password", "p")])),
        ] {
            let err = InfobloxConfig::from_secret_data(&data).unwrap_err();
            assert_eq!(
                err,
                ConfigError::MissingCredential {
                    key: missing.to_string()
                }
            );
        }
    }

    #[test]
    fn test_empty_required_key_counts_as_missing() {
        let data = bundle(&[("username", "  "), ("password", "p"), ("host", "h")]);
        let err = InfobloxConfig::from_secret_data(&data).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_optional_keys_override_defaults() {
        let data = bundle(&[
            ("username", "admin"),
            ("password", "secret"),
            ("host", "gm.example.com"),
            ("view", "external"),
            ("port", "8443"),
            ("version", "v2.12"),
            ("sslVerify", "false"),
            ("httpRequestTimeout", "15"),
            ("httpPoolConnections", "4"),
            ("maxResults", "2000"),
            ("proxyUrl", "http://proxy.internal:3128"),
        ]);

        let config = InfobloxConfig::from_secret_data(&data).unwrap();

        assert_eq!(config.view, "external");
        assert_eq!(config.port, 8443);
        assert_eq!(config.version, "2.12");
        assert!(!config.ssl_verify);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.pool_connections, 4);
        assert_eq!(config.max_results, Some(2000));
        assert_eq!(
            config.proxy_url.as_deref(),
            Some("http://proxy.internal:3128")
        );
        assert_eq!(config.base_url(), "https://gm.example.com:8443/wapi/v2.12");
    }

    #[test]
    fn test_invalid_optional_value() {
        let data = bundle(&[
            ("username", "admin"),
            ("password", "secret"),
            ("host", "gm.example.com"),
            ("port", "not-a-port"),
        ]);

        let err = InfobloxConfig::from_secret_data(&data).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { ref key, .. } if key == "port"));
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        let data = bundle(&[
            ("username", "admin"),
            ("password", "secret"),
            ("host", "http://127.0.0.1:9000/"),
        ]);

        let config = InfobloxConfig::from_secret_data(&data).unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:9000/wapi/v2.10");
    }

    #[test]
    fn test_debug_redacts_password() {
        let data = bundle(&[
            ("username", "admin"),
            ("password", "hunter2"),
            ("host", "gm.example.com"),
        ]);

        let config = InfobloxConfig::from_secret_data(&data).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
