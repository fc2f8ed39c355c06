// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for DNS error types.

#[cfg(test)]
mod tests {
    use crate::dns_errors::*;

    #[test]
    fn test_missing_credential_error() {
        let error = ConfigError::MissingCredential {
            key: "username".to_string(),
        };

        assert_eq!(error.to_string(), "no username found in credential bundle");
    }

    #[test]
    fn test_no_matching_zone_error() {
        let error = ConfigError::NoMatchingZone {
            name: "api.other.org".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "could not find DNS managed zone for name api.other.org"
        );
    }

    #[test]
    fn test_name_outside_zone_error() {
        let error: DnsError = ConfigError::NameOutsideZone {
            name: "api.example.com".to_string(),
            zone: "example.org".to_string(),
        }
        .into();

        assert_eq!(error.to_string(), "name api.example.com is not in zone example.org");
        assert_eq!(error.status_reason(), "NameOutsideZone");
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_unsupported_record_type_error() {
        let error = ConfigError::UnsupportedRecordType {
            record_type: "MX".to_string(),
        };

        assert_eq!(error.to_string(), "record type MX is not supported");
    }

    #[test]
    fn test_authorization_failed_error() {
        let error = BackendError::AuthorizationFailed {
            endpoint: "https://gm.example.com/wapi/v2.10".to_string(),
            status_code: 401,
        };

        assert_eq!(
            error.to_string(),
            "authorization against https://gm.example.com/wapi/v2.10 failed (HTTP 401)"
        );
        assert!(error.is_permanent());
    }

    #[test]
    fn test_unexpected_response_error() {
        let error = BackendError::UnexpectedResponse {
            endpoint: "gm:443".to_string(),
            status_code: 500,
            reason: "Internal Server Error".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "unexpected HTTP response from gm:443: 500 Internal Server Error"
        );
        assert!(!error.is_permanent());
    }

    #[test]
    fn test_dns_error_transparent_display() {
        let error: DnsError = ConfigError::NoMatchingZone {
            name: "www.example.org".to_string(),
        }
        .into();

        assert_eq!(
            error.to_string(),
            "could not find DNS managed zone for name www.example.org"
        );
    }

    #[test]
    fn test_backend_errors_are_retryable() {
        let errors: Vec<DnsError> = vec![
            BackendError::ConnectionFailed {
                endpoint: "gm".to_string(),
                reason: "refused".to_string(),
            }
            .into(),
            BackendError::RequestTimeout {
                endpoint: "gm".to_string(),
                timeout_ms: 60_000,
            }
            .into(),
            BackendError::AuthorizationFailed {
                endpoint: "gm".to_string(),
                status_code: 403,
            }
            .into(),
            BackendError::InvalidResponse {
                endpoint: "gm".to_string(),
                reason: "expected array".to_string(),
            }
            .into(),
            BackendError::DuplicateZone {
                fqdn: "example.com".to_string(),
            }
            .into(),
        ];

        for error in errors {
            assert!(error.is_retryable(), "{error} should be retryable");
        }
    }

    #[test]
    fn test_config_errors_are_not_retryable() {
        let errors: Vec<DnsError> = vec![
            ConfigError::MissingCredential {
                key: "host".to_string(),
            }
            .into(),
            ConfigError::UnsupportedRecordType {
                record_type: "SRV".to_string(),
            }
            .into(),
            ConfigError::NoMatchingZone {
                name: "x.example.org".to_string(),
            }
            .into(),
        ];

        for error in errors {
            assert!(!error.is_retryable(), "{error} should not be retryable");
        }
    }

    #[test]
    fn test_cancelled_is_not_retryable() {
        assert!(!DnsError::Cancelled.is_retryable());
        assert_eq!(DnsError::Cancelled.status_reason(), "Cancelled");
    }

    #[test]
    fn test_status_reasons() {
        let error: DnsError = ConfigError::NoMatchingZone {
            name: "a.b".to_string(),
        }
        .into();
        assert_eq!(error.status_reason(), "NoMatchingZone");

        let error: DnsError = BackendError::AuthorizationFailed {
            endpoint: "gm".to_string(),
            status_code: 401,
        }
        .into();
        assert_eq!(error.status_reason(), "BackendAuthFailed");
    }
}
