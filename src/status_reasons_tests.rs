// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status_reasons` module

#[cfg(test)]
mod tests {
    use crate::dns_errors::{ConfigError, DnsError};
    use crate::status_reasons::*;

    #[test]
    fn test_condition_constants() {
        assert_eq!(CONDITION_TYPE_READY, "Ready");
        assert_eq!(CONDITION_STATUS_TRUE, "True");
        assert_eq!(CONDITION_STATUS_FALSE, "False");
    }

    #[test]
    fn test_reasons_are_camel_case() {
        for reason in [
            REASON_RECONCILED,
            REASON_RESTORED,
            REASON_MIGRATED,
            REASON_SECRET_UNAVAILABLE,
            REASON_INVALID_OPERATION,
        ] {
            assert!(reason.chars().next().is_some_and(char::is_uppercase));
            assert!(reason.chars().all(char::is_alphanumeric), "{reason}");
        }
    }

    #[test]
    fn test_success_reasons_do_not_collide_with_error_reasons() {
        let error_reason = DnsError::Config(ConfigError::NoMatchingZone {
            name: "api.example.org".to_string(),
        })
        .status_reason();

        for reason in [REASON_RECONCILED, REASON_RESTORED, REASON_MIGRATED] {
            assert_ne!(reason, error_reason);
        }
    }
}
