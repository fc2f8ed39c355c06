// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        Condition, DNSRecord, DNSRecordSpec, DNSRecordStatus, LastOperation, LastOperationState,
        LastOperationType, SecretReference,
    };
    use crate::reconcilers::status::{
        conditions_equal, create_condition, find_condition, update_condition_in_memory,
        DNSRecordStatusUpdater,
    };
    use crate::status_reasons::{CONDITION_TYPE_READY, REASON_RECONCILED};

    fn record(status: Option<DNSRecordStatus>) -> DNSRecord {
        let mut record = DNSRecord::new(
            "api",
            DNSRecordSpec {
                secret_ref: SecretReference {
                    name: "creds".to_string(),
                    namespace: None,
                },
                zone: None,
                dns_name: "api.example.com".to_string(),
                record_type: "A".to_string(),
                values: vec!["192.0.2.1".to_string()],
                ttl: None,
            },
        );
        record.metadata.namespace = Some("apps".to_string());
        record.status = status;
        record
    }

    #[test]
    fn test_create_condition_basic() {
        let condition = create_condition("Ready", "True", "Reconciled", "done");

        assert_eq!(condition.r#type, "Ready");
        assert_eq!(condition.status, "True");
        assert_eq!(condition.reason.as_deref(), Some("Reconciled"));
        assert_eq!(condition.message.as_deref(), Some("done"));
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn test_update_condition_keeps_transition_time_when_status_unchanged() {
        let mut conditions = vec![Condition {
            r#type: "Ready".to_string(),
            status: "True".to_string(),
            reason: Some("Reconciled".to_string()),
            message: Some("old".to_string()),
            last_transition_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        }];

        update_condition_in_memory(&mut conditions, "Ready", "True", "Restored", "new");

        assert_eq!(conditions.len(), 1);
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00+00:00")
        );
        assert_eq!(conditions[0].reason.as_deref(), Some("Restored"));

        update_condition_in_memory(&mut conditions, "Ready", "False", "BackendUnreachable", "x");
        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_conditions_equal_ignores_timestamps() {
        let a = vec![create_condition("Ready", "True", "Reconciled", "ok")];
        let mut b = a.clone();
        b[0].last_transition_time = None;

        assert!(conditions_equal(&a, &b));
        b[0].message = Some("changed".to_string());
        assert!(!conditions_equal(&a, &b));
        assert!(!conditions_equal(&a, &[]));
    }

    #[test]
    fn test_updater_success_sets_zone_and_ready() {
        let mut updater = DNSRecordStatusUpdater::new(&record(None));
        updater.set_zone("example.com");
        updater.set_observed_generation(Some(2));
        updater.succeeded(LastOperationType::Create, REASON_RECONCILED, "1 record(s)");

        let status = updater.status();
        assert_eq!(status.zone.as_deref(), Some("example.com"));
        assert_eq!(status.observed_generation, Some(2));
        let op = status.last_operation.as_ref().unwrap();
        assert_eq!(op.r#type, LastOperationType::Create);
        assert_eq!(op.state, LastOperationState::Succeeded);
        let ready = find_condition(&status.conditions, CONDITION_TYPE_READY).unwrap();
        assert_eq!(ready.status, "True");
        assert!(updater.has_changes());
    }

    #[test]
    fn test_updater_failure_keeps_prior_zone() {
        let existing = DNSRecordStatus {
            zone: Some("example.com".to_string()),
            ..DNSRecordStatus::default()
        };
        let mut updater = DNSRecordStatusUpdater::new(&record(Some(existing)));
        updater.failed(
            LastOperationType::Reconcile,
            "BackendUnreachable",
            "connection refused",
        );

        let status = updater.status();
        assert_eq!(status.zone.as_deref(), Some("example.com"));
        assert_eq!(
            status.last_operation.as_ref().unwrap().state,
            LastOperationState::Error
        );
        let ready = find_condition(&status.conditions, CONDITION_TYPE_READY).unwrap();
        assert_eq!(ready.status, "False");
        assert_eq!(ready.reason.as_deref(), Some("BackendUnreachable"));
    }

    #[test]
    fn test_repeated_success_has_no_changes() {
        let mut first = DNSRecordStatusUpdater::new(&record(None));
        first.set_zone("example.com");
        first.succeeded(LastOperationType::Reconcile, REASON_RECONCILED, "1 record(s)");
        let persisted = first.status().clone();

        let mut second = DNSRecordStatusUpdater::new(&record(Some(persisted)));
        second.set_zone("example.com");
        second.succeeded(LastOperationType::Reconcile, REASON_RECONCILED, "1 record(s)");

        assert!(!second.has_changes());
    }

    #[test]
    fn test_operation_change_is_a_change() {
        let existing = DNSRecordStatus {
            zone: Some("example.com".to_string()),
            last_operation: Some(LastOperation {
                r#type: LastOperationType::Create,
                state: LastOperationState::Succeeded,
                description: Some("1 record(s)".to_string()),
                last_update_time: None,
            }),
            conditions: vec![create_condition("Ready", "True", REASON_RECONCILED, "1 record(s)")],
            observed_generation: None,
        };

        let mut updater = DNSRecordStatusUpdater::new(&record(Some(existing)));
        updater.succeeded(LastOperationType::Reconcile, REASON_RECONCILED, "1 record(s)");

        assert!(updater.has_changes());
    }
}
