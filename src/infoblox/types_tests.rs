// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for WAPI object conversion.

#[cfg(test)]
mod tests {
    use crate::infoblox::types::{CreateRecordRequest, WapiRecord, WapiZone};
    use crate::record::{Record, RecordType, Ttl, Zone};
    use serde_json::json;

    #[test]
    fn test_zone_fqdn_is_normalized() {
        let zone: WapiZone = serde_json::from_value(json!({
            "_ref": "zone_auth/ZG5zLnpvbmUkLl9kZWZhdWx0:\\052.wild.example.com/default",
            "fqdn": "\\052.wild.example.com"
        }))
        .unwrap();

        let zone = Zone::from(zone);
        assert_eq!(zone.fqdn, "*.wild.example.com");
    }

    #[test]
    fn test_record_with_explicit_ttl() {
        let record: WapiRecord = serde_json::from_value(json!({
            "_ref": "record:a/ZG5zLmJpbmRfYSQ:api.example.com/default",
            "name": "api.example.com",
            "ipv4addr": "10.0.0.1",
            "ttl": 300,
            "use_ttl": true,
            "view": "default",
            "zone": "example.com"
        }))
        .unwrap();

        let record = record.into_record(RecordType::A, "default");
        assert_eq!(record.id, "record:a/ZG5zLmJpbmRfYSQ:api.example.com/default");
        assert_eq!(record.value, "10.0.0.1");
        assert_eq!(record.ttl, Ttl::Seconds(300));
    }

    #[test]
    fn test_record_without_use_ttl_inherits() {
        let record: WapiRecord = serde_json::from_value(json!({
            "_ref": "record:txt/ZG5z:api.example.com/external",
            "name": "api.example.com",
            "text": "\"hello\"",
            "ttl": 3600,
            "use_ttl": false,
            "view": "external"
        }))
        .unwrap();

        let record = record.into_record(RecordType::TXT, "default");
        assert_eq!(record.ttl, Ttl::Inherit);
        assert_eq!(record.view, "external");
    }

    #[test]
    fn test_record_missing_value_field() {
        let record: WapiRecord = serde_json::from_value(json!({
            "_ref": "record:cname/ZG5z:www.example.com/default",
            "name": "www.example.com"
        }))
        .unwrap();

        let record = record.into_record(RecordType::CNAME, "default");
        assert_eq!(record.value, "");
        assert_eq!(record.id, "record:cname/ZG5z:www.example.com/default");
        assert_eq!(record.name, "www.example.com");
    }

    #[test]
    fn test_create_request_body() {
        let record = Record::pending(
            RecordType::AAAA,
            "api.example.com",
            "2001:db8::1",
            Ttl::Seconds(0),
            Some("internal"),
        );

        let body = serde_json::to_value(CreateRecordRequest::from_record(&record)).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "api.example.com",
                "view": "internal",
                "ttl": 0,
                "use_ttl": true,
                "ipv6addr": "2001:db8::1"
            })
        );
    }

    #[test]
    fn test_create_request_body_inherit_ttl() {
        let record = Record::pending(
            RecordType::TXT,
            "api.example.com",
            "\"hello\"",
            Ttl::Inherit,
            None,
        );

        let body = serde_json::to_value(CreateRecordRequest::from_record(&record)).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "api.example.com",
                "view": "default",
                "use_ttl": false,
                "text": "\"hello\""
            })
        );
    }
}
