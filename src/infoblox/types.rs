// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! WAPI object shapes used by the Infoblox client.

use crate::record::{Record, RecordType, Ttl, Zone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `zone_auth` object as returned with `_return_fields=fqdn`.
#[derive(Debug, Clone, Deserialize)]
pub struct WapiZone {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub fqdn: String,
}

impl From<WapiZone> for Zone {
    fn from(zone: WapiZone) -> Self {
        Zone::new(&zone.fqdn, &zone.reference)
    }
}

/// A `record:a`, `record:aaaa`, `record:cname` or `record:txt` object.
///
/// Only the value field matching the record type is present in a response.
#[derive(Debug, Clone, Deserialize)]
pub struct WapiRecord {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub ipv4addr: Option<String>,
    #[serde(default)]
    pub ipv6addr: Option<String>,
    #[serde(default)]
    pub canonical: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub use_ttl: Option<bool>,
    #[serde(default)]
    pub view: Option<String>,
}

impl WapiRecord {
    /// Convert into the engine's record model.
    ///
    /// A missing value field yields an empty value, so the record still shows
    /// up as stale and gets deleted.
    #[must_use]
    pub fn into_record(self, record_type: RecordType, default_view: &str) -> Record {
        let value = match record_type {
            RecordType::A => self.ipv4addr,
            RecordType::AAAA => self.ipv6addr,
            RecordType::CNAME => self.canonical,
            RecordType::TXT => self.text,
        }
        .unwrap_or_default();

        // The appliance reports the zone default TTL when use_ttl is false
        let ttl = match (self.use_ttl, self.ttl) {
            (Some(true), Some(secs)) => Ttl::Seconds(secs),
            _ => Ttl::Inherit,
        };

        Record {
            id: self.reference,
            record_type,
            name: crate::record::normalize_hostname(&self.name),
            value,
            ttl,
            view: self.view.unwrap_or_else(|| default_view.to_string()),
        }
    }
}

/// Body of a `POST record:<type>` request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRecordRequest {
    pub name: String,
    pub view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    pub use_ttl: bool,
    /// The per-type value field (`ipv4addr`, `ipv6addr`, `canonical` or `text`)
    #[serde(flatten)]
    pub value: Map<String, Value>,
}

impl CreateRecordRequest {
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        let mut value = Map::new();
        value.insert(
            record.record_type.value_field().to_string(),
            Value::String(record.value.clone()),
        );

        let (ttl, use_ttl) = match record.ttl {
            Ttl::Seconds(secs) => (Some(secs), true),
            Ttl::Inherit => (None, false),
        };

        Self {
            name: record.name.clone(),
            view: record.view.clone(),
            ttl,
            use_ttl,
            value,
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
