// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`DnsBackend`] for engine tests.

use crate::backend::DnsBackend;
use crate::dns_errors::{BackendError, DnsError};
use crate::record::{Record, RecordType, Ttl, Zone};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A backend mutation, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Create { name: String, value: String },
    Delete { id: String },
}

#[derive(Default)]
struct State {
    zones: Vec<Zone>,
    /// (zone, record)
    records: Vec<(String, Record)>,
    mutations: Vec<Mutation>,
    calls: usize,
    next_id: usize,
    fail_list_zones: bool,
    fail_list_records: bool,
    /// Values whose creation fails
    fail_create: Vec<String>,
    /// Values whose deletion fails
    fail_delete: Vec<String>,
    /// Cancel the token once this many mutations have been applied
    cancel_after: Option<(usize, CancellationToken)>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

fn unavailable(what: &str) -> DnsError {
    BackendError::ConnectionFailed {
        endpoint: "fake".to_string(),
        reason: format!("{what} failed"),
    }
    .into()
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zones(zones: &[&str]) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().zones = zones
            .iter()
            .map(|fqdn| Zone::new(fqdn, &format!("zone_auth/{fqdn}")))
            .collect();
        backend
    }

    /// Seed an observed record and return its id.
    pub fn seed(&self, zone: &str, rt: RecordType, name: &str, value: &str, ttl: Ttl) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("{}/seed{}:{name}/default", rt.wapi_object(), state.next_id);
        state.records.push((
            zone.to_string(),
            Record {
                id: id.clone(),
                record_type: rt,
                name: name.to_string(),
                value: value.to_string(),
                ttl,
                view: "default".to_string(),
            },
        ));
        id
    }

    /// Sorted values currently stored for `(name, rt)`.
    pub fn values(&self, name: &str, rt: RecordType) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut values: Vec<String> = state
            .records
            .iter()
            .filter(|(_, r)| r.name == name && r.record_type == rt)
            .map(|(_, r)| r.value.clone())
            .collect();
        values.sort();
        values
    }

    pub fn records(&self, name: &str, rt: RecordType) -> Vec<Record> {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .filter(|(_, r)| r.name == name && r.record_type == rt)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state.lock().unwrap().mutations.clear();
    }

    /// Number of backend calls of any kind.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn fail_list_zones(&self) {
        self.state.lock().unwrap().fail_list_zones = true;
    }

    pub fn fail_list_records(&self) {
        self.state.lock().unwrap().fail_list_records = true;
    }

    pub fn fail_create(&self, value: &str) {
        self.state.lock().unwrap().fail_create.push(value.to_string());
    }

    pub fn fail_delete(&self, value: &str) {
        self.state.lock().unwrap().fail_delete.push(value.to_string());
    }

    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_list_zones = false;
        state.fail_list_records = false;
        state.fail_create.clear();
        state.fail_delete.clear();
    }

    pub fn cancel_after(&self, mutations: usize, token: CancellationToken) {
        self.state.lock().unwrap().cancel_after = Some((mutations, token));
    }

    fn record_mutation(state: &mut State, mutation: Mutation) {
        state.mutations.push(mutation);
        if let Some((after, token)) = &state.cancel_after {
            if state.mutations.len() >= *after {
                token.cancel();
            }
        }
    }
}

#[async_trait::async_trait]
impl DnsBackend for FakeBackend {
    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_list_zones {
            return Err(unavailable("list zones"));
        }
        Ok(state.zones.clone())
    }

    async fn list_records(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>, DnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_list_records {
            return Err(unavailable("list records"));
        }
        Ok(state
            .records
            .iter()
            .filter(|(z, r)| z == zone && r.name == name && r.record_type == record_type)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record(&self, zone: &str, record: &Record) -> Result<Record, DnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_create.contains(&record.value) {
            return Err(unavailable("create"));
        }
        state.next_id += 1;
        let created = Record {
            id: format!(
                "{}/fake{}:{}/{}",
                record.record_type.wapi_object(),
                state.next_id,
                record.name,
                record.view
            ),
            ..record.clone()
        };
        state.records.push((zone.to_string(), created.clone()));
        Self::record_mutation(
            &mut state,
            Mutation::Create {
                name: record.name.clone(),
                value: record.value.clone(),
            },
        );
        Ok(created)
    }

    async fn delete_record(&self, id: &str) -> Result<(), DnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let Some(position) = state.records.iter().position(|(_, r)| r.id == id) else {
            return Err(BackendError::UnexpectedResponse {
                endpoint: "fake".to_string(),
                status_code: 404,
                reason: format!("no record {id}"),
            }
            .into());
        };
        if state.fail_delete.contains(&state.records[position].1.value) {
            return Err(unavailable("delete"));
        }
        state.records.remove(position);
        Self::record_mutation(&mut state, Mutation::Delete { id: id.to_string() });
        Ok(())
    }
}
