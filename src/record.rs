// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Normalized DNS record model.
//!
//! Backend objects of every supported type are viewed through a single
//! [`Record`] value. Per-type behaviour (WAPI object name, value field, value
//! canonicalization) lives in a small dispatch table indexed by [`RecordType`]
//! rather than in per-type wrappers.
//!
//! # Example
//!
//! ```rust
//! use ibdns::record::{canonicalize_txt, RecordType};
//!
//! let rt: RecordType = "TXT".parse().unwrap();
//! assert_eq!(rt.wapi_object(), "record:txt");
//! assert_eq!(canonicalize_txt("hello world"), "\"hello world\"");
//! ```

use crate::constants::DEFAULT_VIEW;
use crate::dns_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// DNS record types the engine can converge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    TXT,
}

/// Per-type behaviour of a [`RecordType`].
pub struct RecordTypeSpec {
    /// Presentation name ("A", "AAAA", ...)
    pub name: &'static str,
    /// WAPI object type
    pub wapi_object: &'static str,
    /// WAPI field carrying the record value
    pub value_field: &'static str,
    /// `_return_fields` requested when listing records of this type
    pub return_fields: &'static str,
    canonicalize: fn(&str) -> Result<String, String>,
}

static RECORD_TYPE_SPECS: [RecordTypeSpec; 4] = [
    RecordTypeSpec {
        name: "A",
        wapi_object: "record:a",
        value_field: "ipv4addr",
        return_fields: "name,ipv4addr,ttl,use_ttl,view,zone",
        canonicalize: canonicalize_ipv4,
    },
    RecordTypeSpec {
        name: "AAAA",
        wapi_object: "record:aaaa",
        value_field: "ipv6addr",
        return_fields: "name,ipv6addr,ttl,use_ttl,view,zone",
        canonicalize: canonicalize_ipv6,
    },
    RecordTypeSpec {
        name: "CNAME",
        wapi_object: "record:cname",
        value_field: "canonical",
        return_fields: "name,canonical,ttl,use_ttl,view,zone",
        canonicalize: canonicalize_target,
    },
    RecordTypeSpec {
        name: "TXT",
        wapi_object: "record:txt",
        value_field: "text",
        return_fields: "name,text,ttl,use_ttl,view,zone",
        canonicalize: canonicalize_text,
    },
];

impl RecordType {
    /// All supported record types.
    pub const ALL: [RecordType; 4] = [Self::A, Self::AAAA, Self::CNAME, Self::TXT];

    /// Dispatch table entry for this type.
    #[must_use]
    pub fn spec(self) -> &'static RecordTypeSpec {
        let index = match self {
            Self::A => 0,
            Self::AAAA => 1,
            Self::CNAME => 2,
            Self::TXT => 3,
        };
        &RECORD_TYPE_SPECS[index]
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    #[must_use]
    pub fn wapi_object(self) -> &'static str {
        self.spec().wapi_object
    }

    #[must_use]
    pub fn value_field(self) -> &'static str {
        self.spec().value_field
    }

    #[must_use]
    pub fn return_fields(self) -> &'static str {
        self.spec().return_fields
    }

    /// Validate a desired value and return its canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRecordValue`] if the value cannot be a
    /// value of this type (e.g., "not-an-ip" for an A record).
    pub fn canonicalize(self, value: &str) -> Result<String, ConfigError> {
        (self.spec().canonicalize)(value).map_err(|reason| ConfigError::InvalidRecordValue {
            record_type: self.as_str().to_string(),
            value: value.to_string(),
            reason,
        })
    }

    /// Canonical form of a value read from the backend.
    ///
    /// Backend data is not rejected: values that fail validation are compared
    /// verbatim, which makes them stale and schedules them for deletion.
    #[must_use]
    pub fn canonicalize_observed(self, value: &str) -> String {
        (self.spec().canonicalize)(value).unwrap_or_else(|_| value.to_string())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rt| rt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnsupportedRecordType {
                record_type: s.to_string(),
            })
    }
}

fn canonicalize_ipv4(value: &str) -> Result<String, String> {
    Ipv4Addr::from_str(value.trim())
        .map(|ip| ip.to_string())
        .map_err(|e| e.to_string())
}

fn canonicalize_ipv6(value: &str) -> Result<String, String> {
    Ipv6Addr::from_str(value.trim())
        .map(|ip| ip.to_string())
        .map_err(|e| e.to_string())
}

fn canonicalize_target(value: &str) -> Result<String, String> {
    let target = normalize_hostname(value.trim()).to_ascii_lowercase();
    if target.is_empty() {
        return Err("target must not be empty".to_string());
    }
    Ok(target)
}

#[allow(clippy::unnecessary_wraps)] // Signature fixed by the dispatch table
fn canonicalize_text(value: &str) -> Result<String, String> {
    Ok(canonicalize_txt(value))
}

/// Time to live of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ttl {
    /// Use the zone's default TTL
    Inherit,
    /// Literal TTL in seconds; zero is a valid literal
    Seconds(u32),
}

impl Ttl {
    /// Map an optional resource TTL: absent means inherit the zone default.
    #[must_use]
    pub fn from_option(ttl: Option<u32>) -> Self {
        ttl.map_or(Self::Inherit, Self::Seconds)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => f.write_str("inherit"),
            Self::Seconds(secs) => write!(f, "{secs}s"),
        }
    }
}

/// A DNS record as seen by the engine.
///
/// A record with an empty `id` is pending creation; ids are assigned only by
/// the backend. Records are never mutated in place: an update is a delete of
/// the old record followed by a create of the new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Opaque backend reference (WAPI `_ref`), empty until persisted
    pub id: String,
    pub record_type: RecordType,
    /// Owning DNS name, fully qualified, no trailing dot
    pub name: String,
    /// Address, canonical target, or quoted text payload
    pub value: String,
    pub ttl: Ttl,
    /// Logical DNS view
    pub view: String,
}

impl Record {
    /// Build a record that has not been created yet.
    #[must_use]
    pub fn pending(
        record_type: RecordType,
        name: &str,
        value: &str,
        ttl: Ttl,
        view: Option<&str>,
    ) -> Self {
        Self {
            id: String::new(),
            record_type,
            name: normalize_hostname(name),
            value: value.to_string(),
            ttl,
            view: view.unwrap_or(DEFAULT_VIEW).to_string(),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.id.is_empty()
    }

    /// The value in the canonical form used for diffing.
    #[must_use]
    pub fn canonical_value(&self) -> String {
        self.record_type.canonicalize_observed(&self.value)
    }
}

/// The observed records for one name/type pair at a point in time.
///
/// Built fresh for every convergence call and never cached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Keep only records owned by exactly `name` with type `record_type`.
    ///
    /// Name comparison is case-insensitive and ignores a trailing dot.
    #[must_use]
    pub fn for_name(records: Vec<Record>, name: &str, record_type: RecordType) -> Self {
        let name = normalize_hostname(name);
        Self {
            records: records
                .into_iter()
                .filter(|r| {
                    r.record_type == record_type
                        && normalize_hostname(&r.name).eq_ignore_ascii_case(&name)
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Split off records whose canonical value repeats an earlier record's.
    ///
    /// Returns the collapsed set (first occurrence of each value, in order)
    /// and the surplus duplicates.
    #[must_use]
    pub fn collapse_duplicates(self) -> (Self, Vec<Record>) {
        let mut seen = HashSet::new();
        let (unique, duplicates): (Vec<_>, Vec<_>) = self
            .records
            .into_iter()
            .partition(|r| seen.insert(r.canonical_value()));
        (Self { records: unique }, duplicates)
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// An authoritative zone managed by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    /// Normalized FQDN (no trailing dot, wildcard prefix as `*.`)
    pub fqdn: String,
    /// Opaque backend handle
    pub reference: String,
}

impl Zone {
    #[must_use]
    pub fn new(fqdn: &str, reference: &str) -> Self {
        Self {
            fqdn: normalize_hostname(fqdn),
            reference: reference.to_string(),
        }
    }
}

/// Normalize a hostname as returned by the backend.
///
/// The octal-escaped wildcard label `\052.` becomes `*.` and a trailing dot is
/// removed.
///
/// # Example
///
/// ```rust
/// use ibdns::record::normalize_hostname;
///
/// assert_eq!(normalize_hostname("\\052.apps.example.com."), "*.apps.example.com");
/// assert_eq!(normalize_hostname("example.com"), "example.com");
/// ```
#[must_use]
pub fn normalize_hostname(host: &str) -> String {
    let host = match host.strip_prefix("\\052.") {
        Some(rest) => format!("*.{rest}"),
        None => host.to_string(),
    };
    match host.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Whether `name` lies in `zone`: it equals the zone or ends with
/// `"." + zone`.
///
/// Both sides are normalized and compared case-insensitively.
///
/// # Example
///
/// ```rust
/// use ibdns::record::is_name_in_zone;
///
/// assert!(is_name_in_zone("API.foo.example.com.", "example.com"));
/// assert!(!is_name_in_zone("api.badexample.com", "example.com"));
/// ```
#[must_use]
pub fn is_name_in_zone(name: &str, zone: &str) -> bool {
    let name = normalize_hostname(name).to_ascii_lowercase();
    let zone = normalize_hostname(zone).to_ascii_lowercase();
    if zone.is_empty() {
        return false;
    }
    name == zone
        || name
            .strip_suffix(&zone)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Quote a TXT payload unless it already is a valid RFC 1035 quoted string.
///
/// Already-quoted input (one or more `"..."` character-strings separated by
/// blanks, with `\"`, `\\` and `\DDD` escapes) is returned unchanged, so the
/// function is a fixed point on its own output.
#[must_use]
pub fn canonicalize_txt(value: &str) -> String {
    if is_quoted_text(value) {
        value.to_string()
    } else {
        quote_text(value)
    }
}

fn quote_text(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn is_quoted_text(value: &str) -> bool {
    let mut chars = value.chars().peekable();
    let mut segments = 0;

    loop {
        while chars.peek().is_some_and(|c| *c == ' ' || *c == '\t') {
            chars.next();
        }
        match chars.next() {
            None => return segments > 0,
            Some('"') => {}
            Some(_) => return false,
        }

        // Inside a character-string
        loop {
            match chars.next() {
                None => return false,
                Some('"') => break,
                Some('\\') => match chars.next() {
                    None => return false,
                    Some(d) if d.is_ascii_digit() => {
                        let rest: Option<Vec<char>> =
                            (0..2).map(|_| chars.next_if(char::is_ascii_digit)).collect();
                        let Some(rest) = rest else {
                            return false;
                        };
                        let code: String = std::iter::once(d).chain(rest).collect();
                        if code.parse::<u16>().map_or(true, |n| n > 255) {
                            return false;
                        }
                    }
                    Some(_) => {}
                },
                Some(_) => {}
            }
        }
        segments += 1;

        // Character-strings must be separated by whitespace
        if chars.peek().is_some_and(|c| *c != ' ' && *c != '\t') {
            return false;
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
