// # Endpoint
//
// A single DNS record that a source wants published: a name, the values it
// resolves to and the record kind.
//
// Sources produce `Vec<Endpoint>` and hand ownership to their caller, so a
// decorator can rewrite entries in place before passing the vector on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// DNS record type of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name (alias) record
    Cname,
    /// Text record
    Txt,
    /// Service locator record
    Srv,
    /// Name server record
    Ns,
    /// Pointer record
    Ptr,
    /// Mail exchange record
    Mx,
}

impl RecordType {
    /// The textual tag used in zone files and provider APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Mx => "MX",
        }
    }

    /// Infer the record type for a single target value
    ///
    /// IPv4 addresses map to `A`, IPv6 addresses to `AAAA` and anything
    /// else is treated as a hostname (`CNAME`).
    pub fn for_target(target: &str) -> Self {
        match target.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => RecordType::A,
            Ok(IpAddr::V6(_)) => RecordType::Aaaa,
            Err(_) => RecordType::Cname,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "SRV" => Ok(RecordType::Srv),
            "NS" => Ok(RecordType::Ns),
            "PTR" => Ok(RecordType::Ptr),
            "MX" => Ok(RecordType::Mx),
            other => Err(crate::Error::invalid_input(format!(
                "unknown record type '{}'",
                other
            ))),
        }
    }
}

/// A DNS record to be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// The name under which the record is published
    pub dns_name: String,

    /// Values the name resolves to, in source order
    pub targets: Vec<String>,

    /// The record kind
    pub record_type: RecordType,

    /// Time-to-live in seconds, if the source set one
    #[serde(default, rename = "recordTTL", skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<u32>,

    /// Identifier distinguishing records that share a name and type
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,

    /// Ownership and bookkeeping labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Endpoint {
    /// Create an endpoint with the given name, type and targets
    pub fn new<T, I>(dns_name: impl Into<String>, record_type: RecordType, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            dns_name: dns_name.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            record_type,
            record_ttl: None,
            set_identifier: String::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Set the record TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = Some(ttl);
        self
    }

    /// Set the set identifier
    pub fn with_set_identifier(mut self, set_identifier: impl Into<String>) -> Self {
        self.set_identifier = set_identifier.into();
        self
    }

    /// Attach a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// The first target, if any
    pub fn first_target(&self) -> Option<&str> {
        self.targets.first().map(String::as_str)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}]",
            self.dns_name,
            self.record_type,
            self.targets.join(";")
        )?;
        if let Some(ttl) = self.record_ttl {
            write!(f, " ttl={}", ttl)?;
        }
        Ok(())
    }
}
