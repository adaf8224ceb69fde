//! Configuration types for the CNAME source
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound accepted for `lookup_timeout_secs`
pub const MAX_LOOKUP_TIMEOUT_SECS: u64 = 300;

/// CNAME source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CnameSourceConfig {
    /// Namespace the wrapped source is scoped to (empty = all namespaces)
    #[serde(default)]
    pub namespace: String,

    /// Upper bound for a single reverse lookup, in seconds
    ///
    /// `None` leaves the resolver's own defaults in charge.
    #[serde(default)]
    pub lookup_timeout_secs: Option<u64>,

    /// Reverse resolver to use
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl CnameSourceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope to a namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Bound each reverse lookup
    pub fn with_lookup_timeout_secs(mut self, secs: u64) -> Self {
        self.lookup_timeout_secs = Some(secs);
        self
    }

    /// Parse a JSON document and validate it
    pub fn from_json(raw: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self.lookup_timeout_secs {
            Some(0) => {
                return Err(crate::Error::config("Lookup timeout must be > 0"));
            }
            Some(secs) if secs > MAX_LOOKUP_TIMEOUT_SECS => {
                return Err(crate::Error::config(format!(
                    "Lookup timeout must be at most {}s, got {}s",
                    MAX_LOOKUP_TIMEOUT_SECS, secs
                )));
            }
            _ => {}
        }

        self.resolver.validate()
    }

    /// The lookup timeout as a `Duration`
    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout_secs.map(Duration::from_secs)
    }
}

/// Reverse resolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverConfig {
    /// Operating system resolver (getnameinfo)
    #[default]
    System,

    /// Custom resolver
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ResolverConfig::System => Ok(()),
            ResolverConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom resolver factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom resolver config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the resolver type name
    pub fn type_name(&self) -> &str {
        match self {
            ResolverConfig::System => "system",
            ResolverConfig::Custom { factory, .. } => factory,
        }
    }
}
