// # Reverse Resolver Trait
//
// Defines the interface for PTR-style lookups: textual address in, ordered
// hostnames out.
//
// ## Implementations
//
// - System resolver (getnameinfo): `cname-resolver-system` crate

use async_trait::async_trait;
use std::sync::Arc;

/// Trait for reverse-address resolution
///
/// # Behavior
///
/// - On success the returned list should be non-empty; the first entry is
///   the preferred name
/// - Names may carry a trailing root-label separator (`.`); callers are
///   expected to normalize it
/// - Implementations apply their own timeout and retry defaults
#[async_trait]
pub trait ReverseResolver: Send + Sync {
    /// Look up the hostnames registered for `addr`
    ///
    /// # Parameters
    ///
    /// - `addr`: Textual network address (e.g. "203.0.113.9")
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Candidate hostnames, most preferred first
    /// - `Err(Error)`: If the address is invalid or has no PTR record
    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}

/// Helper trait for constructing resolvers from configuration
pub trait ReverseResolverFactory: Send + Sync {
    /// Create a ReverseResolver instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Resolver configuration
    ///
    /// # Returns
    ///
    /// A shared ReverseResolver trait object
    fn create(
        &self,
        config: &crate::config::ResolverConfig,
    ) -> Result<Arc<dyn ReverseResolver>, crate::Error>;
}
