// # System Reverse Resolver
//
// This crate provides a ReverseResolver backed by the operating system's
// resolver (getnameinfo), so lookups honor /etc/hosts, nsswitch and the
// configured nameservers exactly like other programs on the host.
//
// ## Blocking
//
// getnameinfo blocks the calling thread. Lookups run on tokio's blocking
// pool; timeouts and retries are whatever the system resolver does.
//
// ## Answers
//
// - The target must be a literal IPv4/IPv6 address; hostnames are rejected
//   with `Error::InvalidInput` so they pass through the CNAME source untouched
// - When no PTR record exists getnameinfo falls back to the numeric form of
//   the address; that answer is reported as `Error::Lookup`

use cname_core::config::ResolverConfig;
use cname_core::traits::{ReverseResolver, ReverseResolverFactory};
use cname_core::{Error, ResolverRegistry, Result};

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

/// Registry name of this resolver
pub const RESOLVER_NAME: &str = "system";

/// Reverse resolver using the operating system's getnameinfo
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    /// Create a new system resolver
    pub fn new() -> Self {
        Self
    }
}

/// Parse a lookup target into an address
fn parse_target(addr: &str) -> Result<IpAddr> {
    addr.trim()
        .parse()
        .map_err(|e| Error::invalid_input(format!("'{}' is not an IP address: {}", addr, e)))
}

/// Interpret a getnameinfo answer for `ip`
fn interpret_answer(ip: IpAddr, name: String) -> Result<Vec<String>> {
    let numeric = name.parse::<IpAddr>().map(|parsed| parsed == ip).unwrap_or(false);

    if name.is_empty() || numeric {
        return Err(Error::lookup(ip.to_string(), "no PTR record"));
    }

    Ok(vec![name])
}

#[async_trait]
impl ReverseResolver for SystemResolver {
    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>> {
        let ip = parse_target(addr)?;

        let name = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&ip))
            .await
            .map_err(|e| Error::lookup(addr, format!("lookup task failed: {}", e)))?
            .map_err(|e| Error::lookup(addr, e.to_string()))?;

        debug!("getnameinfo {} -> {}", ip, name);

        interpret_answer(ip, name)
    }

    fn resolver_name(&self) -> &'static str {
        RESOLVER_NAME
    }
}

/// Factory for SystemResolver
pub struct SystemResolverFactory;

impl ReverseResolverFactory for SystemResolverFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Arc<dyn ReverseResolver>> {
        match config {
            ResolverConfig::System => Ok(Arc::new(SystemResolver::new())),
            ResolverConfig::Custom { factory, .. } if factory == RESOLVER_NAME => {
                Ok(Arc::new(SystemResolver::new()))
            }
            _ => Err(Error::config("Invalid config for system resolver")),
        }
    }
}

/// Register the system resolver with the registry
pub fn register(registry: &ResolverRegistry) {
    registry.register_resolver(RESOLVER_NAME, Box::new(SystemResolverFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_factory_creation() {
        let factory = SystemResolverFactory;

        let resolver = factory.create(&ResolverConfig::System);
        assert!(resolver.is_ok());
    }

    #[test]
    fn test_factory_rejects_foreign_custom_config() {
        let factory = SystemResolverFactory;
        let config = ResolverConfig::Custom {
            factory: "hickory".to_string(),
            config: serde_json::json!({}),
        };

        assert!(factory.create(&config).is_err());
    }

    #[test]
    fn test_register_adds_system_entry() {
        let registry = ResolverRegistry::new();
        register(&registry);

        assert!(registry.has_resolver(RESOLVER_NAME));
        let resolver = registry.create_resolver(&ResolverConfig::System).unwrap();
        assert_eq!(resolver.resolver_name(), "system");
    }

    #[test]
    fn test_numeric_answer_means_no_ptr() {
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9));
        let result = interpret_answer(ip, "203.0.113.9".to_string());
        assert!(matches!(result, Err(Error::Lookup { .. })));
    }

    #[test]
    fn test_hostname_answer_is_returned() {
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9));
        let names = interpret_answer(ip, "svc-lb.cloudprovider.net".to_string()).unwrap();
        assert_eq!(names, vec!["svc-lb.cloudprovider.net"]);
    }

    #[tokio::test]
    async fn test_hostname_target_is_invalid_input() {
        let resolver = SystemResolver::new();
        let result = resolver.lookup_addr("lb.example.net").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_loopback_lookup_answers_name_or_lookup_error() {
        // Answer depends on the host's resolver configuration
        let resolver = SystemResolver::new();
        match resolver.lookup_addr("127.0.0.1").await {
            Ok(names) => {
                assert!(!names.is_empty());
                assert!(names.iter().all(|n| n != "127.0.0.1"));
            }
            Err(e) => assert!(matches!(e, Error::Lookup { .. }), "unexpected error: {e}"),
        }
    }
}
