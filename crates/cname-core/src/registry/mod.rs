//! Plugin-based resolver registry
//!
//! The registry allows reverse resolvers to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cname_core::registry::ResolverRegistry;
//! use cname_core::config::ResolverConfig;
//!
//! // Create a registry
//! let registry = ResolverRegistry::new();
//!
//! // Register resolvers (plugin crates expose a `register()` helper)
//! cname_resolver_system::register(&registry);
//!
//! // Create resolver from config
//! let resolver = registry.create_resolver(&ResolverConfig::System)?;
//! ```

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::traits::{ReverseResolver, ReverseResolverFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry for plugin-based resolver creation
///
/// Maps resolver type names to factory objects.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: RwLock<HashMap<String, Box<dyn ReverseResolverFactory>>>,
}

impl ResolverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    ///
    /// # Parameters
    ///
    /// - `name`: Resolver type name (e.g., "system")
    /// - `factory`: Factory object for creating resolver instances
    pub fn register_resolver(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ReverseResolverFactory>,
    ) {
        let mut resolvers = self.resolvers.write().unwrap_or_else(PoisonError::into_inner);
        resolvers.insert(name.into(), factory);
    }

    /// Create a resolver from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn ReverseResolver>)`: Created resolver instance
    /// - `Err(Error)`: If the resolver type is not registered or creation fails
    pub fn create_resolver(&self, config: &ResolverConfig) -> Result<Arc<dyn ReverseResolver>> {
        let resolver_type = config.type_name();
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = resolvers
            .get(resolver_type)
            .ok_or_else(|| Error::config(format!("Unknown resolver type: {}", resolver_type)))?;

        factory.create(config)
    }

    /// List all registered resolver types, sorted
    pub fn list_resolvers(&self) -> Vec<String> {
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = resolvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a resolver type is registered
    pub fn has_resolver(&self, name: &str) -> bool {
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);
        resolvers.contains_key(name)
    }
}
