// # cname-core
//
// Core library for publishing address endpoints as CNAME records.
//
// ## Architecture Overview
//
// - **EndpointSource**: Trait for producing DNS endpoints and forwarding change notifications
// - **ReverseResolver**: Trait for PTR lookups (address → hostname)
// - **CnameSource**: Decorator that rewrites resolvable address targets into CNAME targets
// - **MemoryEndpointSource**: In-memory source for static deployments and tests
// - **ResolverRegistry**: Plugin-based registry for reverse resolvers
//
// ## Design Principles
//
// 1. **Composition**: Decorators wrap sources and implement the same trait
// 2. **Best Effort**: A failed lookup leaves its endpoint as produced, never fails the batch
// 3. **Plugin-Based**: Resolvers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod endpoint;
pub mod source;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{ClusterClient, EndpointSource, EventHandler, ReverseResolver, StaticClusterClient};
pub use endpoint::{Endpoint, RecordType};
pub use source::{CnameSource, MemoryEndpointSource};
pub use registry::ResolverRegistry;
pub use config::{CnameSourceConfig, ResolverConfig};
pub use error::{Error, Result};
