//! Core traits for the CNAME source
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`EndpointSource`]: Produce DNS endpoints and forward change notifications
//! - [`ReverseResolver`]: Resolve addresses back to hostnames
//! - [`ClusterClient`]: Handle to the cluster API shared by sources

pub mod endpoint_source;
pub mod reverse_resolver;
pub mod cluster_client;

pub use endpoint_source::{EndpointSource, EventHandler};
pub use reverse_resolver::{ReverseResolver, ReverseResolverFactory};
pub use cluster_client::{ClusterClient, StaticClusterClient};
