// # Endpoint Source Trait
//
// Defines the interface for producing DNS endpoints and subscribing to
// changes in whatever the source watches.
//
// ## Implementations
//
// - In-memory: `MemoryEndpointSource` (fixed list, manual updates)
// - Decorator: `CnameSource` (wraps another source, rewrites address targets)
//
// ## Usage
//
// ```rust,ignore
// use cname_core::EndpointSource;
// use tokio_util::sync::CancellationToken;
// use std::sync::Arc;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* EndpointSource implementation */;
//     let cancel = CancellationToken::new();
//
//     // Produce the current endpoints
//     for endpoint in source.endpoints(&cancel).await? {
//         println!("{}", endpoint);
//     }
//
//     // Get notified when the watched state changes
//     source.add_event_handler(&cancel, Arc::new(|| println!("changed")));
//
//     Ok(())
// }
// ```

use crate::endpoint::Endpoint;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Callback invoked when a source's underlying state changes
///
/// Handlers take no arguments: they only signal that `endpoints()` may now
/// return something different.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Trait for endpoint source implementations
///
/// A source enumerates whatever it watches and yields the DNS records that
/// should exist for it. Sources compose: a decorator can wrap another source
/// and still be used anywhere a plain source is expected.
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait EndpointSource: Send + Sync {
    /// Produce the current list of endpoints
    ///
    /// Each call returns a freshly built vector owned by the caller. Callers
    /// are free to mutate the returned endpoints.
    ///
    /// # Parameters
    ///
    /// - `cancel`: Token the caller cancels to abandon the request
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Endpoint>)`: The endpoints in source order
    /// - `Err(Error)`: If the source could not enumerate its entities
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, crate::Error>;

    /// Register a change notification handler
    ///
    /// The handler stays registered until `cancel` is cancelled.
    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler);
}

#[async_trait]
impl<S: EndpointSource + ?Sized> EndpointSource for Box<S> {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, crate::Error> {
        (**self).endpoints(cancel).await
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        (**self).add_event_handler(cancel, handler)
    }
}

#[async_trait]
impl<S: EndpointSource + ?Sized> EndpointSource for Arc<S> {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, crate::Error> {
        (**self).endpoints(cancel).await
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        (**self).add_event_handler(cancel, handler)
    }
}
