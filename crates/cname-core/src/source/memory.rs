// # Memory Endpoint Source
//
// In-memory implementation of EndpointSource.
//
// ## Purpose
//
// Serves a fixed list of endpoints that the embedding application controls.
// Useful for testing, static deployments and as the innermost source of a
// decorator chain when no cluster is available.
//
// ## Change Notification
//
// - `set_endpoints()` replaces the list and notifies every live handler
// - A handler is dropped once the token it was registered with is cancelled

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::traits::{EndpointSource, EventHandler};
use crate::Error;

/// In-memory endpoint source implementation
///
/// # Example
///
/// ```rust,no_run
/// use cname_core::source::MemoryEndpointSource;
/// use cname_core::{Endpoint, EndpointSource, RecordType};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = MemoryEndpointSource::new(vec![
///         Endpoint::new("svc.example.com", RecordType::A, ["203.0.113.9"]),
///     ]);
///
///     let endpoints = source.endpoints(&CancellationToken::new()).await?;
///     assert_eq!(endpoints.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct MemoryEndpointSource {
    endpoints: Arc<RwLock<Vec<Endpoint>>>,
    handlers: Arc<Mutex<Vec<(CancellationToken, EventHandler)>>>,
}

impl MemoryEndpointSource {
    /// Create a source serving `endpoints`
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints: Arc::new(RwLock::new(endpoints)),
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the served endpoints and notify handlers
    pub async fn set_endpoints(&self, endpoints: Vec<Endpoint>) {
        {
            let mut current = self.endpoints.write().await;
            *current = endpoints;
        }

        self.notify();
    }

    /// Number of live handler registrations
    pub fn handler_count(&self) -> usize {
        self.live_handlers().len()
    }

    /// Invoke every live handler
    fn notify(&self) {
        let handlers = self.live_handlers();
        debug!("Notifying {} event handler(s)", handlers.len());

        for handler in handlers {
            handler();
        }
    }

    /// Prune cancelled registrations and return the remaining handlers
    ///
    /// Handlers are cloned out so none runs while the lock is held.
    fn live_handlers(&self) -> Vec<EventHandler> {
        let mut handlers = match self.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        handlers.retain(|(token, _)| !token.is_cancelled());
        handlers.iter().map(|(_, handler)| Arc::clone(handler)).collect()
    }
}

#[async_trait]
impl EndpointSource for MemoryEndpointSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let endpoints = self.endpoints.read().await;
        Ok(endpoints.clone())
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        let mut handlers = match self.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        handlers.push((cancel.clone(), handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn endpoint(name: &str, target: &str) -> Endpoint {
        Endpoint::new(name, RecordType::for_target(target), [target])
    }

    #[tokio::test]
    async fn test_serves_configured_endpoints() {
        let source = MemoryEndpointSource::new(vec![
            endpoint("a.example.com", "10.0.0.1"),
            endpoint("b.example.com", "10.0.0.2"),
        ]);

        let endpoints = source.endpoints(&CancellationToken::new()).await.unwrap();
        let names: Vec<_> = endpoints.iter().map(|e| e.dns_name.as_str()).collect();
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
    }

    #[tokio::test]
    async fn test_each_call_returns_independent_copy() {
        let source = MemoryEndpointSource::new(vec![endpoint("a.example.com", "10.0.0.1")]);
        let cancel = CancellationToken::new();

        let mut first = source.endpoints(&cancel).await.unwrap();
        first[0].targets[0] = "mutated".to_string();

        let second = source.endpoints(&cancel).await.unwrap();
        assert_eq!(second[0].targets[0], "10.0.0.1");
    }

    #[tokio::test]
    async fn test_cancelled_token_fails() {
        let source = MemoryEndpointSource::new(Vec::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = source.endpoints(&cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_set_endpoints_notifies_live_handlers() {
        let source = MemoryEndpointSource::new(Vec::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let live = CancellationToken::new();
        let counter = Arc::clone(&calls);
        source.add_event_handler(
            &live,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let expired = CancellationToken::new();
        let counter = Arc::clone(&calls);
        source.add_event_handler(
            &expired,
            Arc::new(move || {
                counter.fetch_add(100, Ordering::SeqCst);
            }),
        );
        expired.cancel();

        source
            .set_endpoints(vec![endpoint("a.example.com", "10.0.0.1")])
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.handler_count(), 1);
    }

    #[test]
    fn test_sync_read_with_block_on() {
        let source = MemoryEndpointSource::new(vec![endpoint("a.example.com", "10.0.0.1")]);
        let endpoints = tokio_test::block_on(source.endpoints(&CancellationToken::new())).unwrap();
        assert_eq!(endpoints.len(), 1);
    }
}
