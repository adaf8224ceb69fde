//! Minimal embedding example for cname-core
//!
//! This example demonstrates using cname-core as a library in a custom
//! application: an application-owned endpoint source and resolver are
//! wrapped by the CNAME decorator, and the application drives the passes.

use cname_core::traits::{EndpointSource, EventHandler, ReverseResolver};
use cname_core::{CnameSource, Endpoint, Error, RecordType, Result, StaticClusterClient};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Custom endpoint source for embedded usage
///
/// Stands in for a source that lists load balancer addresses.
struct EmbeddedSource {
    endpoints: Vec<Endpoint>,
    handlers: Mutex<Vec<EventHandler>>,
}

impl EmbeddedSource {
    fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints,
            handlers: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl EndpointSource for EmbeddedSource {
    async fn endpoints(&self, _cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        Ok(self.endpoints.clone())
    }

    fn add_event_handler(&self, _cancel: &CancellationToken, handler: EventHandler) {
        println!("[Embedded] Handler registered");
        self.handlers.lock().unwrap().push(handler);
    }
}

/// Custom resolver answering from a fixed table
struct EmbeddedResolver {
    table: HashMap<&'static str, &'static str>,
    lookups: AtomicUsize,
}

impl EmbeddedResolver {
    fn new() -> Self {
        let mut table = HashMap::new();
        table.insert("203.0.113.9", "svc-lb.cloudprovider.net.");
        table.insert("203.0.113.10", "api-lb.cloudprovider.net");

        Self {
            table,
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReverseResolver for EmbeddedResolver {
    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        match self.table.get(addr) {
            Some(name) => Ok(vec![name.to_string()]),
            None => Err(Error::lookup(addr, "no PTR record")),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Embedded cname-core Example ===\n");

    let source = EmbeddedSource::new(vec![
        Endpoint::new("svc.example.com", RecordType::A, ["203.0.113.9"]),
        Endpoint::new("api.example.com", RecordType::A, ["203.0.113.10"]),
        Endpoint::new("legacy.example.com", RecordType::A, ["198.51.100.7"]),
    ]);
    let resolver = Arc::new(EmbeddedResolver::new());

    let cname = CnameSource::new(
        Arc::new(StaticClusterClient::default()),
        "default",
        Box::new(source),
        resolver.clone(),
    )
    .with_lookup_timeout(Duration::from_secs(2));

    let cancel = CancellationToken::new();
    cname.add_event_handler(&cancel, Arc::new(|| println!("[Embedded] Source changed")));

    let endpoints = cname.endpoints(&cancel).await?;

    println!();
    for endpoint in &endpoints {
        println!("{}", serde_json::to_string(endpoint)?);
    }

    println!("\n=== Summary ===");
    println!("Endpoints: {}", endpoints.len());
    println!(
        "Rewritten to CNAME: {}",
        endpoints
            .iter()
            .filter(|e| e.record_type == RecordType::Cname)
            .count()
    );
    println!("PTR lookups: {}", resolver.lookup_count());

    Ok(())
}
