//! Test doubles and common utilities for CNAME source contract tests
//!
//! This module provides minimal test doubles that record how the decorator
//! talks to its collaborators.

#![allow(dead_code)]

use cname_core::error::{Error, Result};
use cname_core::traits::{
    ClusterClient, EndpointSource, EventHandler, ReverseResolver, StaticClusterClient,
};
use cname_core::{CnameSource, Endpoint, RecordType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A source that returns a scripted result and records every call
pub struct ScriptedSource {
    /// Endpoints to return, or the message of a source error
    result: std::result::Result<Vec<Endpoint>, String>,
    /// Call counter for endpoints()
    endpoints_call_count: Arc<AtomicUsize>,
    /// Tokens passed to endpoints()
    endpoint_tokens: Arc<Mutex<Vec<CancellationToken>>>,
    /// Registrations received through add_event_handler()
    handlers: Arc<Mutex<Vec<(CancellationToken, EventHandler)>>>,
}

impl ScriptedSource {
    /// Create a source returning `endpoints`
    pub fn returning(endpoints: Vec<Endpoint>) -> Self {
        Self::with_result(Ok(endpoints))
    }

    /// Create a source whose endpoints() fails with `message`
    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(result: std::result::Result<Vec<Endpoint>, String>) -> Self {
        Self {
            result,
            endpoints_call_count: Arc::new(AtomicUsize::new(0)),
            endpoint_tokens: Arc::new(Mutex::new(Vec::new())),
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the number of times endpoints() was called
    pub fn endpoints_call_count(&self) -> usize {
        self.endpoints_call_count.load(Ordering::SeqCst)
    }

    /// Tokens received by endpoints(), in call order
    pub fn endpoint_tokens(&self) -> Vec<CancellationToken> {
        self.endpoint_tokens.lock().unwrap().clone()
    }

    /// Registrations received by add_event_handler(), in call order
    pub fn handlers(&self) -> Vec<(CancellationToken, EventHandler)> {
        self.handlers.lock().unwrap().clone()
    }

    /// Create a new ScriptedSource that shares result and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            result: other.result.clone(),
            endpoints_call_count: Arc::clone(&other.endpoints_call_count),
            endpoint_tokens: Arc::clone(&other.endpoint_tokens),
            handlers: Arc::clone(&other.handlers),
        }
    }
}

#[async_trait::async_trait]
impl EndpointSource for ScriptedSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        self.endpoints_call_count.fetch_add(1, Ordering::SeqCst);
        self.endpoint_tokens.lock().unwrap().push(cancel.clone());

        match &self.result {
            Ok(endpoints) => Ok(endpoints.clone()),
            Err(message) => Err(Error::endpoint_source(message.clone())),
        }
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        self.handlers.lock().unwrap().push((cancel.clone(), handler));
    }
}

/// What a scripted resolver answers for one address
#[derive(Clone)]
pub enum Answer {
    /// Resolve to these names
    Names(Vec<String>),
    /// Fail with this message
    Fail(String),
    /// Resolve to these names after sleeping
    Slow(Duration, Vec<String>),
}

/// A resolver answering from a fixed table and recording lookups
///
/// Addresses missing from the table fail like an address without a PTR record.
pub struct ScriptedResolver {
    answers: HashMap<String, Answer>,
    /// Addresses looked up, in call order
    lookups: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer `addr` with `names`
    pub fn resolves(mut self, addr: &str, names: &[&str]) -> Self {
        self.answers.insert(
            addr.to_string(),
            Answer::Names(names.iter().map(|n| n.to_string()).collect()),
        );
        self
    }

    /// Fail lookups of `addr`
    pub fn fails(mut self, addr: &str, message: &str) -> Self {
        self.answers
            .insert(addr.to_string(), Answer::Fail(message.to_string()));
        self
    }

    /// Answer `addr` with `names` after `delay`
    pub fn slow(mut self, addr: &str, delay: Duration, names: &[&str]) -> Self {
        self.answers.insert(
            addr.to_string(),
            Answer::Slow(delay, names.iter().map(|n| n.to_string()).collect()),
        );
        self
    }

    /// Addresses looked up so far
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    /// Shared handle to the lookup log
    pub fn lookup_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.lookups)
    }
}

#[async_trait::async_trait]
impl ReverseResolver for ScriptedResolver {
    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>> {
        self.lookups.lock().unwrap().push(addr.to_string());

        match self.answers.get(addr).cloned() {
            Some(Answer::Names(names)) => Ok(names),
            Some(Answer::Fail(message)) => Err(Error::lookup(addr, message)),
            Some(Answer::Slow(delay, names)) => {
                tokio::time::sleep(delay).await;
                Ok(names)
            }
            None => Err(Error::lookup(addr, "no PTR record")),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// Shorthand for an address endpoint with inferred record type
pub fn address_endpoint(name: &str, target: &str) -> Endpoint {
    Endpoint::new(name, RecordType::for_target(target), [target])
}

/// Cluster handle used by every test
pub fn test_client() -> Arc<dyn ClusterClient> {
    Arc::new(StaticClusterClient::new("https://cluster.test:6443"))
}

/// Wrap `source` with `resolver` in namespace "default"
pub fn decorate(source: ScriptedSource, resolver: ScriptedResolver) -> CnameSource {
    CnameSource::new(
        test_client(),
        "default",
        Box::new(source),
        Arc::new(resolver),
    )
}

/// Install a debug-level subscriber writing to the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Shared in-memory sink for formatted log lines
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Subscriber writing DEBUG and above into this buffer, without colors
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish()
    }

    /// Captured lines
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Captured lines at `level` containing `needle`
    pub fn matching(&self, level: &str, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(level) && line.contains(needle))
            .collect()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
