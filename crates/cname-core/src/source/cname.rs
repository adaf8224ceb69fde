//! CNAME-rewriting endpoint source
//!
//! [`CnameSource`] wraps another [`EndpointSource`]. Every endpoint whose
//! first target reverse-resolves to a hostname is rewritten into a CNAME
//! record pointing at that hostname; endpoints that fail to resolve are
//! passed through untouched.
//!
//! ## Flow
//!
//! ```text
//! ┌────────────────┐  Vec<Endpoint>  ┌──────────────┐  PTR   ┌──────────────────┐
//! │ wrapped source │───────────────▶│ CnameSource  │◀──────▶│ ReverseResolver  │
//! └────────────────┘                 └──────────────┘        └──────────────────┘
//!                                           │
//!                                           ▼
//!                                   rewritten endpoints
//! ```

use crate::endpoint::{Endpoint, RecordType};
use crate::error::{Error, Result};
use crate::traits::{ClusterClient, EndpointSource, EventHandler, ReverseResolver};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Endpoint source decorator that publishes PTR names as CNAME targets
///
/// ## Behavior
///
/// - Only `targets[0]` of each endpoint is looked up
/// - Lookups run one at a time, in source order
/// - A failed lookup never fails the batch; the endpoint keeps its original form
/// - One trailing `.` is stripped from resolved names, so the published
///   target matches what record providers hand back on the next pass
pub struct CnameSource {
    /// Cluster API handle shared with the wrapped source
    client: Arc<dyn ClusterClient>,

    /// Namespace the wrapped source is scoped to
    namespace: String,

    /// The source whose endpoints are rewritten
    source: Box<dyn EndpointSource>,

    /// Resolver used for PTR lookups
    resolver: Arc<dyn ReverseResolver>,

    /// Optional bound on a single lookup
    lookup_timeout: Option<Duration>,
}

impl CnameSource {
    /// Wrap `source`
    ///
    /// # Parameters
    ///
    /// - `client`: Cluster API handle (kept for parity with the wrapped source)
    /// - `namespace`: Namespace the wrapped source is scoped to
    /// - `source`: The source to decorate
    /// - `resolver`: Reverse resolver for address targets
    pub fn new(
        client: Arc<dyn ClusterClient>,
        namespace: impl Into<String>,
        source: Box<dyn EndpointSource>,
        resolver: Arc<dyn ReverseResolver>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            source,
            resolver,
            lookup_timeout: None,
        }
    }

    /// Build from configuration
    ///
    /// Unlike [`CnameSource::new`] this validates `config` first.
    pub fn from_config(
        config: &crate::config::CnameSourceConfig,
        client: Arc<dyn ClusterClient>,
        source: Box<dyn EndpointSource>,
        resolver: Arc<dyn ReverseResolver>,
    ) -> Result<Self> {
        config.validate()?;

        let mut cname = Self::new(client, config.namespace.clone(), source, resolver);
        cname.lookup_timeout = config.lookup_timeout();
        Ok(cname)
    }

    /// Bound every reverse lookup by `timeout`
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Namespace the wrapped source is scoped to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Cluster API handle
    pub fn client(&self) -> &Arc<dyn ClusterClient> {
        &self.client
    }

    /// Configured lookup bound, if any
    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout
    }

    /// Resolve `target` to its preferred hostname
    async fn resolve(&self, target: &str) -> Result<String> {
        let lookup = self.resolver.lookup_addr(target);

        let names = match self.lookup_timeout {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .map_err(|_| Error::lookup_timeout(target, limit))??,
            None => lookup.await?,
        };

        names
            .into_iter()
            .next()
            .ok_or_else(|| Error::lookup(target, "resolver returned no names"))
    }

    /// Rewrite `endpoint` in place if its first target resolves
    async fn rewrite(&self, endpoint: &mut Endpoint) {
        let Some(target) = endpoint.first_target().map(str::to_owned) else {
            return;
        };

        let hostname = match self.resolve(&target).await {
            Ok(hostname) => hostname,
            Err(e) => {
                warn!("Error retrieving PTR record, leaving as-is: {}", target);
                debug!(
                    "PTR lookup error ({}): {}",
                    self.resolver.resolver_name(),
                    e
                );
                return;
            }
        };

        debug!("Resolved PTR {} -> {}", endpoint.dns_name, hostname);

        endpoint.targets[0] = trim_root_label(&hostname).to_string();
        endpoint.record_type = RecordType::Cname;
    }
}

/// Strip exactly one trailing root-label separator from `hostname`
pub fn trim_root_label(hostname: &str) -> &str {
    hostname.strip_suffix('.').unwrap_or(hostname)
}

#[async_trait]
impl EndpointSource for CnameSource {
    async fn endpoints(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        let mut endpoints = self.source.endpoints(cancel).await?;

        if let Some(empty) = endpoints.iter().find(|e| e.targets.is_empty()) {
            return Err(Error::contract(format!(
                "endpoint {} was produced without targets",
                empty.dns_name
            )));
        }

        for endpoint in endpoints.iter_mut() {
            self.rewrite(endpoint).await;
        }

        Ok(endpoints)
    }

    fn add_event_handler(&self, cancel: &CancellationToken, handler: EventHandler) {
        debug!("Adding event handler for CNAME source");
        self.source.add_event_handler(cancel, handler);
    }
}
