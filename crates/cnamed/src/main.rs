// # cnamed - CNAME source daemon
//
// Thin integration layer around cname-core. It serves a static endpoint list
// through the CNAME decorator and prints the resulting endpoints, one JSON
// object per line, on every reconciliation pass.
//
// The cnamed daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering reverse resolvers
// 4. Running the reconcile loop until shutdown
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Endpoints
// - `CNAME_ENDPOINTS`: `;`-separated `name=target[,target...]` entries
// - `CNAME_NAMESPACE`: Namespace scope (empty = all namespaces)
//
// ### Resolution
// - `CNAME_RESOLVER_TYPE`: Reverse resolver (system)
// - `CNAME_LOOKUP_TIMEOUT_SECS`: Upper bound for a single PTR lookup (optional)
//
// ### Loop
// - `CNAME_INTERVAL_SECS`: Seconds between reconciliation passes
// - `CNAME_ONCE`: Run a single pass and exit (true/false)
// - `CNAME_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Reload
//
// On SIGHUP the daemon re-reads `CNAME_ENDPOINTS` from its environment and
// reconciles immediately. An invalid list is logged and the previous one kept.
//
// ## Example
//
// ```bash
// export CNAME_ENDPOINTS="web.example.com=203.0.113.9;api.example.com=203.0.113.10"
// export CNAME_LOOKUP_TIMEOUT_SECS=5
// export CNAME_ONCE=true
//
// cnamed
// ```

use anyhow::Result;
use cname_core::{
    CnameSource, CnameSourceConfig, Endpoint, EndpointSource, MemoryEndpointSource, RecordType,
    ResolverConfig, ResolverRegistry, ReverseResolver, StaticClusterClient,
};
use std::env;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Default seconds between reconciliation passes
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum CnamedExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<CnamedExitCode> for ExitCode {
    fn from(code: CnamedExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    endpoints: Vec<Endpoint>,
    namespace: String,
    resolver_type: String,
    lookup_timeout_secs: Option<u64>,
    interval_secs: u64,
    once: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `get`, which maps a variable name to its value
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoints = match get("CNAME_ENDPOINTS") {
            Some(raw) => parse_endpoints(&raw)?,
            None => anyhow::bail!(
                "CNAME_ENDPOINTS is required. \
                Set it via: export CNAME_ENDPOINTS=web.example.com=203.0.113.9"
            ),
        };

        let lookup_timeout_secs = match get("CNAME_LOOKUP_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse().map_err(|e| {
                anyhow::anyhow!("CNAME_LOOKUP_TIMEOUT_SECS '{}' is not a number: {}", raw, e)
            })?),
            None => None,
        };

        let interval_secs = match get("CNAME_INTERVAL_SECS") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                anyhow::anyhow!("CNAME_INTERVAL_SECS '{}' is not a number: {}", raw, e)
            })?,
            None => DEFAULT_INTERVAL_SECS,
        };

        Ok(Self {
            endpoints,
            namespace: get("CNAME_NAMESPACE").unwrap_or_default(),
            resolver_type: get("CNAME_RESOLVER_TYPE").unwrap_or_else(|| "system".to_string()),
            lookup_timeout_secs,
            interval_secs,
            once: get("CNAME_ONCE").is_some_and(|v| parse_flag(&v)),
            log_level: get("CNAME_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            anyhow::bail!("CNAME_ENDPOINTS must contain at least one entry");
        }

        for endpoint in &self.endpoints {
            validate_domain_name(&endpoint.dns_name)?;
        }

        match self.resolver_type.as_str() {
            "system" => {}
            _ => anyhow::bail!(
                "CNAME_RESOLVER_TYPE '{}' is not supported. \
                Supported resolvers: system",
                self.resolver_type
            ),
        }

        if !(1..=3600).contains(&self.interval_secs) {
            anyhow::bail!(
                "CNAME_INTERVAL_SECS must be between 1 and 3600 seconds. Got: {}",
                self.interval_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "CNAME_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.source_config().validate()?;

        Ok(())
    }

    /// Configuration handed to the CNAME source
    fn source_config(&self) -> CnameSourceConfig {
        CnameSourceConfig {
            namespace: self.namespace.clone(),
            lookup_timeout_secs: self.lookup_timeout_secs,
            resolver: match self.resolver_type.as_str() {
                "system" => ResolverConfig::System,
                other => ResolverConfig::Custom {
                    factory: other.to_string(),
                    config: serde_json::json!({}),
                },
            },
        }
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Parse a boolean flag value
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse `name=target[,target...]` entries separated by `;`
///
/// The record type is inferred from the first target.
fn parse_endpoints(raw: &str) -> Result<Vec<Endpoint>> {
    let mut endpoints = Vec::new();

    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((name, targets)) = entry.split_once('=') else {
            anyhow::bail!("Endpoint entry '{}' must look like name=target", entry);
        };

        let targets: Vec<&str> = targets
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let Some(first) = targets.first() else {
            anyhow::bail!("Endpoint entry '{}' has no targets", entry);
        };

        let record_type = RecordType::for_target(first);
        endpoints.push(Endpoint::new(name.trim(), record_type, targets));
    }

    Ok(endpoints)
}

/// Read and validate the endpoint list through `get`
fn load_endpoints(get: impl Fn(&str) -> Option<String>) -> Result<Vec<Endpoint>> {
    let Some(raw) = get("CNAME_ENDPOINTS") else {
        anyhow::bail!("CNAME_ENDPOINTS is not set");
    };

    let endpoints = parse_endpoints(&raw)?;
    if endpoints.is_empty() {
        anyhow::bail!("CNAME_ENDPOINTS must contain at least one entry");
    }

    for endpoint in &endpoints {
        validate_domain_name(&endpoint.dns_name)?;
    }

    Ok(endpoints)
}

/// Replace the served endpoints, keeping the current list on error
///
/// Registered change handlers fire only when the list was replaced.
async fn reload_endpoints(
    inner: &MemoryEndpointSource,
    get: impl Fn(&str) -> Option<String>,
) -> bool {
    match load_endpoints(get) {
        Ok(endpoints) => {
            info!("Reloaded {} endpoint(s)", endpoints.len());
            inner.set_endpoints(endpoints).await;
            true
        }
        Err(e) => {
            warn!("Endpoint reload rejected, keeping previous list: {}", e);
            false
        }
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; not exhaustive. A single leftmost `*` label is
/// accepted for wildcard records.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label == "*" {
            if index == 0 {
                continue;
            }
            anyhow::bail!(
                "Wildcard '*' is only allowed as the leftmost label. Got: '{}'",
                domain
            );
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CnamedExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return CnamedExitCode::ConfigError.into();
    }

    // Logs go to stderr; stdout carries the endpoint stream
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CnamedExitCode::ConfigError.into();
    }

    info!("Starting cnamed");
    info!("Configuration loaded: {} endpoint(s)", config.endpoints.len());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CnamedExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            CnamedExitCode::RuntimeError
        } else {
            CnamedExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the source chain for `config`
///
/// Returns the decorator together with a handle to the memory source it wraps,
/// which shares its endpoint list.
fn build_source(
    config: &Config,
    registry: &ResolverRegistry,
) -> Result<(CnameSource, MemoryEndpointSource)> {
    let source_config = config.source_config();
    let resolver = registry.create_resolver(&source_config.resolver)?;
    info!("Using {} resolver", resolver.resolver_name());

    let inner = MemoryEndpointSource::new(config.endpoints.clone());
    let source = CnameSource::from_config(
        &source_config,
        Arc::new(StaticClusterClient::default()),
        Box::new(inner.clone()),
        resolver,
    )?;

    Ok((source, inner))
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let registry = ResolverRegistry::new();

    #[cfg(feature = "system")]
    {
        info!("Registering system resolver");
        cname_resolver_system::register(&registry);
    }

    let (source, inner) = build_source(&config, &registry)?;
    let cancel = CancellationToken::new();

    if config.once {
        publish(&source, &cancel).await?;
        return Ok(());
    }

    // Source change notifications wake the loop early
    let (change_tx, change_rx) = mpsc::unbounded_channel();
    source.add_event_handler(
        &cancel,
        Arc::new(move || {
            let _ = change_tx.send(());
        }),
    );
    let mut changes = UnboundedReceiverStream::new(change_rx);
    let mut reload = ReloadSignal::new()?;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    info!("Reconciling every {}s", config.interval_secs);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                reconcile(&source, &cancel).await;
            }

            Some(()) = reload.recv() => {
                info!("Received SIGHUP, reloading endpoints");
                reload_endpoints(&inner, |key| env::var(key).ok()).await;
            }

            Some(()) = changes.next() => {
                debug!("Source changed, reconciling early");
                reconcile(&source, &cancel).await;
            }

            signal = &mut shutdown => {
                match signal {
                    Ok(name) => info!("Received shutdown signal: {}", name),
                    Err(e) => warn!("Shutdown signal handler failed: {}", e),
                }
                cancel.cancel();
                break;
            }
        }
    }

    info!("Shutting down cnamed");
    Ok(())
}

/// One reconciliation pass; failures are logged and retried on the next pass
async fn reconcile(source: &CnameSource, cancel: &CancellationToken) {
    if let Err(e) = publish(source, cancel).await {
        error!("Reconciliation failed: {}", e);
    }
}

/// Produce endpoints and write them to stdout as JSON lines
async fn publish(source: &CnameSource, cancel: &CancellationToken) -> Result<usize> {
    let endpoints = source.endpoints(cancel).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for endpoint in &endpoints {
        writeln!(out, "{}", serde_json::to_string(endpoint)?)?;
    }
    out.flush()?;

    let rewritten = endpoints
        .iter()
        .filter(|e| e.record_type == RecordType::Cname)
        .count();
    info!(
        "Published {} endpoint(s), {} as CNAME",
        endpoints.len(),
        rewritten
    );

    Ok(endpoints.len())
}

/// Endpoint reload trigger (SIGHUP)
#[cfg(unix)]
struct ReloadSignal(tokio::signal::unix::Signal);

#[cfg(unix)]
impl ReloadSignal {
    fn new() -> Result<Self> {
        let hangup = signal(SignalKind::hangup())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGHUP handler: {}", e))?;
        Ok(Self(hangup))
    }

    async fn recv(&mut self) -> Option<()> {
        self.0.recv().await
    }
}

/// Endpoint reload trigger
///
/// Non-Unix platforms have no SIGHUP; reloads never fire.
#[cfg(not(unix))]
struct ReloadSignal;

#[cfg(not(unix))]
impl ReloadSignal {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<()> {
        std::future::pending().await
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
