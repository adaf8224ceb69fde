// # Cluster Client Trait
//
// Handle to the orchestration API that sources enumerate entities from.
// Sources built on top of another source keep the same handle so every
// source in the chain is constructed with the same collaborators.

/// Handle to a cluster API
pub trait ClusterClient: Send + Sync {
    /// Address of the API server this client talks to
    fn server(&self) -> &str;
}

/// Client for a fixed API server address
///
/// Used when the process has no real cluster connection (tests, the daemon's
/// static mode) but sources still expect a client handle.
#[derive(Debug, Clone)]
pub struct StaticClusterClient {
    server: String,
}

impl StaticClusterClient {
    /// Create a client handle for `server`
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }
}

impl Default for StaticClusterClient {
    fn default() -> Self {
        Self::new("in-cluster")
    }
}

impl ClusterClient for StaticClusterClient {
    fn server(&self) -> &str {
        &self.server
    }
}
