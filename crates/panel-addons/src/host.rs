use std::path::Path;

/// Errors reported by an addon host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to load addon code: {0}")]
    Load(String),

    #[error("failed to unload addon code: {0}")]
    Unload(String),
}

/// Capability interface for activating addon code in the running host.
///
/// The pipeline only promotes directories and keeps the registry
/// consistent; actually loading code into the process (and running any
/// schema migrations an addon ships) is the host platform's concern.
#[async_trait::async_trait]
pub trait AddonHost: Send + Sync {
    /// Load (or re-load) the addon rooted at `path`.
    /// Returns the number of schema migrations applied.
    async fn load(&self, path: &Path) -> Result<u64, HostError>;

    /// Unload the addon identified by `slug`. Unknown slugs are a no-op.
    async fn unload(&self, slug: &str) -> Result<(), HostError>;
}
