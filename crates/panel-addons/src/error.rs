/// Errors that can occur across the install/uninstall pipeline.
///
/// `InvalidSlug`, `AlreadyInstalled`, and `NotFound` are detected before
/// any event stream opens and surface as plain HTTP errors. Everything
/// else becomes a terminal `error` progress event once streaming has
/// begun.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("invalid addon slug: {0:?}")]
    InvalidSlug(String),

    #[error("addon already installed: {0}")]
    AlreadyInstalled(String),

    #[error("addon not found: {0}")]
    NotFound(String),

    #[error("could not fetch the install manifest for {0}")]
    ManifestUnavailable(String),

    #[error("install manifest is missing a valid \"repo\" URL")]
    InvalidRepo,

    #[error("command not permitted: {cmd:?}")]
    CommandRejected { cmd: String },

    #[error("{cmd:?} failed: {output}")]
    CommandFailed { cmd: String, output: String },

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("registry error: {0}")]
    Registry(String),
}
