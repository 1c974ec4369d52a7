pub mod executor;
pub mod fetcher;
pub mod install;
pub mod registry;
pub mod staging;

pub use executor::InstallRunner;
pub use fetcher::{GitCloneFetcher, SourceFetcher};
pub use install::Installer;
pub use registry::{NoopHost, ReloadReport, ToggleOutcome, list_entries, reload, toggle};
pub use staging::StagingDir;
