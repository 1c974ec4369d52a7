pub mod addon;
pub mod command;
pub mod error;
pub mod host;
pub mod manifest;
pub mod progress;
pub mod slug;

pub use addon::{AddonEntry, InstalledAddon};
pub use command::{CommandLine, is_allowed, parse_command};
pub use error::InstallError;
pub use host::{AddonHost, HostError};
pub use manifest::{AddonInfo, InstallManifest, StoreAddon};
pub use progress::ProgressEvent;
pub use slug::Slug;
