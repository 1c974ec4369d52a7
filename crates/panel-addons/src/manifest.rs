use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Install descriptor fetched from the addon store (`install.json`).
///
/// `commands` is keyed by an explicit sequence number so execution order
/// is deterministic regardless of how the JSON object was stored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallManifest {
    pub name: Option<String>,
    pub author: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub note: Option<String>,
    pub commands: BTreeMap<String, String>,
}

impl InstallManifest {
    /// Branch to clone, defaulting to the registry's conventional branch.
    pub fn branch_name(&self) -> &str {
        self.branch.as_deref().unwrap_or("main")
    }

    /// Commands in execution order: numeric keys ascending, then any
    /// non-numeric keys lexically. An empty map is a valid no-op install.
    pub fn ordered_commands(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(&String, &String)> = self.commands.iter().collect();

        entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });

        entries
            .into_iter()
            .map(|(key, cmd)| (key.clone(), cmd.clone()))
            .collect()
    }
}

/// Display metadata for one addon in the store (`info.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AddonInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "longDescription")]
    pub long_description: Option<String>,
    pub author: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub icon: Option<String>,
    pub features: Vec<String>,
    pub github: Option<String>,
    pub screenshots: Vec<String>,
}

/// One catalog entry served to the store UI: display metadata merged
/// with the install manifest fields the frontend surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAddon {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub long_description: String,
    pub author: String,
    pub status: String,
    pub tags: Vec<String>,
    pub icon: String,
    pub features: Vec<String>,
    pub github: String,
    pub screenshots: Vec<String>,
    pub install_repo: String,
    pub install_branch: String,
    pub install_note: String,
    pub install_commands: BTreeMap<String, String>,
}
