use serde::{Deserialize, Serialize};

/// Persistent registry record for an installed addon.
/// One record per final addon directory; `slug` doubles as the
/// directory name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledAddon {
    pub slug: String,
    pub name: String,
    pub author: Option<String>,
    pub note: Option<String>,
    pub enabled: bool,
}

/// One row in the admin addon list: a registry record merged with its
/// on-disk state. Directories without a record appear with
/// `registered: false` rather than breaking the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddonEntry {
    pub slug: String,
    pub name: String,
    pub author: Option<String>,
    pub enabled: bool,
    pub registered: bool,
}

impl AddonEntry {
    pub fn registered(addon: &InstalledAddon) -> Self {
        Self {
            slug: addon.slug.clone(),
            name: addon.name.clone(),
            author: addon.author.clone(),
            enabled: addon.enabled,
            registered: true,
        }
    }

    pub fn unregistered(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            author: None,
            enabled: false,
            registered: false,
        }
    }
}
