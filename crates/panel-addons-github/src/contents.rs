use serde::Deserialize;

/// One entry from the GitHub contents API listing of the registry repo.
#[derive(Debug, Deserialize)]
pub struct ContentsEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl ContentsEntry {
    /// Registry addon folders are directories not starting with a dot.
    pub fn is_addon_folder(&self) -> bool {
        self.entry_type == "dir" && !self.name.starts_with('.')
    }
}
