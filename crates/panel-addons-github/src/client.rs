use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use panel_addons::{AddonInfo, InstallManifest, Slug, StoreAddon};

use crate::contents::ContentsEntry;

/// Errors that can occur when talking to the remote addon store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Configuration for the remote addon store.
///
/// The store is a GitHub repository with one folder per addon, each
/// containing an `info.json` and an `install.json`. Base URLs are
/// overridable so tests can point at a mock server.
#[derive(Debug, Clone)]
pub struct AddonStoreConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: Option<String>,
    pub api_base_url: Option<String>,
    pub raw_base_url: Option<String>,
}

impl Default for AddonStoreConfig {
    fn default() -> Self {
        Self {
            owner: "panel-addons".into(),
            repo: "registry".into(),
            branch: "main".into(),
            token: None,
            api_base_url: None,
            raw_base_url: None,
        }
    }
}

/// Client for the remote addon store.
///
/// Read-only; never retries. Callers decide what a missing manifest
/// means, so 404s come back as `Ok(None)` rather than errors.
pub struct AddonStoreClient {
    config: AddonStoreConfig,
    client: reqwest::Client,
}

const USER_AGENT: &str = "panel-addons";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

impl AddonStoreClient {
    pub fn new(config: AddonStoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or("https://api.github.com")
    }

    fn raw_base(&self) -> String {
        match &self.config.raw_base_url {
            Some(base) => base.trim_end_matches('/').to_owned(),
            None => format!(
                "https://raw.githubusercontent.com/{}/{}/{}",
                self.config.owner, self.config.repo, self.config.branch,
            ),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(FETCH_TIMEOUT);

        if let Some(token) = &self.config.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        req
    }

    /// Fetch a raw JSON file from the registry. 404 means the addon (or
    /// that particular file) does not exist — not an error.
    async fn fetch_raw_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, StoreError> {
        let url = format!("{}/{}", self.raw_base(), path);

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(StoreError::Network(format!(
                "fetching {path} returned HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    /// Display metadata for one addon, or `None` if the store has no
    /// `info.json` for this slug.
    pub async fn fetch_info(&self, slug: &Slug) -> Result<Option<AddonInfo>, StoreError> {
        self.fetch_raw_json(&format!("{slug}/info.json")).await
    }

    /// Install manifest for one addon, or `None` if the store has no
    /// `install.json` for this slug.
    pub async fn fetch_manifest(
        &self,
        slug: &Slug,
    ) -> Result<Option<InstallManifest>, StoreError> {
        self.fetch_raw_json(&format!("{slug}/install.json")).await
    }

    /// Catalog of every addon in the store.
    ///
    /// Lists the registry's top-level folders, then fetches each one's
    /// `info.json` and `install.json`. Folders with a missing or
    /// malformed `info.json` are skipped rather than failing the whole
    /// listing.
    pub async fn list_catalog(&self) -> Result<Vec<StoreAddon>, StoreError> {
        let url = format!(
            "{}/repos/{}/{}/contents",
            self.api_base(),
            self.config.owner,
            self.config.repo,
        );

        let response = self
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Network(format!(
                "addon listing returned HTTP {}",
                response.status()
            )));
        }

        let entries: Vec<ContentsEntry> = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        let mut catalog = Vec::new();

        for entry in entries.iter().filter(|e| e.is_addon_folder()) {
            let Ok(slug) = Slug::parse(&entry.name) else {
                continue;
            };

            let info = match self.fetch_info(&slug).await {
                Ok(Some(info)) => info,
                Ok(None) | Err(_) => continue,
            };

            let manifest = self
                .fetch_manifest(&slug)
                .await
                .unwrap_or_default()
                .unwrap_or_default();

            catalog.push(self.build_store_addon(&entry.name, info, manifest));
        }

        Ok(catalog)
    }

    fn build_store_addon(
        &self,
        folder: &str,
        info: AddonInfo,
        manifest: InstallManifest,
    ) -> StoreAddon {
        let default_github = format!(
            "https://github.com/{}/{}/tree/{}/{}",
            self.config.owner, self.config.repo, self.config.branch, folder,
        );

        StoreAddon {
            id: folder.to_owned(),
            name: info.name.unwrap_or_else(|| folder.to_owned()),
            version: info.version.unwrap_or_default(),
            description: info.description.clone().unwrap_or_default(),
            long_description: info
                .long_description
                .or(info.description)
                .unwrap_or_default(),
            author: info.author.unwrap_or_default(),
            status: info.status.unwrap_or_else(|| "working".into()),
            tags: info.tags,
            icon: info.icon.unwrap_or_default(),
            features: info.features,
            github: info.github.unwrap_or(default_github),
            screenshots: info.screenshots,
            install_repo: manifest.repo.unwrap_or_default(),
            install_branch: manifest.branch.unwrap_or_else(|| "main".into()),
            install_note: manifest.note.unwrap_or_default(),
            install_commands: manifest.commands,
        }
    }

    /// Comment counts for the store's discussion threads, keyed by
    /// lowercased discussion title.
    ///
    /// Requires an access token; a missing token or any upstream failure
    /// degrades to an empty map, never an error.
    pub async fn discussion_counts(&self) -> HashMap<String, u64> {
        let Some(token) = &self.config.token else {
            return HashMap::new();
        };

        let query = format!(
            r#"{{ repository(owner: "{}", name: "{}") {{ discussions(first: 100) {{ nodes {{ title comments {{ totalCount }} }} }} }} }}"#,
            self.config.owner, self.config.repo,
        );

        let url = format!("{}/graphql", self.api_base());

        let response = self
            .client
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", format!("Bearer {token}"))
            .timeout(FETCH_TIMEOUT)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await;

        let Ok(response) = response else {
            return HashMap::new();
        };

        if !response.status().is_success() {
            return HashMap::new();
        }

        let Ok(body) = response.json::<DiscussionsResponse>().await else {
            return HashMap::new();
        };

        body.data
            .and_then(|d| d.repository)
            .map(|r| r.discussions.nodes)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|node| {
                let title = node.title?;
                Some((title.to_lowercase(), node.comments.total_count))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct DiscussionsResponse {
    data: Option<DiscussionsData>,
}

#[derive(Debug, Deserialize)]
struct DiscussionsData {
    repository: Option<DiscussionsRepository>,
}

#[derive(Debug, Deserialize)]
struct DiscussionsRepository {
    discussions: DiscussionNodes,
}

#[derive(Debug, Deserialize, Default)]
struct DiscussionNodes {
    #[serde(default)]
    nodes: Vec<DiscussionNode>,
}

#[derive(Debug, Deserialize)]
struct DiscussionNode {
    title: Option<String>,
    comments: CommentCount,
}

#[derive(Debug, Deserialize, Default)]
struct CommentCount {
    #[serde(rename = "totalCount", default)]
    total_count: u64,
}
