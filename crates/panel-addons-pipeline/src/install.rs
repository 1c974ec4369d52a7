use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use panel_addons::{AddonHost, InstallError, InstalledAddon, ProgressEvent, Slug};
use panel_addons_github::AddonStoreClient;
use panel_addons_store::AddonRegistry;

use crate::executor::InstallRunner;
use crate::fetcher::SourceFetcher;
use crate::registry;
use crate::staging::StagingDir;

/// Orchestrates the install pipeline: manifest fetch, acquisition into
/// staging, command execution, promotion, registration — and the mirror
/// uninstall operation.
pub struct Installer {
    addons_root: PathBuf,
    client: Arc<AddonStoreClient>,
    fetcher: Arc<dyn SourceFetcher>,
    registry: Arc<AddonRegistry>,
    host: Arc<dyn AddonHost>,
}

impl Installer {
    pub fn new(
        addons_root: impl Into<PathBuf>,
        client: Arc<AddonStoreClient>,
        fetcher: Arc<dyn SourceFetcher>,
        registry: Arc<AddonRegistry>,
        host: Arc<dyn AddonHost>,
    ) -> Self {
        Self {
            addons_root: addons_root.into(),
            client,
            fetcher,
            registry,
            host,
        }
    }

    pub fn addons_root(&self) -> &PathBuf {
        &self.addons_root
    }

    /// Synchronous pre-checks, run before any stream is opened and
    /// before any network or filesystem work: the final path must stay
    /// inside the addons root and must not exist yet.
    pub fn precheck(&self, slug: &Slug) -> Result<PathBuf, InstallError> {
        let final_path = self.addons_root.join(slug.as_str());

        if !final_path.starts_with(&self.addons_root) {
            return Err(InstallError::InvalidSlug(slug.as_str().to_owned()));
        }

        if final_path.exists() {
            return Err(InstallError::AlreadyInstalled(slug.to_string()));
        }

        Ok(final_path)
    }

    /// Run the full pipeline for one slug, emitting progress into
    /// `events`. Exactly one terminal event ends the session; send
    /// failures (client went away) are ignored and the pipeline runs to
    /// completion or cleanup either way.
    pub async fn install(&self, slug: &Slug, events: &mpsc::Sender<ProgressEvent>) {
        let terminal = match self.try_install(slug, events).await {
            Ok(message) => ProgressEvent::done(message),
            Err(e) => ProgressEvent::error(e.to_string()),
        };
        let _ = events.send(terminal).await;
    }

    async fn try_install(
        &self,
        slug: &Slug,
        events: &mpsc::Sender<ProgressEvent>,
    ) -> Result<String, InstallError> {
        let final_path = self.precheck(slug)?;

        let manifest = self
            .client
            .fetch_manifest(slug)
            .await
            .map_err(|e| {
                tracing::warn!(%slug, error = %e, "install manifest fetch failed");
                InstallError::ManifestUnavailable(slug.to_string())
            })?
            .ok_or_else(|| InstallError::ManifestUnavailable(slug.to_string()))?;

        let staging = StagingDir::create(&self.addons_root, slug)?;

        let _ = events
            .send(ProgressEvent::step("Clone", self.fetcher.describe(&manifest)))
            .await;

        // Staging is removed by its guard on every failure path below.
        self.fetcher.fetch_into(&manifest, staging.path()).await?;

        let _ = events
            .send(ProgressEvent::step(
                "Setup",
                format!("cd {}", staging.dir_name()),
            ))
            .await;

        let mut runner = InstallRunner::new(&manifest, staging.path());
        while let Some(event) = runner.next_event().await {
            match event? {
                // The runner's completion is internal; the one terminal
                // done for the session is emitted after registration.
                ProgressEvent::Done { .. } => break,
                event => {
                    let _ = events.send(event).await;
                }
            }
        }

        staging.promote(&final_path)?;

        let _ = events
            .send(ProgressEvent::step("Register", "reload addons"))
            .await;

        let record = InstalledAddon {
            slug: slug.to_string(),
            name: manifest.name.clone().unwrap_or_else(|| slug.to_string()),
            author: manifest.author.clone(),
            note: manifest.note.clone(),
            enabled: true,
        };

        self.registry
            .upsert(&record)
            .map_err(|e| InstallError::Registry(e.to_string()))?;

        self.host
            .load(&final_path)
            .await
            .map_err(|e| InstallError::Registry(e.to_string()))?;

        Ok(format!("\"{}\" installed successfully", record.name))
    }

    /// Remove an installed addon: registry record (absence tolerated),
    /// then the directory, then a reload so the host drops its code.
    pub async fn uninstall(&self, slug: &Slug) -> Result<String, InstallError> {
        let target = self.addons_root.join(slug.as_str());

        if !target.starts_with(&self.addons_root) {
            return Err(InstallError::InvalidSlug(slug.as_str().to_owned()));
        }

        if !target.exists() {
            // No directory and no record means there is nothing to
            // uninstall; a dangling record alone is pruned by reload.
            return Err(InstallError::NotFound(slug.to_string()));
        }

        if let Err(e) = self.registry.remove(slug.as_str()) {
            tracing::warn!(%slug, error = %e, "could not remove registry record");
        }

        tokio::fs::remove_dir_all(&target).await?;

        registry::reload(&self.registry, self.host.as_ref(), &self.addons_root).await?;

        Ok(format!("Addon \"{slug}\" uninstalled"))
    }
}
