use std::collections::HashSet;
use std::path::Path;

use panel_addons::{AddonEntry, AddonHost, HostError, InstallError, Slug};
use panel_addons_store::AddonRegistry;

/// Outcome of a reload pass over the addons root.
#[derive(Debug, Clone, Default)]
pub struct ReloadReport {
    /// Addons whose code was (re)loaded.
    pub loaded: u64,
    /// Schema migrations applied across all loaded addons.
    pub migrations_applied: u64,
    /// Defunct registry records removed (directory gone).
    pub pruned: u64,
}

/// Outcome of toggling one addon.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub message: String,
    pub migrations_applied: u64,
}

/// Admin list view: every registry record that still has a directory,
/// plus any addon directory the registry does not know about (shown as
/// unregistered rather than breaking the listing). Records without a
/// directory are left for `reload` to prune.
pub fn list_entries(
    registry: &AddonRegistry,
    addons_root: &Path,
) -> Result<Vec<AddonEntry>, InstallError> {
    let mut entries = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for record in registry
        .list()
        .map_err(|e| InstallError::Registry(e.to_string()))?
    {
        if addons_root.join(&record.slug).is_dir() {
            seen.insert(record.slug.clone());
            entries.push(AddonEntry::registered(&record));
        }
    }

    if !addons_root.is_dir() {
        return Ok(entries);
    }

    for dir_entry in std::fs::read_dir(addons_root)? {
        let dir_entry = dir_entry?;
        if !dir_entry.path().is_dir() {
            continue;
        }

        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || seen.contains(&name) || Slug::parse(&name).is_err() {
            continue;
        }

        entries.push(AddonEntry::unregistered(name));
    }

    entries.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(entries)
}

/// Re-scan the addons root and drive the host to match the registry:
/// records without a directory are pruned and unloaded, everything
/// else is unloaded then loaded again when enabled. A single addon
/// failing to load is logged, not fatal to the pass.
pub async fn reload(
    registry: &AddonRegistry,
    host: &dyn AddonHost,
    addons_root: &Path,
) -> Result<ReloadReport, InstallError> {
    let mut report = ReloadReport::default();

    let records = registry
        .list()
        .map_err(|e| InstallError::Registry(e.to_string()))?;

    for record in records {
        let dir = addons_root.join(&record.slug);

        if !dir.is_dir() {
            if let Err(e) = registry.remove(&record.slug) {
                tracing::warn!(slug = %record.slug, error = %e, "could not prune defunct record");
            } else {
                report.pruned += 1;
            }
            let _ = host.unload(&record.slug).await;
            continue;
        }

        let _ = host.unload(&record.slug).await;

        if record.enabled {
            match host.load(&dir).await {
                Ok(migrations) => {
                    report.loaded += 1;
                    report.migrations_applied += migrations;
                }
                Err(e) => {
                    tracing::warn!(slug = %record.slug, error = %e, "addon failed to load");
                }
            }
        }
    }

    Ok(report)
}

/// Enable or disable one addon without reinstalling, then reload so
/// the change takes effect.
pub async fn toggle(
    registry: &AddonRegistry,
    host: &dyn AddonHost,
    addons_root: &Path,
    slug: &Slug,
    enabled: bool,
) -> Result<ToggleOutcome, InstallError> {
    let changed = registry
        .set_enabled(slug.as_str(), enabled)
        .map_err(|e| InstallError::Registry(e.to_string()))?;

    if !changed {
        return Err(InstallError::NotFound(slug.to_string()));
    }

    let report = reload(registry, host, addons_root).await?;

    Ok(ToggleOutcome {
        message: format!(
            "Addon \"{slug}\" {}",
            if enabled { "enabled" } else { "disabled" },
        ),
        migrations_applied: report.migrations_applied,
    })
}

/// Host that delegates nothing: code activation belongs to the host
/// platform, so this implementation only logs and reports zero
/// migrations. Useful for deployments where the panel runtime wires
/// its own loader, and as the default for the shipped binary.
pub struct NoopHost;

#[async_trait::async_trait]
impl AddonHost for NoopHost {
    async fn load(&self, path: &Path) -> Result<u64, HostError> {
        tracing::info!(path = %path.display(), "addon load delegated to host runtime");
        Ok(0)
    }

    async fn unload(&self, _slug: &str) -> Result<(), HostError> {
        Ok(())
    }
}
