use std::path::{Path, PathBuf};

use panel_addons::{InstallError, Slug};

/// Ephemeral working tree for one in-flight installation.
///
/// The path is `addons_root/<slug>-<random>`, colocated with the final
/// addon directory so promotion is a same-filesystem rename. The guard
/// removes the tree on drop unless it was promoted, so no failure mode
/// (including the driving task being dropped mid-install) leaves a
/// staging directory behind.
pub struct StagingDir {
    path: PathBuf,
    armed: bool,
}

impl StagingDir {
    /// Reserve a fresh staging path under `addons_root`. The directory
    /// itself is not created; acquisition does that. The root is
    /// created if missing, and the resolved path is checked to stay
    /// lexically inside it.
    pub fn create(addons_root: &Path, slug: &Slug) -> Result<Self, InstallError> {
        std::fs::create_dir_all(addons_root)?;

        let path = addons_root.join(format!("{slug}-{}", random_suffix()));

        if !path.starts_with(addons_root) {
            return Err(InstallError::InvalidSlug(slug.as_str().to_owned()));
        }

        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory name of the staging tree, for progress messages.
    pub fn dir_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Atomically rename the staging tree into its final slot.
    ///
    /// The rename is the true serialization point between concurrent
    /// installs of the same slug: if it fails because the target
    /// appeared since the pre-check, the losing attempt reports
    /// `AlreadyInstalled` and its staging tree is cleaned up on drop.
    pub fn promote(mut self, final_path: &Path) -> Result<(), InstallError> {
        match std::fs::rename(&self.path, final_path) {
            Ok(()) => {
                self.armed = false;
                Ok(())
            }
            Err(_) if final_path.exists() => {
                let slug = final_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Err(InstallError::AlreadyInstalled(slug))
            }
            Err(e) => Err(InstallError::Filesystem(e)),
        }
    }

    /// Remove the staging tree now instead of waiting for drop.
    pub fn discard(self) {
        // Drop does the work.
    }

    fn cleanup(&self) {
        if !self.path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to clean up staging directory",
            );
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.armed {
            self.cleanup();
        }
    }
}

fn random_suffix() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_owned()
}
