use std::path::Path;
use std::process::Stdio;

use panel_addons::{InstallError, InstallManifest};

/// Obtains an addon's source tree into a staging location.
///
/// Implementations create `dest` themselves; on failure the caller
/// removes whatever was partially created, so fetchers only need to
/// report the error.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// One-line description of the acquisition, for progress messages.
    fn describe(&self, manifest: &InstallManifest) -> String;

    /// Materialize the manifest's source tree at `dest`.
    async fn fetch_into(
        &self,
        manifest: &InstallManifest,
        dest: &Path,
    ) -> Result<(), InstallError>;
}

/// Shallow-clones the addon's own repository, then strips the VCS
/// metadata so the staged tree carries no history.
pub struct GitCloneFetcher;

#[async_trait::async_trait]
impl SourceFetcher for GitCloneFetcher {
    fn describe(&self, manifest: &InstallManifest) -> String {
        format!(
            "git clone -b {} {}",
            manifest.branch_name(),
            manifest.repo.as_deref().unwrap_or("<missing repo>"),
        )
    }

    async fn fetch_into(
        &self,
        manifest: &InstallManifest,
        dest: &Path,
    ) -> Result<(), InstallError> {
        let repo = manifest
            .repo
            .as_deref()
            .filter(|url| is_valid_repo_url(url))
            .ok_or(InstallError::InvalidRepo)?;

        let output = tokio::process::Command::new("git")
            .args(["clone", "--depth=1", "-b", manifest.branch_name(), repo])
            .arg(dest)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| InstallError::CommandFailed {
                cmd: format!("git clone {repo}"),
                output: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(InstallError::CommandFailed {
                cmd: format!("git clone {repo}"),
                output: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            });
        }

        let git_dir = dest.join(".git");
        if git_dir.exists() {
            tokio::fs::remove_dir_all(&git_dir).await?;
        }

        Ok(())
    }
}

/// Only `https://github.com/<owner>/<repo>[.git]` is accepted as a
/// clone source; everything else in a manifest is refused.
pub fn is_valid_repo_url(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("https://github.com/") else {
        return false;
    };
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut segments = rest.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(owner), Some(repo), None) => is_name_segment(owner) && is_name_segment(repo),
        _ => false,
    }
}

fn is_name_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
