//! Checkout of a branch subdirectory into the archive store
//!
//! A build clones the branch from the mirror into a scratch directory, copies
//! the requested subdirectory into an archive workspace, hashes the workspace
//! and renames it to `archives/<hash>`. Both scratch directories are
//! `TempDir`s and disappear on every exit path, including cancellation.

use crate::archive::cache::{CheckoutCache, CheckoutKey};
use crate::archive::canonical::archive_hash;
use crate::archive::sync::sync_tree;
use crate::archive::{
    validate_relative_path, Archive, ArchiveHash, ArchiveSource, CheckoutOutcome,
};
use crate::config::CacheConfig;
use crate::error::{StoreError, StoreResult};
use crate::repository::{CommitId, RepositoryGateway};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info, warn};

/// Builds, publishes and memoizes archives
#[derive(Debug)]
pub struct ArchiveBuilder {
    gateway: Arc<RepositoryGateway>,
    cache_config: CacheConfig,
    cache: CheckoutCache,
}

impl ArchiveBuilder {
    /// Create a builder publishing under `cache_config.root`
    pub fn new(gateway: Arc<RepositoryGateway>, cache_config: CacheConfig) -> Self {
        Self {
            gateway,
            cache_config,
            cache: CheckoutCache::new(),
        }
    }

    /// Gateway onto the mirror
    pub fn gateway(&self) -> &RepositoryGateway {
        &self.gateway
    }

    /// Memo of finished checkouts
    pub fn checkout_cache(&self) -> &CheckoutCache {
        &self.cache
    }

    /// Directory an archive is (or would be) published at
    pub fn archive_dir(&self, hash: &ArchiveHash) -> PathBuf {
        self.cache_config.archives_dir().join(hash.as_str())
    }

    /// Check out `subdirectory` of `branch`.
    ///
    /// Returns the commit the branch points at and the archive of the
    /// subdirectory, or `None` when the subdirectory does not exist there.
    pub async fn checkout(&self, branch: &str, subdirectory: &str) -> StoreResult<CheckoutOutcome> {
        let subdirectory = validate_relative_path(subdirectory)?;
        self.gateway.ensure_initialized().await?;
        let commit = self.gateway.resolve_commit(branch).await?;

        let key = CheckoutKey::new(commit.clone(), subdirectory.as_str());
        if let Some(archive) = self.cache.get(&key) {
            debug!("Checkout cache hit for {}", key);
            return Ok(CheckoutOutcome { commit, archive });
        }

        let lock = self.cache.build_lock(&key);
        let _guard = lock.lock().await;
        // Another task may have finished the same build while we waited
        if let Some(archive) = self.cache.get(&key) {
            debug!("Checkout of {} built concurrently", key);
            return Ok(CheckoutOutcome { commit, archive });
        }

        let result = self.build(branch, commit, &subdirectory).await;
        self.cache.finish_build(&key);
        result
    }

    /// Build the archive of `subdirectory` and memoize it under the commit
    /// the clone actually checked out, which may differ from `expected`.
    async fn build(
        &self,
        branch: &str,
        expected: CommitId,
        subdirectory: &str,
    ) -> StoreResult<CheckoutOutcome> {
        let (commit, archive) = self.checkout_uncached(branch, expected, subdirectory).await?;
        self.cache
            .insert(CheckoutKey::new(commit.clone(), subdirectory), archive.clone());
        Ok(CheckoutOutcome { commit, archive })
    }

    async fn checkout_uncached(
        &self,
        branch: &str,
        expected: CommitId,
        subdirectory: &str,
    ) -> StoreResult<(CommitId, Option<ArchiveHash>)> {
        let clones_dir = self.cache_config.clones_dir();
        let temp_dir = self.cache_config.archives_temp_dir();
        let archives_dir = self.cache_config.archives_dir();
        for dir in [&clones_dir, &temp_dir, &archives_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::io(format!("creating directory {}", dir.display()), e))?;
        }

        let clone_root = scratch_dir(&clones_dir, "clone-")?;
        let checkout = clone_root.path().join("checkout");
        let commit = self.gateway.clone_branch(branch, &checkout).await?;
        if commit != expected {
            warn!(
                "Branch {} moved from {} to {} during checkout, using {}",
                branch,
                expected.short(),
                commit.short(),
                commit.short()
            );
        }

        let git_dir = checkout.join(".git");
        fs::remove_dir_all(&git_dir)
            .await
            .map_err(|e| StoreError::io(format!("removing {}", git_dir.display()), e))?;

        let Some(source) = subtree(&checkout, subdirectory).await? else {
            info!(
                "Path {} does not exist at {}:{}",
                subdirectory,
                branch,
                commit.short()
            );
            return Ok((commit, None));
        };

        let workspace = scratch_dir(&temp_dir, "archive-")?;
        let hash = {
            let dest = workspace.path().to_path_buf();
            tokio::task::spawn_blocking(move || -> StoreResult<ArchiveHash> {
                sync_tree(&source, &dest)?;
                archive_hash(&dest)
            })
            .await
            .map_err(|e| StoreError::Internal(format!("archive task failed: {e}")))??
        };

        // TempDir creates the workspace private to the current user
        fs::set_permissions(workspace.path(), std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| {
                StoreError::io(format!("setting permissions on {}", workspace.path().display()), e)
            })?;

        let dest = archives_dir.join(hash.as_str());
        publish(workspace.path(), &dest).await?;
        info!(
            "Published {}:{} ({}) as {}",
            branch,
            subdirectory,
            commit.short(),
            hash.short()
        );
        Ok((commit, Some(hash)))
    }
}

#[async_trait]
impl ArchiveSource for ArchiveBuilder {
    async fn checkout(&self, branch: &str, subdirectory: &str) -> StoreResult<CheckoutOutcome> {
        ArchiveBuilder::checkout(self, branch, subdirectory).await
    }

    fn archive(&self, hash: &ArchiveHash) -> Archive {
        Archive::new(hash.clone(), self.archive_dir(hash))
    }
}

fn scratch_dir(parent: &Path, prefix: &str) -> StoreResult<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(parent)
        .map_err(|e| StoreError::io(format!("creating workspace in {}", parent.display()), e))
}

/// Locate `subdirectory` in the checkout; `None` if it is absent or not a directory
async fn subtree(checkout: &Path, subdirectory: &str) -> StoreResult<Option<PathBuf>> {
    let root = fs::canonicalize(checkout)
        .await
        .map_err(|e| StoreError::io(format!("resolving {}", checkout.display()), e))?;
    let candidate = root.join(subdirectory);

    let resolved = match fs::canonicalize(&candidate).await {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(format!("resolving {}", candidate.display()), e)),
    };

    let metadata = fs::metadata(&resolved)
        .await
        .map_err(|e| StoreError::io(format!("inspecting {}", resolved.display()), e))?;
    Ok(metadata.is_dir().then_some(resolved))
}

/// Move a finished workspace to its content address.
///
/// Losing a race against another publisher of the same hash is success:
/// both directories hold the same tree.
async fn publish(workspace: &Path, dest: &Path) -> StoreResult<()> {
    let Err(e) = fs::rename(workspace, dest).await else {
        return Ok(());
    };
    if fs::try_exists(dest).await.unwrap_or(false) {
        debug!(
            "Archive {} already published ({}), keeping existing copy",
            dest.display(),
            e
        );
        return Ok(());
    }
    Err(StoreError::io(
        format!("publishing {} to {}", workspace.display(), dest.display()),
        e,
    ))
}
