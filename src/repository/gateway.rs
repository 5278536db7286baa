//! Git-backed repository gateway

use crate::error::{StoreError, StoreResult};
use crate::process::ExternalCommand;
use crate::repository::CommitId;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Name of the location every package has
pub const DEFAULT_LOCATION: &str = "default";

/// Characters git refuses in ref names, plus whitespace handled separately
const FORBIDDEN_REF_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Validate a branch name before handing it to git.
pub fn validate_branch_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| {
        Err(StoreError::InvalidRef {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.starts_with('-') {
        return invalid("must not start with '-'");
    }
    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return invalid("must not have empty path components");
    }
    if name.contains("..") || name.contains("@{") || name.ends_with(".lock") {
        return invalid("contains a sequence git does not allow");
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_REF_CHARS.contains(&c))
    {
        return invalid("contains a character git does not allow");
    }
    Ok(())
}

/// Ordered branch names that may hold a package location's content.
///
/// Callers try them in order and take the first that resolves.
pub fn candidate_branch_names(package_id: &str, location_name: &str) -> Vec<String> {
    if location_name == DEFAULT_LOCATION {
        vec!["main".to_string(), format!("{}/main", package_id)]
    } else {
        vec![
            format!("location/{}/main", location_name),
            format!("{}/location/{}/main", package_id, location_name),
        ]
    }
}

/// Gateway to the local bare mirror
#[derive(Debug)]
pub struct RepositoryGateway {
    mirror_path: PathBuf,
    initialized: OnceCell<()>,
}

impl RepositoryGateway {
    /// Create a gateway for the mirror at `mirror_path`
    pub fn new(mirror_path: impl Into<PathBuf>) -> Self {
        Self {
            mirror_path: mirror_path.into(),
            initialized: OnceCell::new(),
        }
    }

    /// Path of the bare mirror
    pub fn mirror_path(&self) -> &Path {
        &self.mirror_path
    }

    fn git(&self) -> ExternalCommand {
        ExternalCommand::new("git")
            .arg("--git-dir")
            .arg(&self.mirror_path)
    }

    /// Initialize the bare mirror if needed.
    ///
    /// Runs at most once per gateway; concurrent callers wait for the first.
    /// `git init --bare` is itself a no-op on an existing repository.
    pub async fn ensure_initialized(&self) -> StoreResult<()> {
        self.initialized
            .get_or_try_init(|| async {
                let init = ExternalCommand::new("git")
                    .args(["init", "--bare", "--quiet"])
                    .arg(&self.mirror_path)
                    .output()
                    .await;

                match init {
                    Ok(_) => {
                        debug!("Mirror ready at {}", self.mirror_path.display());
                        Ok(())
                    }
                    Err(init_err) => {
                        // A read-only mirror cannot be re-initialized but may still be usable
                        self.git()
                            .args(["rev-parse", "--git-dir"])
                            .output()
                            .await
                            .map(|_| ())
                            .map_err(|_| init_err)
                    }
                }
            })
            .await
            .map(|_| ())
    }

    /// Resolve a branch of the mirror to its commit
    pub async fn resolve_commit(&self, branch: &str) -> StoreResult<CommitId> {
        validate_branch_name(branch)?;

        let result = self
            .git()
            .args(["rev-parse", "--verify", "--quiet"])
            .arg(format!("refs/heads/{}^{{commit}}", branch))
            .output_line()
            .await;

        match result {
            Ok(line) if !line.is_empty() => Ok(CommitId::new(line)),
            Ok(_) | Err(StoreError::CommandExecution { code: Some(1), .. }) => {
                debug!("Branch {} not found in mirror", branch);
                Err(StoreError::RefNotFound {
                    branch: branch.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// List the branches of the mirror
    pub async fn list_branches(&self) -> StoreResult<Vec<String>> {
        let stdout = self
            .git()
            .args(["for-each-ref", "--format=%(refname)", "refs/heads/"])
            .output()
            .await?;

        Ok(stdout
            .lines()
            .filter_map(|line| line.trim().strip_prefix("refs/heads/"))
            .map(str::to_string)
            .collect())
    }

    /// Clone a single branch of the mirror into `dest` and return its HEAD.
    ///
    /// The clone shares the mirror's object store instead of copying it.
    pub async fn clone_branch(&self, branch: &str, dest: &Path) -> StoreResult<CommitId> {
        validate_branch_name(branch)?;

        info!("Cloning branch {} into {}", branch, dest.display());
        ExternalCommand::new("git")
            .args([
                "clone",
                "--quiet",
                "--local",
                "--shared",
                "--single-branch",
                "--no-tags",
                "--branch",
                branch,
                "--",
            ])
            .arg(&self.mirror_path)
            .arg(dest)
            .output()
            .await?;

        let head = ExternalCommand::new("git")
            .arg("-C")
            .arg(dest)
            .args(["rev-parse", "HEAD"])
            .output_line()
            .await?;

        Ok(CommitId::new(head))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_location_candidates() {
        assert_eq!(
            candidate_branch_names("problems/sum", "default"),
            vec!["main", "problems/sum/main"]
        );
    }

    #[test]
    fn named_location_candidates() {
        assert_eq!(
            candidate_branch_names("problems/sum", "statement"),
            vec![
                "location/statement/main",
                "problems/sum/location/statement/main"
            ]
        );
    }

    #[test]
    fn branch_name_validation() {
        assert!(validate_branch_name("main").is_ok());
        assert!(validate_branch_name("problems/sum/location/x/main").is_ok());
        assert!(validate_branch_name("").is_err());
        assert!(validate_branch_name("--upload-pack=evil").is_err());
        assert!(validate_branch_name("a..b").is_err());
        assert!(validate_branch_name("a b").is_err());
        assert!(validate_branch_name("a^").is_err());
        assert!(validate_branch_name("/a").is_err());
        assert!(validate_branch_name("a//b").is_err());
        assert!(validate_branch_name("a.lock").is_err());
    }

    #[tokio::test]
    async fn ensure_initialized_creates_mirror_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let gateway = RepositoryGateway::new(temp.path().join("mirror.git"));

        gateway.ensure_initialized().await.unwrap();
        gateway.ensure_initialized().await.unwrap();
        assert!(temp.path().join("mirror.git").join("HEAD").exists());

        // A second gateway on the same mirror re-runs init harmlessly
        let other = RepositoryGateway::new(temp.path().join("mirror.git"));
        other.ensure_initialized().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_initialization() {
        let temp = TempDir::new().unwrap();
        let gateway = RepositoryGateway::new(temp.path().join("mirror.git"));

        let (a, b) = tokio::join!(gateway.ensure_initialized(), gateway.ensure_initialized());
        a.unwrap();
        b.unwrap();
    }

    #[tokio::test]
    async fn resolve_existing_and_missing_branches() {
        let temp = TempDir::new().unwrap();
        let (mirror, work) = init_repos(temp.path());
        std::fs::write(work.join("a.txt"), "a").unwrap();
        commit_and_push(&work, &mirror, "feature/x");

        let gateway = RepositoryGateway::new(&mirror);
        gateway.ensure_initialized().await.unwrap();

        let commit = gateway.resolve_commit("feature/x").await.unwrap();
        assert_eq!(commit.as_str().len(), 40);

        let err = gateway.resolve_commit("nope").await.unwrap_err();
        assert!(err.is_ref_not_found());

        let err = gateway.resolve_commit("-x").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRef { .. }));
    }

    #[tokio::test]
    async fn list_and_clone_branches() {
        let temp = TempDir::new().unwrap();
        let (mirror, work) = init_repos(temp.path());
        std::fs::write(work.join("a.txt"), "a").unwrap();
        commit_and_push(&work, &mirror, "main");
        commit_and_push(&work, &mirror, "pkg/main");

        let gateway = RepositoryGateway::new(&mirror);
        let branches = gateway.list_branches().await.unwrap();
        assert!(branches.contains(&"main".to_string()));
        assert!(branches.contains(&"pkg/main".to_string()));

        let dest = temp.path().join("clone");
        let head = gateway.clone_branch("pkg/main", &dest).await.unwrap();
        assert_eq!(head, gateway.resolve_commit("pkg/main").await.unwrap());
        assert_eq!(std::fs::read_to_string(dest.join("a.txt")).unwrap(), "a");
    }
}
