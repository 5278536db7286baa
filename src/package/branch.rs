use crate::archive::{Archive, ArchiveHash};
use crate::error::{StoreError, StoreResult};
use crate::package::{BranchId, PackageContext, PackageLocation, RevisionId};
use crate::repository::{validate_branch_name, CommitId};
use std::sync::Arc;
use tracing::debug;

/// A candidate branch of a location
#[derive(Debug, Clone)]
pub struct PackageBranch {
    context: Arc<PackageContext>,
    id: BranchId,
    path: String,
}

impl PackageBranch {
    pub(crate) fn new(context: Arc<PackageContext>, id: BranchId, path: String) -> Self {
        Self { context, id, path }
    }

    pub fn id(&self) -> &BranchId {
        &self.id
    }

    /// Git branch name
    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn location(&self) -> PackageLocation {
        PackageLocation::new(
            self.context.clone(),
            self.id.location.clone(),
            self.path.clone(),
        )
    }

    /// Check out the location's path on this branch.
    ///
    /// A branch missing from the mirror has no revision; a revision whose
    /// path is absent is still returned, with no archive. A name git would
    /// reject cannot exist in the mirror either.
    pub async fn revision(&self) -> StoreResult<Option<PackageRevision>> {
        if let Err(e) = validate_branch_name(&self.id.name) {
            debug!("Skipping branch {:?}: {}", self.id.name, e);
            return Ok(None);
        }
        let outcome = match self.context.source().checkout(&self.id.name, &self.path).await {
            Ok(outcome) => outcome,
            Err(StoreError::RefNotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some(PackageRevision {
            context: self.context.clone(),
            id: RevisionId {
                branch: self.id.clone(),
                commit: outcome.commit,
            },
            path: self.path.clone(),
            archive: outcome.archive,
        }))
    }
}

/// A branch observed at one commit
#[derive(Debug, Clone)]
pub struct PackageRevision {
    context: Arc<PackageContext>,
    id: RevisionId,
    path: String,
    archive: Option<ArchiveHash>,
}

impl PackageRevision {
    pub fn id(&self) -> &RevisionId {
        &self.id
    }

    pub fn commit(&self) -> &CommitId {
        &self.id.commit
    }

    pub fn archive_hash(&self) -> Option<&ArchiveHash> {
        self.archive.as_ref()
    }

    /// Archive of the location's path at this commit, if it exists
    pub fn archive(&self) -> Option<Archive> {
        self.archive
            .as_ref()
            .map(|hash| self.context.source().archive(hash))
    }

    pub fn branch(&self) -> PackageBranch {
        PackageBranch::new(self.context.clone(), self.id.branch.clone(), self.path.clone())
    }
}
