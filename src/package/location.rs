use crate::error::StoreResult;
use crate::package::{
    BranchId, LocationId, PackageBranch, PackageContext, PackageRevision, PackageTarget,
};
use crate::repository::{candidate_branch_names, DEFAULT_LOCATION};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Whether a location is the target's main one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Default,
    Named,
}

/// A subdirectory of the repository holding one part of a package
#[derive(Debug, Clone)]
pub struct PackageLocation {
    context: Arc<PackageContext>,
    id: LocationId,
    path: String,
}

impl PackageLocation {
    pub(crate) fn new(context: Arc<PackageContext>, id: LocationId, path: String) -> Self {
        Self { context, id, path }
    }

    pub fn id(&self) -> &LocationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Repository path checked out for this location
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> LocationKind {
        if self.id.name == DEFAULT_LOCATION {
            LocationKind::Default
        } else {
            LocationKind::Named
        }
    }

    /// The target this location belongs to
    pub fn target(&self) -> PackageTarget {
        PackageTarget::new(self.context.clone(), self.id.target.clone())
    }

    /// Candidate branches, in search order
    pub fn branches(&self) -> Vec<PackageBranch> {
        candidate_branch_names(self.id.target.as_str(), &self.id.name)
            .into_iter()
            .map(|name| {
                PackageBranch::new(
                    self.context.clone(),
                    BranchId {
                        location: self.id.clone(),
                        name,
                    },
                    self.path.clone(),
                )
            })
            .collect()
    }

    /// First candidate branch whose revision has an archive.
    ///
    /// Later candidates are not checked out once one qualifies.
    pub async fn main_revision(&self) -> StoreResult<Option<PackageRevision>> {
        for branch in self.branches() {
            match branch.revision().await? {
                Some(revision) if revision.archive().is_some() => return Ok(Some(revision)),
                Some(_) => debug!("Branch {} has no content at {}", branch.name(), self.path),
                None => debug!("Branch {} does not exist", branch.name()),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::package::test_support::*;

    #[test]
    fn branches_follow_candidate_order() {
        let resolver = resolver(&Config::default(), Arc::new(FakeSource::default()));
        let location = resolver
            .resolve_package("problems/sum")
            .unwrap()
            .location("default")
            .unwrap();

        assert_eq!(location.kind(), LocationKind::Default);
        let names: Vec<_> = location
            .branches()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["main", "problems/sum/main"]);
        assert_eq!(location.target().id().as_str(), "problems/sum");
    }

    #[tokio::test]
    async fn search_stops_at_first_branch_with_content() {
        let source = Arc::new(
            FakeSource::default()
                .with_branch("main", true)
                .with_branch("problems/sum/main", true),
        );
        let resolver = resolver(&Config::default(), source.clone());
        let location = resolver
            .resolve_package("problems/sum")
            .unwrap()
            .location("default")
            .unwrap();

        let revision = location.main_revision().await.unwrap().unwrap();
        assert_eq!(revision.branch().name(), "main");
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn search_skips_missing_and_empty_branches() {
        let source = Arc::new(
            FakeSource::default()
                .with_branch("main", false)
                .with_branch("problems/sum/main", true),
        );
        let resolver = resolver(&Config::default(), source.clone());
        let location = resolver
            .resolve_package("problems/sum")
            .unwrap()
            .location("default")
            .unwrap();

        let revision = location.main_revision().await.unwrap().unwrap();
        assert_eq!(revision.branch().name(), "problems/sum/main");
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn search_finds_nothing() {
        let source = Arc::new(FakeSource::default());
        let resolver = resolver(&Config::default(), source.clone());
        let location = resolver
            .resolve_package("p")
            .unwrap()
            .location("default")
            .unwrap();

        assert!(location.main_revision().await.unwrap().is_none());
        assert_eq!(source.calls().len(), 2);
    }
}
