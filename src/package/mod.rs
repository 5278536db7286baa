//! Package resolution chain
//!
//! Turns a package target into an archive by walking
//! target → location → branch → revision → archive:
//!
//! 1. A target has its declared locations plus a `default` one, synthesized
//!    with `path = <target id>` when not declared.
//! 2. A location has two candidate branches, searched in order.
//! 3. A branch checks out the location's path; a missing branch has no revision.
//! 4. The first revision with content is the location's main revision.
//!
//! Handles carry ids and a shared [`PackageContext`] only; parents are rebuilt
//! from ids when asked for.

mod branch;
mod location;
mod target;

pub use branch::{PackageBranch, PackageRevision};
pub use location::{LocationKind, PackageLocation};
pub use target::PackageTarget;

use crate::archive::{validate_relative_path, ArchiveSource};
use crate::config::{Config, LocationConfig};
use crate::error::{StoreError, StoreResult};
use crate::repository::CommitId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Slash-separated package id, e.g. `problems/sum`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Parse and normalize a package id
    pub fn parse(id: &str) -> StoreResult<Self> {
        let normalized = validate_relative_path(id)?;
        if normalized == "." {
            return Err(StoreError::path_invalid(id, "package id must not be empty"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named location of a target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LocationId {
    pub target: TargetId,
    pub name: String,
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.target, self.name)
    }
}

/// A candidate branch of a location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BranchId {
    pub location: LocationId,
    pub name: String,
}

/// A branch observed at a commit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RevisionId {
    pub branch: BranchId,
    pub commit: CommitId,
}

/// Read-only state shared by every handle of the chain
pub struct PackageContext {
    catalog: HashMap<TargetId, Vec<LocationConfig>>,
    source: Arc<dyn ArchiveSource>,
}

impl PackageContext {
    /// Build a context from the declared packages of `config`
    pub fn new(config: &Config, source: Arc<dyn ArchiveSource>) -> StoreResult<Self> {
        let mut catalog = HashMap::new();
        for package in &config.packages {
            let id = TargetId::parse(&package.id)?;
            catalog.insert(id, package.locations.clone());
        }
        Ok(Self { catalog, source })
    }

    /// Declared locations of `target`, empty when the target is not declared
    fn declared_locations(&self, target: &TargetId) -> &[LocationConfig] {
        self.catalog.get(target).map(Vec::as_slice).unwrap_or_default()
    }

    fn source(&self) -> &dyn ArchiveSource {
        self.source.as_ref()
    }
}

impl fmt::Debug for PackageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageContext")
            .field("packages", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

/// Entry point of the resolution chain
#[derive(Debug, Clone)]
pub struct PackageResolver {
    context: Arc<PackageContext>,
}

impl PackageResolver {
    pub fn new(context: PackageContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Resolver over the packages declared in `config`
    pub fn from_config(config: &Config, source: Arc<dyn ArchiveSource>) -> StoreResult<Self> {
        Ok(Self::new(PackageContext::new(config, source)?))
    }

    /// Handle onto package `target_id`.
    ///
    /// Undeclared targets are valid and only have the `default` location.
    pub fn resolve_package(&self, target_id: &str) -> StoreResult<PackageTarget> {
        let id = TargetId::parse(target_id)?;
        Ok(PackageTarget::new(self.context.clone(), id))
    }
}
