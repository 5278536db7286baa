//! Local bare mirror of the source repository
//!
//! The mirror is the source of truth for branch and commit lookups. Branch
//! names never reach `git` unvalidated.

mod gateway;

pub use gateway::{candidate_branch_names, validate_branch_name, RepositoryGateway, DEFAULT_LOCATION};

#[cfg(test)]
pub(crate) use gateway::test_support;

use serde::Serialize;
use std::fmt;

/// A commit id as printed by `git rev-parse`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap a commit id, trimming surrounding whitespace
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// The hex representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
