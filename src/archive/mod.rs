//! Content-addressed archive store
//!
//! Turns `(branch, subdirectory)` into an immutable directory published under
//! `<cache_root>/archives/<hash>`, where `hash` is the SHA-256 of a
//! reproducible tar stream of the directory.
//!
//! # Caching levels
//!
//! | Level | Key | Value | Lifetime |
//! |-------|-----|-------|----------|
//! | Checkout cache | commit + subdirectory | archive hash or none | process |
//! | Archive store | archive hash | directory | forever |
//!
//! Losing the checkout cache only costs a rebuild: publication is keyed by
//! content, so rebuilding the same tree lands on the same directory.

mod builder;
mod cache;
mod canonical;
mod handle;
mod sync;

pub use builder::ArchiveBuilder;
pub use cache::{CheckoutCache, CheckoutKey};
pub use canonical::archive_hash;
pub use handle::Archive;
pub use sync::{sync_tree, SyncStats};

use crate::error::{StoreError, StoreResult};
use crate::repository::CommitId;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Hex SHA-256 of the canonical tar stream of an archive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArchiveHash(String);

impl ArchiveHash {
    /// Wrap a digest computed by [`archive_hash`]
    fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse a hash typed by a user or read from disk
    pub fn parse(hash: &str) -> StoreResult<Self> {
        let hash = hash.trim();
        if hash.len() != 64 || !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(StoreError::path_invalid(
                hash,
                "not a lowercase hex SHA-256 digest",
            ));
        }
        Ok(Self(hash.to_string()))
    }

    /// The hex representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for ArchiveHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of checking out a subdirectory of a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOutcome {
    /// Commit the branch pointed at
    pub commit: CommitId,
    /// Published archive, or `None` when the subdirectory does not exist at that commit
    pub archive: Option<ArchiveHash>,
}

/// Source of published archives
///
/// Implemented by [`ArchiveBuilder`]; the package resolution chain only sees
/// this trait.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Check out `subdirectory` of `branch`, building and publishing its archive if needed
    async fn checkout(&self, branch: &str, subdirectory: &str) -> StoreResult<CheckoutOutcome>;

    /// Handle onto a published archive
    fn archive(&self, hash: &ArchiveHash) -> Archive;
}

/// Validate and normalize a relative path inside a repository or archive.
///
/// Empty and `.` components are dropped; the repository root is returned as
/// `"."`. Absolute paths and `..` components are rejected.
pub fn validate_relative_path(path: &str) -> StoreResult<String> {
    if path.starts_with('/') {
        return Err(StoreError::path_invalid(path, "must be relative"));
    }
    if path.contains('\0') {
        return Err(StoreError::path_invalid(path, "must not contain NUL"));
    }

    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(StoreError::path_invalid(path, "must not contain '..'")),
            part => parts.push(part),
        }
    }

    if parts.is_empty() {
        Ok(".".to_string())
    } else {
        Ok(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_normalization() {
        assert_eq!(validate_relative_path("").unwrap(), ".");
        assert_eq!(validate_relative_path(".").unwrap(), ".");
        assert_eq!(validate_relative_path("./a//b/").unwrap(), "a/b");
        assert!(validate_relative_path("/etc").is_err());
        assert!(validate_relative_path("a/../b").is_err());
    }

    #[test]
    fn archive_hash_parse() {
        let hex = "bbfe0dde7ea3423782875b848a01886d3d22afeb946a471148781e517a2a5363";
        let hash = ArchiveHash::parse(hex).unwrap();
        assert_eq!(hash.as_str(), hex);
        assert_eq!(hash.short(), "bbfe0dde7ea3");
        assert!(ArchiveHash::parse("abc").is_err());
        assert!(ArchiveHash::parse(&hex.to_uppercase()).is_err());
    }
}
