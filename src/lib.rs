//! pkgstore - package archival and resolution cache
//!
//! Resolves logical package references to immutable, content-addressed
//! snapshots of a local git mirror.
//!
//! ```text
//! PackageResolver → PackageTarget → PackageLocation → PackageBranch
//!     → PackageRevision → Archive
//! ```
//!
//! Archives are built by [`archive::ArchiveBuilder`], which clones the mirror
//! through [`repository::RepositoryGateway`], hashes the tree reproducibly and
//! publishes it under `<cache root>/archives/<hash>`.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod package;
pub mod process;
pub mod repository;
pub mod ui;

pub use error::{StoreError, StoreResult};
