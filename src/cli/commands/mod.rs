//! CLI command implementations

pub mod branches;
pub mod cat;
pub mod checkout;
pub mod config;
pub mod exec;
pub mod locations;
pub mod resolve;

pub use branches::execute as branches;
pub use cat::execute as cat;
pub use checkout::execute as checkout;
pub use config::execute as config;
pub use exec::execute as exec;
pub use locations::execute as locations;
pub use resolve::execute as resolve;

use crate::archive::ArchiveBuilder;
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::package::{PackageResolver, PackageRevision, PackageTarget};
use crate::repository::RepositoryGateway;
use std::sync::Arc;

/// Wire the archive builder for `config`
pub(crate) fn archive_builder(config: &Config) -> Arc<ArchiveBuilder> {
    let gateway = Arc::new(RepositoryGateway::new(&config.repository.mirror_path));
    Arc::new(ArchiveBuilder::new(gateway, config.cache.clone()))
}

/// Wire the resolution chain for `config`
pub(crate) fn package_resolver(config: &Config) -> StoreResult<PackageResolver> {
    PackageResolver::from_config(config, archive_builder(config))
}

/// Main revision of `target`, or of one of its locations
pub(crate) async fn main_revision(
    target: &PackageTarget,
    location: Option<&str>,
) -> StoreResult<PackageRevision> {
    let revision = match location {
        Some(name) => {
            let location = target
                .location(name)
                .ok_or_else(|| StoreError::LocationNotFound {
                    target: target.id().to_string(),
                    name: name.to_string(),
                })?;
            location.main_revision().await?
        }
        None => target.main_revision().await?,
    };

    revision.ok_or_else(|| StoreError::NoRevision {
        target: target.id().to_string(),
    })
}
