//! Exec command - run a command inside a package's main revision

use crate::cli::args::ExecArgs;
use crate::cli::commands::{main_revision, package_resolver};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use tracing::info;

/// Execute the exec command
pub async fn execute(args: ExecArgs, config: &Config) -> StoreResult<()> {
    let target = package_resolver(config)?.resolve_package(&args.target)?;
    let revision = main_revision(&target, args.location.as_deref()).await?;
    let archive = revision.archive().ok_or_else(|| StoreError::NoRevision {
        target: target.id().to_string(),
    })?;

    info!("Running {:?} in {}", args.command, archive.path().display());
    let stdout = archive.exec_in_directory(&args.command).await?;
    print!("{}", stdout);
    Ok(())
}
