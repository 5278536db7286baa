//! Cat command - print a file of a package's main revision

use crate::cli::args::CatArgs;
use crate::cli::commands::{main_revision, package_resolver};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Execute the cat command
pub async fn execute(args: CatArgs, config: &Config) -> StoreResult<()> {
    let target = package_resolver(config)?.resolve_package(&args.target)?;
    let revision = main_revision(&target, args.location.as_deref()).await?;
    let archive = revision.archive().ok_or_else(|| StoreError::NoRevision {
        target: target.id().to_string(),
    })?;
    debug!("Reading {} from archive {}", args.file, archive.hash());

    let content = archive
        .file_content(&args.file)
        .await?
        .ok_or_else(|| StoreError::FileNotFound {
            path: args.file.clone(),
        })?;

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(&content)
        .await
        .map_err(|e| StoreError::io("writing to stdout", e))?;
    stdout
        .flush()
        .await
        .map_err(|e| StoreError::io("flushing stdout", e))
}
