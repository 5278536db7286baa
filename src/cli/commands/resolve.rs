//! Resolve command - find the main revision of a package

use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::cli::commands::{main_revision, package_resolver};
use crate::config::Config;
use crate::error::StoreResult;
use crate::ui::{self, TaskSpinner, UiContext};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct RevisionReport {
    target: String,
    location: String,
    path: String,
    branch: String,
    commit: String,
    archive: Option<String>,
    archive_path: Option<PathBuf>,
}

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> StoreResult<()> {
    let ctx = UiContext::detect();
    let target = package_resolver(config)?.resolve_package(&args.target)?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Resolving {}...", target.id()));
    let revision = match main_revision(&target, args.location.as_deref()).await {
        Ok(revision) => revision,
        Err(e) => {
            spinner.stop_error("No revision found");
            return Err(e);
        }
    };
    spinner.stop(&format!("Resolved {}", target.id()));

    let branch = revision.branch();
    let location = branch.location();
    let archive = revision.archive();
    let report = RevisionReport {
        target: target.id().to_string(),
        location: location.name().to_string(),
        path: location.path().to_string(),
        branch: branch.name().to_string(),
        commit: revision.commit().to_string(),
        archive: revision.archive_hash().map(ToString::to_string),
        archive_path: archive.map(|a| a.path().to_path_buf()),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            ui::key_value(&ctx, "location", &report.location);
            ui::key_value(&ctx, "path", &report.path);
            ui::key_value(&ctx, "branch", &report.branch);
            ui::key_value(&ctx, "commit", &report.commit);
            ui::key_value(&ctx, "archive", report.archive.as_deref().unwrap_or("-"));
            if let Some(path) = &report.archive_path {
                ui::key_value(&ctx, "archive path", &path.display().to_string());
            }
        }
    }

    Ok(())
}
