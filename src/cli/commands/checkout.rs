//! Checkout command - archive a subdirectory of a branch

use crate::cli::args::{CheckoutArgs, OutputFormat};
use crate::cli::commands::archive_builder;
use crate::config::Config;
use crate::error::StoreResult;
use crate::ui::{self, TaskSpinner, UiContext};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CheckoutReport {
    branch: String,
    path: String,
    commit: String,
    archive: Option<String>,
    archive_path: Option<PathBuf>,
}

/// Execute the checkout command
pub async fn execute(args: CheckoutArgs, config: &Config) -> StoreResult<()> {
    let ctx = UiContext::detect();
    let builder = archive_builder(config);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Checking out {}:{}...", args.branch, args.path));
    let outcome = match builder.checkout(&args.branch, &args.path).await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error("Checkout failed");
            return Err(e);
        }
    };

    let report = CheckoutReport {
        branch: args.branch.clone(),
        path: args.path.clone(),
        commit: outcome.commit.to_string(),
        archive: outcome.archive.as_ref().map(ToString::to_string),
        archive_path: outcome.archive.as_ref().map(|hash| builder.archive_dir(hash)),
    };

    match &outcome.archive {
        Some(hash) => spinner.stop(&format!("Archive {} ready", hash.short())),
        None => {
            spinner.clear();
            ui::step_warn_hint(
                &ctx,
                &format!("No content at {} on {}", args.path, args.branch),
                "the path does not exist at this commit",
            );
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            ui::key_value(&ctx, "commit", &report.commit);
            ui::key_value(&ctx, "archive", report.archive.as_deref().unwrap_or("-"));
            if let Some(path) = &report.archive_path {
                ui::key_value(&ctx, "path", &path.display().to_string());
            }
        }
    }

    Ok(())
}
