//! Branches command - list branches of the mirror

use crate::config::Config;
use crate::error::StoreResult;
use crate::repository::RepositoryGateway;
use crate::ui::{self, UiContext};

/// Execute the branches command
pub async fn execute(config: &Config) -> StoreResult<()> {
    let gateway = RepositoryGateway::new(&config.repository.mirror_path);
    gateway.ensure_initialized().await?;

    let branches = gateway.list_branches().await?;
    if branches.is_empty() {
        let ctx = UiContext::detect();
        ui::step_info(
            &ctx,
            &format!("No branches in {}", gateway.mirror_path().display()),
        );
        return Ok(());
    }

    for branch in branches {
        println!("{}", branch);
    }
    Ok(())
}
