//! Locations command - list where a package's content is searched

use crate::cli::args::{LocationsArgs, OutputFormat};
use crate::cli::commands::package_resolver;
use crate::config::Config;
use crate::error::StoreResult;
use crate::package::{LocationKind, PackageLocation};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct LocationReport {
    name: String,
    kind: LocationKind,
    path: String,
    branches: Vec<String>,
}

impl From<&PackageLocation> for LocationReport {
    fn from(location: &PackageLocation) -> Self {
        Self {
            name: location.name().to_string(),
            kind: location.kind(),
            path: location.path().to_string(),
            branches: location
                .branches()
                .iter()
                .map(|b| b.name().to_string())
                .collect(),
        }
    }
}

/// Execute the locations command
pub async fn execute(args: LocationsArgs, config: &Config) -> StoreResult<()> {
    let target = package_resolver(config)?.resolve_package(&args.target)?;
    let reports: Vec<LocationReport> = target.locations().iter().map(Into::into).collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Table => print_table(&reports),
    }
    Ok(())
}

fn print_table(reports: &[LocationReport]) {
    println!(
        "{:<16} {:<8} {:<32} {}",
        style("NAME").bold(),
        style("KIND").bold(),
        style("PATH").bold(),
        style("BRANCHES").bold()
    );
    for report in reports {
        let kind = match report.kind {
            LocationKind::Default => style("default").green(),
            LocationKind::Named => style("named").dim(),
        };
        println!(
            "{:<16} {:<8} {:<32} {}",
            report.name,
            kind,
            report.path,
            report.branches.join(", ")
        );
    }
}
