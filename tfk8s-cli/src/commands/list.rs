//! `tfk8s list` command handler

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use tfk8s_core::config::Tfk8sConfig;
use tfk8s_engine::{GroupRegistry, MemberStatus, ScenarioCatalog};

use crate::cli::ListArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
///
/// A group that is not registered is treated as a scenario id prefix, the same
/// way `tfk8s run` resolves it.
pub async fn execute(
    args: ListArgs,
    config: &Tfk8sConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = build_report(args.group.as_deref(), config)?;
    writer.render(&report)?;
    Ok(())
}

fn build_report(group: Option<&str>, config: &Tfk8sConfig) -> Result<CatalogReport, CliError> {
    let catalog = ScenarioCatalog::new(
        PathBuf::from(&config.paths.scenarios_root),
        GroupRegistry::with_overrides(&config.catalog.groups),
    );
    info!(root = %catalog.root().display(), "listing scenario catalog");

    let groups = match group {
        Some(name) => match catalog.registry().members(name) {
            Some(members) => vec![group_entry(&catalog, name, members)],
            None => vec![prefix_entry(&catalog, name)?],
        },
        None => catalog
            .registry()
            .iter()
            .map(|(name, members)| group_entry(&catalog, name, members))
            .collect(),
    };

    Ok(CatalogReport {
        scenarios_root: catalog.root().display().to_string(),
        groups,
    })
}

fn group_entry(catalog: &ScenarioCatalog, name: &str, members: &[String]) -> GroupEntry {
    GroupEntry {
        name: name.to_owned(),
        prefix_match: false,
        scenarios: members
            .iter()
            .map(|id| ScenarioEntry {
                id: id.clone(),
                status: catalog.status(id).as_str().to_owned(),
            })
            .collect(),
    }
}

fn prefix_entry(catalog: &ScenarioCatalog, prefix: &str) -> Result<GroupEntry, CliError> {
    let resolution = catalog.resolve(prefix, None)?;
    let scenarios = resolution
        .locations
        .iter()
        .filter_map(|path| path.parent()?.file_name()?.to_str())
        .map(|id| ScenarioEntry {
            id: id.to_owned(),
            status: MemberStatus::Enabled.as_str().to_owned(),
        })
        .collect();

    Ok(GroupEntry {
        name: prefix.to_owned(),
        prefix_match: true,
        scenarios,
    })
}

#[derive(Serialize)]
pub struct CatalogReport {
    pub scenarios_root: String,
    pub groups: Vec<GroupEntry>,
}

#[derive(Serialize)]
pub struct GroupEntry {
    pub name: String,
    /// Not a registered group; scenarios matched by id prefix.
    pub prefix_match: bool,
    pub scenarios: Vec<ScenarioEntry>,
}

#[derive(Serialize)]
pub struct ScenarioEntry {
    pub id: String,
    pub status: String,
}

impl Render for CatalogReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scenario Catalog: {}", self.scenarios_root.bold())?;

        for group in &self.groups {
            writeln!(w)?;
            let label = if group.prefix_match {
                format!("{} (prefix)", group.name)
            } else {
                group.name.clone()
            };
            writeln!(w, "{} ({} scenarios)", label.bold(), group.scenarios.len())?;
            writeln!(w, "{:<45} Status", "ID")?;
            writeln!(w, "{}", "-".repeat(55))?;

            for s in &group.scenarios {
                let status_colored = match s.status.as_str() {
                    "enabled" => s.status.green(),
                    "pending" => s.status.yellow(),
                    "missing" => s.status.red(),
                    _ => s.status.normal(),
                };
                writeln!(w, "{:<45} {}", s.id, status_colored)?;
            }
        }

        Ok(())
    }
}
