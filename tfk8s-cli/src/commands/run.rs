//! `tfk8s run` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use tfk8s_core::config::Tfk8sConfig;
use tfk8s_engine::{
    CommandRunner, EngineConfig, EngineConfigBuilder, GroupRegistry, ProcessRunner, RunRequest,
    RunSummary, ScenarioRunner, ScenarioStatus,
};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command against the real cluster tooling.
pub async fn execute(
    args: RunArgs,
    config: &Tfk8sConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    execute_with(args, config, Arc::new(ProcessRunner::new()), writer).await
}

/// Execute the `run` command with the given command runner.
///
/// # Errors
///
/// Returns `CliError::ScenarioFailed` when any executed scenario failed or
/// nothing was executed, and `CliError::Engine` when the catalog cannot be read
/// or the effective engine settings are invalid.
pub async fn execute_with<R: CommandRunner>(
    args: RunArgs,
    config: &Tfk8sConfig,
    runner: Arc<R>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine_config = engine_config(&args, config)?;
    let registry = GroupRegistry::with_overrides(&config.catalog.groups);

    let mut request = RunRequest::new(args.group, args.cluster.into());
    if let Some(id) = args.scenario {
        request = request.scenario(id);
    }

    info!(
        group = %request.group,
        cluster = %request.cluster,
        scenario = request.scenario_id.as_deref().unwrap_or("-"),
        scenarios_root = %engine_config.scenarios_root.display(),
        "starting run"
    );

    let summary = ScenarioRunner::new(&engine_config, registry, runner)
        .run(&request)
        .await?;

    let report = RunReport::from(summary);
    writer.render(&report)?;

    if report.success {
        return Ok(());
    }
    if report.executed == 0 {
        return Err(CliError::ScenarioFailed(format!(
            "no scenarios executed for group '{}'",
            report.summary.group
        )));
    }
    Err(CliError::ScenarioFailed(format!(
        "{} of {} scenarios failed",
        report.failed, report.executed
    )))
}

/// Merge CLI overrides into the configured engine settings.
fn engine_config(args: &RunArgs, config: &Tfk8sConfig) -> Result<EngineConfig, CliError> {
    let mut builder = EngineConfigBuilder::from_core(config);
    if let Some(ref root) = args.scenarios_root {
        builder = builder.scenarios_root(root);
    }
    if let Some(ref dir) = args.reports_dir {
        builder = builder.reports_dir(dir);
    }
    if args.keep_on_failure {
        builder = builder.keep_on_failure(true);
    }
    Ok(builder.build()?)
}

/// Run report: the engine summary plus the totals shown to the user.
#[derive(Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub summary: RunSummary,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub executed: usize,
    pub success: bool,
}

impl From<RunSummary> for RunReport {
    fn from(summary: RunSummary) -> Self {
        Self {
            passed: summary.passed(),
            failed: summary.failed(),
            skipped: summary.skipped(),
            executed: summary.executed(),
            success: summary.success(),
            summary,
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Run: group {} on {}",
            self.summary.group.bold(),
            self.summary.cluster
        )?;

        for warning in &self.summary.warnings {
            writeln!(w, "  {} {}", "warning:".yellow(), warning)?;
        }
        writeln!(w)?;

        for outcome in &self.summary.scenarios {
            let status = match outcome.status {
                ScenarioStatus::Passed => "PASS".green().bold(),
                ScenarioStatus::Failed => "FAIL".red().bold(),
                ScenarioStatus::Invalid => "INVALID".red().bold(),
                ScenarioStatus::Skipped => "SKIP".yellow().bold(),
            };
            let name = outcome
                .scenario_id
                .clone()
                .unwrap_or_else(|| outcome.location.display().to_string());
            writeln!(w, "{:<8} {}", status, name)?;

            if let Some(ref result) = outcome.result {
                for step in &result.steps {
                    let mark = if step.success {
                        "ok".green()
                    } else if step.critical {
                        "failed".red()
                    } else {
                        "failed (non-critical)".yellow()
                    };
                    writeln!(w, "    step {:<40} {}", step.name, mark)?;
                }
                for criterion in &result.criteria {
                    let actual = criterion
                        .actual
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "n/a".to_owned());
                    let mark = if criterion.success {
                        "ok".green()
                    } else {
                        "failed".red()
                    };
                    writeln!(
                        w,
                        "    criterion {:<35} {} >= {} {}",
                        criterion.name, actual, criterion.threshold, mark
                    )?;
                }
                if result.aborted {
                    writeln!(w, "    {}", "aborted after critical step failure".red())?;
                }
                if let Some(ref err) = result.error {
                    writeln!(w, "    error: {}", err.red())?;
                }
            }
            if outcome.result.is_none() {
                if let Some(ref err) = outcome.error {
                    writeln!(w, "    {}", err)?;
                }
            }
            if let Some(ref path) = outcome.result_path {
                writeln!(w, "    result: {}", path.display())?;
            }
            if outcome.namespace_kept {
                writeln!(w, "    {}", "namespace kept for inspection".yellow())?;
            }
            if let Some(ref err) = outcome.cleanup_error {
                writeln!(w, "    cleanup: {}", err.yellow())?;
            }
        }

        writeln!(w)?;
        let verdict = if self.success {
            "SUCCESS".green().bold()
        } else {
            "FAILURE".red().bold()
        };
        writeln!(
            w,
            "{}: {} passed, {} failed, {} skipped",
            verdict, self.passed, self.failed, self.skipped
        )?;

        Ok(())
    }
}
