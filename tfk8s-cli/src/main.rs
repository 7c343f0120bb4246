//! `tfk8s` binary entry point

use clap::Parser;
use colored::Colorize;

use tfk8s_cli::cli::{Cli, Commands};
use tfk8s_cli::commands;
use tfk8s_cli::error::CliError;
use tfk8s_cli::logging::init_tracing;
use tfk8s_cli::output::OutputWriter;
use tfk8s_core::config::{GeneralConfig, Tfk8sConfig};
use tfk8s_core::error::Tfk8sError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let (config_path, explicit) = cli.config_path();
    let writer = OutputWriter::new(cli.output);
    let log_level = cli.log_level;
    let loaded = commands::load_config(&config_path, explicit).await;

    match cli.command {
        Commands::Run(args) => {
            let config = ready(loaded, log_level.as_deref())?;
            commands::run::execute(args, &config, &writer).await
        }
        Commands::List(args) => {
            let config = ready(loaded, log_level.as_deref())?;
            commands::list::execute(args, &config, &writer).await
        }
        // `config` reports load errors itself
        Commands::Config(args) => {
            let general = loaded.map(|c| c.general).unwrap_or_default();
            init_logging(general, log_level.as_deref())?;
            commands::config::execute(args, &config_path, explicit, &writer).await
        }
    }
}

/// Require a valid configuration and start logging from it.
fn ready(
    loaded: Result<Tfk8sConfig, Tfk8sError>,
    log_level: Option<&str>,
) -> Result<Tfk8sConfig, CliError> {
    let config = loaded?;
    init_logging(config.general.clone(), log_level)?;
    tracing::debug!(
        scenarios_root = %config.paths.scenarios_root,
        reports_dir = %config.paths.reports_dir,
        "configuration loaded"
    );
    Ok(config)
}

fn init_logging(mut general: GeneralConfig, level: Option<&str>) -> Result<(), CliError> {
    if let Some(level) = level {
        if !LOG_LEVELS.contains(&level) {
            return Err(CliError::Config(format!(
                "invalid --log-level '{}': must be one of: {}",
                level,
                LOG_LEVELS.join(", ")
            )));
        }
        general.log_level = level.to_owned();
    }
    init_tracing(&general)
}
