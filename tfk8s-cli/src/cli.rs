//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tfk8s_core::types::ClusterType;

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "tfk8s.toml";

/// tfk8s -- declarative compliance scenario runner for Kubernetes.
///
/// Use `tfk8s <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "tfk8s", version, about, long_about = None)]
pub struct Cli {
    /// Path to the tfk8s.toml configuration file [default: tfk8s.toml].
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The configuration path to load and whether the user named it explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenarios of a group against a cluster.
    Run(RunArgs),

    /// List catalog groups and the state of their scenarios.
    List(ListArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Cluster flavour the scenarios are executed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClusterArg {
    /// Single-node kind cluster.
    Kind,
    /// Two-node k3d cluster.
    #[value(name = "k3d-duo")]
    K3dDuo,
}

impl From<ClusterArg> for ClusterType {
    fn from(arg: ClusterArg) -> Self {
        match arg {
            ClusterArg::Kind => ClusterType::Kind,
            ClusterArg::K3dDuo => ClusterType::K3dDuo,
        }
    }
}

/// Run every enabled scenario of a group.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Group name or scenario id prefix (e.g. `security`, `TF-SEC`).
    #[arg(short, long)]
    pub group: String,

    /// Cluster type the run targets.
    #[arg(long)]
    pub cluster: ClusterArg,

    /// Run only this scenario id from the group.
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Preserve the namespace of a failed scenario for inspection.
    #[arg(long)]
    pub keep_on_failure: bool,

    /// Override the directory result files are written to.
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    /// Override the directory holding `enabled/` and `pending/` scenarios.
    #[arg(long)]
    pub scenarios_root: Option<PathBuf>,
}

// ---- list ----

/// List catalog groups.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show only this group.
    #[arg(short, long)]
    pub group: Option<String>,
}

// ---- config ----

/// Manage tfk8s configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, paths, cluster, catalog).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_run_minimal() {
        let args = Cli::try_parse_from(["tfk8s", "run", "--group", "security", "--cluster", "kind"]);
        assert!(args.is_ok(), "should parse 'run' subcommand");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Run(run_args) => {
                assert_eq!(run_args.group, "security");
                assert_eq!(run_args.cluster, ClusterArg::Kind);
                assert!(run_args.scenario.is_none(), "scenario should be None");
                assert!(!run_args.keep_on_failure, "keep_on_failure should default to false");
                assert!(run_args.reports_dir.is_none());
                assert!(run_args.scenarios_root.is_none());
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_all_options() {
        let args = Cli::try_parse_from([
            "tfk8s",
            "run",
            "-g",
            "TF-SEC",
            "--cluster",
            "k3d-duo",
            "-s",
            "TF-SEC-1_SBOM_Validation",
            "--keep-on-failure",
            "--reports-dir",
            "/tmp/reports",
            "--scenarios-root",
            "/opt/tf-k8s/scenarios",
        ]);
        assert!(args.is_ok(), "should parse run with all options");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Run(run_args) => {
                assert_eq!(run_args.group, "TF-SEC");
                assert_eq!(run_args.cluster, ClusterArg::K3dDuo);
                assert_eq!(
                    run_args.scenario.as_deref(),
                    Some("TF-SEC-1_SBOM_Validation")
                );
                assert!(run_args.keep_on_failure);
                assert_eq!(run_args.reports_dir, Some(PathBuf::from("/tmp/reports")));
                assert_eq!(
                    run_args.scenarios_root,
                    Some(PathBuf::from("/opt/tf-k8s/scenarios"))
                );
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_requires_group() {
        let args = Cli::try_parse_from(["tfk8s", "run", "--cluster", "kind"]);
        assert!(args.is_err(), "run without --group should fail");
    }

    #[test]
    fn test_cli_parse_run_requires_cluster() {
        let args = Cli::try_parse_from(["tfk8s", "run", "--group", "security"]);
        assert!(args.is_err(), "run without --cluster should fail");
    }

    #[test]
    fn test_cli_parse_run_rejects_unknown_cluster() {
        let args =
            Cli::try_parse_from(["tfk8s", "run", "--group", "security", "--cluster", "minikube"]);
        assert!(args.is_err(), "unknown cluster type should be rejected");
    }

    #[test]
    fn test_cluster_arg_converts_to_cluster_type() {
        assert_eq!(ClusterType::from(ClusterArg::Kind), ClusterType::Kind);
        assert_eq!(ClusterType::from(ClusterArg::K3dDuo), ClusterType::K3dDuo);
    }

    #[test]
    fn test_cli_parse_list() {
        let args = Cli::try_parse_from(["tfk8s", "list"]);
        assert!(args.is_ok(), "should parse 'list' subcommand");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::List(list_args) => {
                assert!(list_args.group.is_none(), "group filter should be None");
            }
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_list_with_group() {
        let args = Cli::try_parse_from(["tfk8s", "list", "--group", "ci-cd"]);
        assert!(args.is_ok(), "should parse list with group filter");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::List(list_args) => {
                assert_eq!(list_args.group, Some("ci-cd".to_owned()));
            }
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let args = Cli::try_parse_from(["tfk8s", "config", "validate"]);
        assert!(args.is_ok(), "should parse 'config validate' subcommand");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Validate => {}
                _ => panic!("expected Validate action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let args = Cli::try_parse_from(["tfk8s", "config", "show", "--section", "cluster"]);
        assert!(args.is_ok(), "should parse config show with section");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section, Some("cluster".to_owned()));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_config_path_default_is_implicit() {
        let cli = Cli::try_parse_from(["tfk8s", "list"]).expect("parse succeeded");
        let (path, explicit) = cli.config_path();
        assert_eq!(path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!explicit, "default path should not count as explicit");
    }

    #[test]
    fn test_cli_config_path_explicit() {
        let cli = Cli::try_parse_from(["tfk8s", "-c", "/etc/tfk8s/tfk8s.toml", "list"])
            .expect("parse succeeded");
        let (path, explicit) = cli.config_path();
        assert_eq!(path, PathBuf::from("/etc/tfk8s/tfk8s.toml"));
        assert!(explicit, "--config should count as explicit");
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let args = Cli::try_parse_from(["tfk8s", "list", "--output", "json", "--log-level", "debug"]);
        assert!(args.is_ok(), "global flags should be accepted after subcommand");
        let cli = args.expect("parse succeeded");
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.log_level, Some("debug".to_owned()));
    }

    #[test]
    fn test_cli_parse_invalid_output_format() {
        let args = Cli::try_parse_from(["tfk8s", "--output", "yaml", "list"]);
        assert!(args.is_err(), "should reject invalid output format");
    }

    #[test]
    fn test_cli_parse_missing_subcommand() {
        let args = Cli::try_parse_from(["tfk8s"]);
        assert!(args.is_err(), "should require a subcommand");
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
