//! tfk8s command-line interface
//!
//! The `tfk8s` binary is a thin shell over `tfk8s-engine`: it parses
//! arguments, loads `tfk8s.toml`, initializes logging and dispatches to one
//! handler per subcommand. Handlers render report values through
//! [`output::OutputWriter`] and return [`error::CliError`], whose
//! `exit_code()` becomes the process exit status.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
