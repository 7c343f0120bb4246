//! CLI-specific error types and exit code mapping

use tfk8s_core::error::Tfk8sError;
use tfk8s_engine::EngineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// At least one scenario failed, or nothing was executed.
    #[error("run failed: {0}")]
    ScenarioFailed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from tfk8s-core.
    #[error("{0}")]
    Core(#[from] Tfk8sError),

    /// Scenario engine error.
    #[error("{0}")]
    Engine(#[from] EngineError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Success                                   |
    /// | 1    | Scenario failure / no scenarios / command |
    /// | 2    | Configuration error                       |
    /// | 10   | IO error                                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Core(Tfk8sError::Config(_)) => 2,
            Self::Engine(EngineError::Config { .. }) => 2,
            Self::Io(_) | Self::Core(Tfk8sError::Io(_)) => 10,
            Self::Command(_)
            | Self::ScenarioFailed(_)
            | Self::JsonSerialize(_)
            | Self::Core(_)
            | Self::Engine(_) => 1,
        }
    }
}
