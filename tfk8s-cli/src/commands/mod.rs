//! Command handlers -- one module per subcommand

use std::path::Path;

use tfk8s_core::config::Tfk8sConfig;
use tfk8s_core::error::Tfk8sError;

pub mod config;
pub mod list;
pub mod run;

/// Load the effective configuration.
///
/// A missing file is only an error when the user named the path explicitly;
/// the default `tfk8s.toml` is optional and falls back to built-in defaults.
pub async fn load_config(path: &Path, explicit: bool) -> Result<Tfk8sConfig, Tfk8sError> {
    if explicit {
        Tfk8sConfig::load(path).await
    } else {
        Tfk8sConfig::load_or_default(path).await
    }
}
