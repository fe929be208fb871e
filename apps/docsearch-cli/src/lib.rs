//! Shared start-up for the command-line binaries.

use std::path::Path;

use docsearch_core::config::{AppConfig, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to stderr so stdout stays clean JSON.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

/// Layered config with files looked up in `dir` (default: current directory).
pub fn load_app_config(dir: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = Config::load_in(dir.unwrap_or(Path::new(".")))?;
    config.app()
}
