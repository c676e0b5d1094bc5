//! Shared setup for every command: logging and configuration.

use std::path::{Path, PathBuf};

use filerelay::config::{ConfigFile, RelayConfig};
use filerelay::logging::{init_logging, WorkerGuard};
use tracing::{debug, info};

use crate::error::CliError;
use crate::GlobalArgs;

/// Location of the optional default configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("filerelay").join("config.ini"))
}

/// Resolve the relay configuration.
///
/// Storage root precedence: `--root`, then the config file, then `BASE_DIR`,
/// then the platform data directory.
pub fn resolve_config(
    config_path: Option<&Path>,
    root: Option<&Path>,
) -> Result<RelayConfig, CliError> {
    let mut config = match config_path {
        Some(path) => ConfigFile::load(path)?.relay,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => ConfigFile::load(&path)?.relay,
            None => RelayConfig::default(),
        },
    };

    if let Some(root) = root {
        config.storage_root = root.to_path_buf();
    }
    config.validate()?;
    Ok(config)
}

/// Logging guard plus resolved configuration, held for the process lifetime.
pub struct CliRunner {
    config: RelayConfig,
    _guard: Option<WorkerGuard>,
}

impl CliRunner {
    pub fn new(global: &GlobalArgs) -> Result<Self, CliError> {
        let guard = init_logging(global.log_dir.as_deref(), global.verbose)?;
        let config = resolve_config(global.config.as_deref(), global.root.as_deref())?;
        debug!(root = %config.storage_root.display(), "Configuration resolved");
        Ok(Self {
            config,
            _guard: guard,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(command, version = filerelay::VERSION, "filerelay starting");
    }
}
