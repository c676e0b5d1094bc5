//! Configuration for the file relay.
//!
//! [`RelayConfig`] is the value type every component is built from. It can be
//! assembled with builder methods or loaded from an INI file through
//! [`ConfigFile`]:
//!
//! ```ini
//! [storage]
//! root = /var/lib/filerelay
//!
//! [relay]
//! size_threshold = 15MB
//! part_size = 10MB
//! pacing_secs = 2
//! fetch_timeout_secs = 30
//! max_urls = 3
//!
//! [retention]
//! window_secs = 21600
//! sweep_interval_secs = 21600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

/// Files strictly larger than this are split before delivery (15 MiB).
pub const DEFAULT_SIZE_THRESHOLD: u64 = 15_728_640;

/// Default size of one delivered part (10 MiB).
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Default gap between two consecutive parts of one delivery.
pub const DEFAULT_PACING_SECS: u64 = 2;

/// Files older than this are removed by the retention sweep (6 hours).
pub const DEFAULT_RETENTION_SECS: u64 = 6 * 60 * 60;

/// Period of the retention sweep (6 hours).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Per-request timeout for a single fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Maximum number of locators processed from one inbound message.
pub const DEFAULT_MAX_URLS_PER_MESSAGE: usize = 3;

/// Environment variable consulted for the storage root.
pub const ROOT_ENV_VAR: &str = "BASE_DIR";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or parsed.
    #[error("failed to load config {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// A key holds a value that cannot be interpreted.
    #[error("invalid value for {section}.{key}: {value:?}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    /// The assembled configuration is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the relay core.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Directory holding one sub-directory per user.
    pub storage_root: PathBuf,

    /// Files above this many bytes are archived and split.
    pub size_threshold: u64,

    /// Size of every part except possibly the last.
    pub part_size: u64,

    /// Wait between consecutive parts of one multi-part delivery.
    pub pacing_interval: Duration,

    /// Maximum age of a stored file before the sweep removes it.
    pub retention_window: Duration,

    /// Period of the retention daemon.
    pub sweep_interval: Duration,

    /// Upper bound on how long a single fetch may block.
    pub fetch_timeout: Duration,

    /// Locators beyond this count in one message are ignored.
    pub max_urls_per_message: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            part_size: DEFAULT_PART_SIZE,
            pacing_interval: Duration::from_secs(DEFAULT_PACING_SECS),
            retention_window: Duration::from_secs(DEFAULT_RETENTION_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_urls_per_message: DEFAULT_MAX_URLS_PER_MESSAGE,
        }
    }
}

impl RelayConfig {
    /// Create a configuration rooted at the given storage directory.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Default::default()
        }
    }

    /// Set the split threshold in bytes.
    pub fn with_size_threshold(mut self, bytes: u64) -> Self {
        self.size_threshold = bytes;
        self
    }

    /// Set the part size in bytes.
    pub fn with_part_size(mut self, bytes: u64) -> Self {
        self.part_size = bytes;
        self
    }

    /// Set the pacing interval between parts.
    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    /// Set the retention window.
    pub fn with_retention_window(mut self, window: Duration) -> Self {
        self.retention_window = window;
        self
    }

    /// Set the sweep period.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set how many locators one message may trigger.
    pub fn with_max_urls_per_message(mut self, max: usize) -> Self {
        self.max_urls_per_message = max;
        self
    }

    /// Reject values the core cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.part_size == 0 {
            return Err(ConfigError::Invalid("part size must be positive".into()));
        }
        if self.size_threshold == 0 {
            return Err(ConfigError::Invalid(
                "size threshold must be positive".into(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "sweep interval must be positive".into(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid("fetch timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Storage root used when neither a file nor the CLI provides one.
///
/// Honors `BASE_DIR`, then falls back to the platform data directory.
pub fn default_storage_root() -> PathBuf {
    if let Some(dir) = std::env::var_os(ROOT_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("filerelay")
}

/// INI-backed configuration loader.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Configuration resolved from the file on top of defaults.
    pub relay: RelayConfig,
}

impl ConfigFile {
    /// Load a configuration file, applying its values over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Load {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut relay = RelayConfig::default();

        if let Some(root) = get(ini, "storage", "root") {
            relay.storage_root = PathBuf::from(root);
        }

        if let Some(v) = get(ini, "relay", "size_threshold") {
            relay.size_threshold = parse_size_value("relay", "size_threshold", v)?;
        }
        if let Some(v) = get(ini, "relay", "part_size") {
            relay.part_size = parse_size_value("relay", "part_size", v)?;
        }
        if let Some(v) = get(ini, "relay", "pacing_secs") {
            relay.pacing_interval = Duration::from_secs(parse_number("relay", "pacing_secs", v)?);
        }
        if let Some(v) = get(ini, "relay", "fetch_timeout_secs") {
            relay.fetch_timeout =
                Duration::from_secs(parse_number("relay", "fetch_timeout_secs", v)?);
        }
        if let Some(v) = get(ini, "relay", "max_urls") {
            relay.max_urls_per_message = parse_number("relay", "max_urls", v)? as usize;
        }

        if let Some(v) = get(ini, "retention", "window_secs") {
            relay.retention_window =
                Duration::from_secs(parse_number("retention", "window_secs", v)?);
        }
        if let Some(v) = get(ini, "retention", "sweep_interval_secs") {
            relay.sweep_interval =
                Duration::from_secs(parse_number("retention", "sweep_interval_secs", v)?);
        }

        Ok(Self { relay })
    }
}

fn get<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))
        .and_then(|props| props.get(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_number(section: &str, key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_size_value(section: &str, key: &str, value: &str) -> Result<u64, ConfigError> {
    parse_size(value).ok_or_else(|| ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse a byte count with an optional binary `KB`/`MB`/`GB` suffix.
pub fn parse_size(value: &str) -> Option<u64> {
    let upper = value.trim().to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Render a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
