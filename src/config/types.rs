//! Provider configuration types.

use crate::error::ProviderError;
use crate::logging::LoggingConfig;
use crate::script::ScriptLimits;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Directory scripts and schemas are read from when none is configured.
pub const DEFAULT_SCRIPT_DIR: &str = "/etc/acton/scripts";

/// Timeout in seconds for actions whose schema declares none.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Largest accepted default timeout in seconds (one day).
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Root configuration structure.
///
/// Maps directly to the TOML configuration file:
///
/// ```toml
/// script_dir = "/etc/acton/scripts"
/// schema_dirs = ["/etc/acton/scripts", "/usr/share/acton/schemas"]
/// default_timeout_secs = 10
///
/// [limits]
/// max_operations = 1000000
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Root of the `<agent>/<action>.rhai` script tree.
    pub script_dir: PathBuf,

    /// Directories scanned for `<agent>/<action>.json` schema files, in
    /// priority order.
    pub schema_dirs: Vec<PathBuf>,

    /// Timeout applied to actions whose schema declares none.
    pub default_timeout_secs: u64,

    /// Interpreter resource limits.
    pub limits: ScriptLimits,

    /// File logging.
    pub logging: LoggingConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from(DEFAULT_SCRIPT_DIR),
            schema_dirs: vec![PathBuf::from(DEFAULT_SCRIPT_DIR)],
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            limits: ScriptLimits::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the script directory.
    #[must_use]
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    /// Replaces the schema directories.
    #[must_use]
    pub fn with_schema_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.schema_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default action timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the interpreter limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Returns the default action timeout.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the script directory is empty, the
    /// default timeout is zero or above [`MAX_TIMEOUT_SECS`], or the log
    /// filter does not parse.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.script_dir.as_os_str().is_empty() {
            return Err(ProviderError::configuration(
                "script_dir",
                "cannot be empty; set it to the root of the script tree",
            ));
        }

        if self.default_timeout_secs == 0 {
            return Err(ProviderError::configuration(
                "default_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.default_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ProviderError::configuration(
                "default_timeout_secs",
                format!("must be at most {MAX_TIMEOUT_SECS}"),
            ));
        }

        if self.schema_dirs.iter().any(|dir| dir.as_os_str().is_empty()) {
            return Err(ProviderError::configuration(
                "schema_dirs",
                "entries cannot be empty",
            ));
        }

        if let Err(e) = self.logging.env_filter() {
            return Err(ProviderError::configuration("logging.filter", e.to_string()));
        }

        Ok(())
    }
}
