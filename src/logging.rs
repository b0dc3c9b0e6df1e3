//! Optional file logging.
//!
//! Dispatch outcomes are always emitted through `tracing`. With
//! `[logging] enabled = true`, [`Provider`](crate::provider::Provider)
//! installs a subscriber at construction that writes them to a rolling
//! file. A process that already installed its own subscriber keeps it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Base name of log files and of the default log directory.
pub const DEFAULT_LOG_NAME: &str = "acton-script-agents";

/// Keeps the non-blocking writer flushing for the life of the process.
static WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// File logging settings.
///
/// Without `log_dir`, files go to `~/.local/share/acton-script-agents/logs/`.
///
/// ```toml
/// [logging]
/// enabled = true
/// level = "debug"
/// rotation = "hourly"
/// filter = "acton_script_agents::script=trace"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Install the file subscriber.
    pub enabled: bool,
    /// Files are named `{file_name}.log` plus a rotation suffix.
    pub file_name: String,
    /// Directory to write to instead of the XDG data dir.
    pub log_dir: Option<PathBuf>,
    /// Level for targets the filter does not mention.
    pub level: LogLevel,
    /// Extra `EnvFilter` directives.
    pub filter: Option<String>,
    /// How often a new file is started.
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file_name: DEFAULT_LOG_NAME.to_string(),
            log_dir: None,
            level: LogLevel::default(),
            filter: None,
            rotation: LogRotation::default(),
        }
    }
}

impl LoggingConfig {
    /// Creates a disabled configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a disabled configuration.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Creates an enabled configuration writing into `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            log_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Sets the log file base name.
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Sets the default level.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets extra filter directives.
    #[must_use]
    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = Some(directives.into());
        self
    }

    /// Sets the rotation period.
    #[must_use]
    pub fn with_rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builds the subscriber filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter directives do not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let directives = self.filter.as_deref().unwrap_or_default();
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .parse(directives)
            .map_err(|e| LoggingError::invalid_filter(directives, e.to_string()))
    }

    /// Returns the directory log files are written to.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the XDG data
    /// directory is unknown.
    pub fn resolve_log_dir(&self) -> Result<PathBuf, LoggingError> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join(DEFAULT_LOG_NAME).join("logs"))
                .ok_or_else(|| LoggingError::new(LoggingErrorKind::NoLogDir)),
        }
    }
}

/// Default log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-operation script output
    Trace,
    /// Dispatch state changes
    Debug,
    /// Completed dispatches and registration
    #[default]
    Info,
    /// Skipped schemas and refused transitions
    Warn,
    /// Aborted dispatches
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// A new file every hour
    Hourly,
    /// A new file every day
    #[default]
    Daily,
    /// A single file
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

/// Error raised while installing file logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingError {
    /// What went wrong.
    pub kind: LoggingErrorKind,
}

/// Kinds of [`LoggingError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingErrorKind {
    /// No log directory is configured and the XDG data dir is unknown.
    NoLogDir,
    /// The log directory or file could not be created.
    Unwritable {
        /// Directory involved
        path: PathBuf,
        /// Underlying error
        reason: String,
    },
    /// The filter directives do not parse.
    InvalidFilter {
        /// The rejected directives
        directives: String,
        /// Parser message
        reason: String,
    },
}

impl LoggingError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: LoggingErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an error for a directory that cannot be written.
    #[must_use]
    pub fn unwritable(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::new(LoggingErrorKind::Unwritable {
            path,
            reason: reason.into(),
        })
    }

    /// Creates an error for directives that do not parse.
    #[must_use]
    pub fn invalid_filter(directives: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(LoggingErrorKind::InvalidFilter {
            directives: directives.into(),
            reason: reason.into(),
        })
    }
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LoggingErrorKind::NoLogDir => write!(
                f,
                "no log directory available; set logging.log_dir or XDG_DATA_HOME"
            ),
            LoggingErrorKind::Unwritable { path, reason } => write!(
                f,
                "cannot write logs to '{}': {}; check the directory permissions",
                path.display(),
                reason
            ),
            LoggingErrorKind::InvalidFilter { directives, reason } => write!(
                f,
                "invalid log filter '{}': {}; use directives like 'target=level'",
                directives, reason
            ),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Installs the file subscriber described by `config`.
///
/// Returns `Ok(true)` if it was installed. Returns `Ok(false)` when logging
/// is disabled, when an earlier call already installed it, or when the
/// process has a global subscriber of its own.
///
/// # Errors
///
/// Returns an error if the filter does not parse or the log directory
/// cannot be written.
pub fn install(config: &LoggingConfig) -> Result<bool, LoggingError> {
    if !config.enabled || WRITER_GUARD.get().is_some() {
        return Ok(false);
    }

    let filter = config.env_filter()?;
    let dir = config.resolve_log_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LoggingError::unwritable(dir.clone(), e.to_string()))?;

    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(&config.file_name)
        .filename_suffix("log")
        .build(&dir)
        .map_err(|e| LoggingError::unwritable(dir.clone(), e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .with(filter)
        .try_init();

    if let Err(e) = installed {
        tracing::debug!(error = %e, "Keeping the existing tracing subscriber");
        return Ok(false);
    }

    let _ = WRITER_GUARD.set(guard);
    tracing::info!(dir = %dir.display(), file = %config.file_name, "File logging installed");
    Ok(true)
}
