// Configuration management for rback
// Supports CLI arguments, config file (TOML), and environment variables

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use crate::error::{AppError, AppResult};
use crate::report::ReportFormat;
use crate::routes::archive::{normalize_archive_path, DEFAULT_ARCHIVE_NAME};
use crate::routes::parser::CaptureOptions;

/// rback - back up the IPv4 routing table to an archive and read it back
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rback")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Export the routing table to the archive
    #[arg(long)]
    pub export: bool,

    /// Read an archive and report its routes (the live table is not changed)
    #[arg(long)]
    pub import: bool,

    /// Archive path; ".rback" is appended when missing [default: ./archive.rback]
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, env = "RBACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "RBACK_LOG")]
    pub log_level: Option<String>,

    /// Seconds to wait for the routing table command
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Routing table capture settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Command that prints the IPv4 routing table in numeric form
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_command_args")]
    pub args: Vec<String>,

    /// Leading lines of output that are not routes
    #[serde(default = "default_header_lines")]
    pub header_lines: usize,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_command() -> String {
    "route".to_string()
}
fn default_command_args() -> Vec<String> {
    vec!["-n".to_string()]
}
fn default_header_lines() -> usize {
    2
}
fn default_timeout_seconds() -> u64 {
    10
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            command: default_command(),
            args: default_command_args(),
            header_lines: default_header_lines(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl From<CaptureConfig> for CaptureOptions {
    fn from(capture: CaptureConfig) -> Self {
        CaptureOptions {
            command: capture.command,
            args: capture.args,
            header_lines: capture.header_lines,
            timeout: Duration::from_secs(capture.timeout_seconds),
        }
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        CaptureConfig::default().into()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Export,
    Import,
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when neither mode was requested
    pub mode: Option<Mode>,
    pub archive_path: PathBuf,
    pub log_level: Level,
    pub capture: CaptureOptions,
    pub report_format: ReportFormat,
    /// Config file that was loaded, if any
    pub config_source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Config file > Defaults
    pub fn load(cli_args: CliArgs) -> AppResult<Self> {
        let mode = resolve_mode(cli_args.export, cli_args.import)?;
        let (config_file, config_source) =
            load_config_file(cli_args.config.as_deref()).map_err(|e| AppError::Config(format!("{:#}", e)))?;
        let cwd = std::env::current_dir()
            .map_err(|e| AppError::io("current working directory", e))?;

        let mut config = Self::merge(mode, cli_args, config_file, &cwd)?;
        config.config_source = config_source;
        Ok(config)
    }

    fn merge(mode: Option<Mode>, cli_args: CliArgs, config_file: ConfigFile, cwd: &Path) -> AppResult<Self> {
        let archive_path = resolve_archive_path(cli_args.file.as_deref(), cwd);

        let log_level = cli_args
            .log_level
            .as_deref()
            .unwrap_or(config_file.logging.level.as_str());
        let log_level = parse_log_level(log_level)?;

        let timeout_seconds = cli_args
            .timeout
            .unwrap_or(config_file.capture.timeout_seconds);
        if timeout_seconds == 0 {
            return Err(AppError::Config("timeout must be at least one second".to_string()));
        }

        let mut capture = CaptureOptions::from(config_file.capture);
        capture.timeout = Duration::from_secs(timeout_seconds);

        let report_format = if cli_args.json {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        };

        Ok(Config {
            mode,
            archive_path,
            log_level,
            capture,
            report_format,
            config_source: None,
        })
    }
}

/// Export and import are mutually exclusive
pub fn resolve_mode(export: bool, import: bool) -> AppResult<Option<Mode>> {
    match (export, import) {
        (true, true) => Err(AppError::Usage(
            "choose to import or export route data, not both".to_string(),
        )),
        (true, false) => Ok(Some(Mode::Export)),
        (false, true) => Ok(Some(Mode::Import)),
        (false, false) => Ok(None),
    }
}

/// `-f` paths get the archive extension; otherwise the default archive
/// name in the working directory is used.
pub fn resolve_archive_path(file: Option<&Path>, cwd: &Path) -> PathBuf {
    match file {
        Some(path) => normalize_archive_path(path),
        None => cwd.join(DEFAULT_ARCHIVE_NAME),
    }
}

/// Returns the parsed file and where it came from. Runs before logging is
/// set up, so the caller logs the source.
fn load_config_file(path: Option<&Path>) -> anyhow::Result<(ConfigFile, Option<PathBuf>)> {
    if let Some(config_path) = path {
        let config_file = read_config_file(config_path)?;
        return Ok((config_file, Some(config_path.to_path_buf())));
    }

    // Try loading from the default location
    let default_path = PathBuf::from("rback.toml");
    if default_path.exists() {
        let config_file = read_config_file(&default_path)?;
        return Ok((config_file, Some(default_path)));
    }

    Ok((ConfigFile::default(), None))
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str::<ConfigFile>(&content)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_log_level(level_str: &str) -> AppResult<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(AppError::Config(format!("Invalid log level: {}", level_str))),
    }
}
