//! # Configuration
//!
//! Console settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.tale/console.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    /// Style tag name → color name, e.g. `location = "cyan"`.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub output_line_delay: Option<u64>,
    pub do_styles: Option<bool>,
    pub width: Option<usize>,
    pub indent: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_OUTPUT_LINE_DELAY: u64 = 50;
pub const DEFAULT_DO_STYLES: bool = true;
pub const DEFAULT_WIDTH: usize = 72;
pub const DEFAULT_INDENT: usize = 2;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Milliseconds to pause between paced output writes.
    pub output_line_delay: u64,
    pub do_styles: bool,
    pub width: usize,
    pub indent: usize,
    pub colors: BTreeMap<String, String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_line_delay: DEFAULT_OUTPUT_LINE_DELAY,
            do_styles: DEFAULT_DO_STYLES,
            width: DEFAULT_WIDTH,
            indent: DEFAULT_INDENT,
            colors: BTreeMap::new(),
        }
    }
}

/// Values given on the command line. `None` means not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub output_line_delay: Option<u64>,
    pub no_styles: bool,
    pub width: Option<usize>,
    pub indent: Option<usize>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.tale/console.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tale").join("console.toml"))
}

/// Load config from `~/.tale/console.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ConsoleConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ConsoleConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ConsoleConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ConsoleConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ConsoleConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Tale console configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [display]
# output_line_delay = 50    # milliseconds between paced output lines
# do_styles = true          # false prints plain text, tags stripped
# width = 72                # wrap column
# indent = 2                # left margin in spaces

# [colors]
# Recolor a style tag. Values: black, red, green, yellow, blue, magenta,
# cyan, white, grey, dark_grey, bold, dim, underline, reverse.
# location = "cyan"
# item = "yellow"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ConsoleConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], reading environment variables through `env`.
pub fn resolve_with(
    config: &ConsoleConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Delay: CLI → env → config → default
    let output_line_delay = cli
        .output_line_delay
        .or_else(|| env_parsed(&env, "TALE_OUTPUT_LINE_DELAY"))
        .or(config.display.output_line_delay)
        .unwrap_or(DEFAULT_OUTPUT_LINE_DELAY);

    // Styles: --no-styles wins, otherwise env → config → default
    let do_styles = if cli.no_styles {
        false
    } else {
        env("TALE_DO_STYLES")
            .and_then(|v| {
                let flag = parse_flag(&v);
                if flag.is_none() {
                    warn!("Ignoring TALE_DO_STYLES={v:?}: not a boolean");
                }
                flag
            })
            .or(config.display.do_styles)
            .unwrap_or(DEFAULT_DO_STYLES)
    };

    let width = cli
        .width
        .or_else(|| env_parsed(&env, "TALE_WIDTH"))
        .or(config.display.width)
        .unwrap_or(DEFAULT_WIDTH);

    let indent = cli
        .indent
        .or(config.display.indent)
        .unwrap_or(DEFAULT_INDENT);

    ResolvedConfig {
        output_line_delay,
        do_styles,
        width,
        indent,
        colors: config.colors.clone(),
    }
}

fn env_parsed<T: std::str::FromStr>(env: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = env(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {key}={value:?}: not a valid number");
            None
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
