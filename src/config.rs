//! Configuration file handling for photobooth-kiosk.
//!
//! Loads configuration from `~/.config/photobooth-kiosk/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{default_device, default_input_format, FfmpegSettings};
use crate::print::{Printer, DEFAULT_PRINT_COMMAND};
use crate::selection::{Catalog, Character, DEFAULT_DEBOUNCE};
use crate::swap::{
    PollSettings, ResultCache, DEFAULT_CACHE_MAX_MB, DEFAULT_SERVER_URL, SERVER_URL_ENV,
};

/// Configuration file structure for photobooth-kiosk.
/// Loaded from ~/.config/photobooth-kiosk/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub print: PrintConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub characters: Vec<Character>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    /// Origin the kiosk is served from, checked before opening the camera.
    pub origin: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CameraConfig {
    pub input_format: Option<String>,
    pub device: Option<String>,
    pub ffmpeg: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PrintConfig {
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_size_mb: default_max_size_mb(),
        }
    }
}

fn default_interval_ms() -> u64 {
    PollSettings::default().interval.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    PollSettings::default().max_attempts
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

fn default_max_size_mb() -> u64 {
    DEFAULT_CACHE_MAX_MB
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Service base URL: `PHOTOBOOTH_SERVER_URL`, then the file, then the default.
    pub fn server_url(&self) -> String {
        self.server_url_with(std::env::var(SERVER_URL_ENV).ok())
    }

    fn server_url_with(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.server.base_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.server.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.polling.interval_ms),
            max_attempts: self.polling.max_attempts.max(1),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.selection.debounce_ms)
    }

    /// Configured characters, or the built-in set when none are listed.
    pub fn catalog(&self) -> Catalog {
        if self.characters.is_empty() {
            Catalog::default()
        } else {
            Catalog::new(self.characters.clone())
        }
    }

    pub fn ffmpeg_settings(&self) -> FfmpegSettings {
        FfmpegSettings {
            ffmpeg: self
                .camera
                .ffmpeg
                .clone()
                .unwrap_or_else(|| "ffmpeg".to_string()),
            input_format: self
                .camera
                .input_format
                .clone()
                .unwrap_or_else(|| default_input_format().to_string()),
            device: self
                .camera
                .device
                .clone()
                .unwrap_or_else(|| default_device().to_string()),
        }
    }

    pub fn printer(&self) -> Printer {
        Printer::new(
            self.print
                .command
                .clone()
                .unwrap_or_else(|| DEFAULT_PRINT_COMMAND.to_string()),
            self.print.args.clone(),
        )
    }

    pub fn result_cache(&self) -> ResultCache {
        match &self.cache.dir {
            Some(dir) => ResultCache::new(dir.clone()),
            None => ResultCache::with_default_dir(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("photobooth-kiosk")
        .join("config.toml")
}

/// Contents written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# photobooth-kiosk configuration

[server]
# Face-swap service (PHOTOBOOTH_SERVER_URL overrides this)
base_url = "http://localhost:5000"
# Origin the kiosk is served from; camera access warns when not HTTPS/localhost
# origin = "https://booth.example.com"
# Overall per-request timeout in seconds (default: none)
# request_timeout_secs = 60

[polling]
# Delay between status checks
interval_ms = 2000
# Status checks before giving up
max_attempts = 60

[selection]
# Wait after a pick before submitting
debounce_ms = 500

[camera]
# ffmpeg = "ffmpeg"
# input_format = "avfoundation"
# device = "0"

[print]
command = "lp"
# args = ["-d", "booth_printer"]

[cache]
# dir = "/var/cache/photobooth-kiosk"
max_size_mb = 200

# Leave empty to use the built-in characters.
# [[characters]]
# id = "superman"
# name = "Superman"
"#;
