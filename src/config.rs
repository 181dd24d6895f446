//! Runtime configuration.
//!
//! A `key = value` file (path from `WPSPIN_CONFIG`, default
//! `/etc/wpspin.conf`) is read first, then `WPSPIN_*` environment
//! variables override it. CLI flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "/etc/wpspin.conf";
const DEFAULT_INTERFACE: &str = "wlan0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub interface: String,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub timeout: Duration,
    pub delay: Duration,
    pub max_retries: u32,
    pub save_results: bool,
    pub verbose: bool,
    /// Replacement OUI suggestion table; the embedded one when unset.
    pub oui_table: Option<PathBuf>,
    pub vuln_list: PathBuf,
    pub supplicant: String,
    pub pixiewps: String,
}

/// Values as read, before derived paths are resolved.
#[derive(Debug, Default)]
struct Raw {
    interface: Option<String>,
    data_dir: Option<PathBuf>,
    reports_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    delay: Option<Duration>,
    max_retries: Option<u32>,
    save_results: Option<bool>,
    verbose: Option<bool>,
    oui_table: Option<PathBuf>,
    vuln_list: Option<PathBuf>,
    supplicant: Option<String>,
    pixiewps: Option<String>,
}

impl Raw {
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "interface" => self.interface = Some(value.to_string()),
            "data_dir" => self.data_dir = Some(PathBuf::from(value)),
            "reports_dir" => self.reports_dir = Some(PathBuf::from(value)),
            "timeout" => self.timeout = Some(parse_seconds(key, value)?),
            "delay" => self.delay = Some(parse_seconds(key, value)?),
            "max_retries" => {
                self.max_retries = Some(value.parse().map_err(|_| invalid(key, value))?)
            }
            "save_results" => self.save_results = Some(parse_bool(key, value)?),
            "verbose" => self.verbose = Some(parse_bool(key, value)?),
            "oui_table" => self.oui_table = Some(PathBuf::from(value)),
            "vuln_list" => self.vuln_list = Some(PathBuf::from(value)),
            "supplicant" => self.supplicant = Some(value.to_string()),
            "pixiewps" => self.pixiewps = Some(value.to_string()),
            _ => {}
        }
        Ok(())
    }
}

const KEYS: [&str; 12] = [
    "interface",
    "data_dir",
    "reports_dir",
    "timeout",
    "delay",
    "max_retries",
    "save_results",
    "verbose",
    "oui_table",
    "vuln_list",
    "supplicant",
    "pixiewps",
];

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("WPSPIN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Read `path` (a missing file is fine) and apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut raw = Raw::default();

        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    raw.set(key.trim(), value.trim())?;
                }
            }
        }

        // Allow environment variable overrides
        for key in KEYS {
            if let Ok(val) = std::env::var(format!("WPSPIN_{}", key.to_uppercase())) {
                raw.set(key, val.trim())?;
            }
        }

        Ok(Self::resolve(raw))
    }

    fn resolve(raw: Raw) -> Self {
        let data_dir = raw.data_dir.unwrap_or_else(default_data_dir);
        Config {
            interface: raw
                .interface
                .unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
            reports_dir: raw.reports_dir.unwrap_or_else(|| data_dir.join("reports")),
            vuln_list: raw.vuln_list.unwrap_or_else(|| data_dir.join("vulnwsc.txt")),
            timeout: raw
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            delay: raw.delay.unwrap_or(Duration::ZERO),
            max_retries: raw.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            save_results: raw.save_results.unwrap_or(false),
            verbose: raw.verbose.unwrap_or(false),
            oui_table: raw.oui_table,
            supplicant: raw
                .supplicant
                .unwrap_or_else(|| "wpa_supplicant".to_string()),
            pixiewps: raw.pixiewps.unwrap_or_else(|| "pixiewps".to_string()),
            data_dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(Raw::default())
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wpspin")
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Whole or fractional seconds.
fn parse_seconds(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
