use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::ConfigError;

/// Hosted SmartSpend deployment
const DEFAULT_API_URL: &str = "https://smartspend.streamlit.app";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Overrides where the store lives; relative paths resolve against
    /// `working_dir`. Unset means the per-user data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the categorization service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout for categorize/query calls; none by default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default)]
    pub debug: bool,
}

fn default_working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("smartspend"))
        .or_else(|| dirs::home_dir().map(|h| h.join(".smartspend")))
        .unwrap_or_else(|| PathBuf::from(".smartspend"))
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_probe_timeout() -> u64 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            data_dir: None,
            api_url: default_api_url(),
            request_timeout_secs: None,
            probe_timeout_secs: default_probe_timeout(),
            debug: false,
        }
    }
}

pub fn load_config(working_dir: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let wd = working_dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let global_path = dirs::config_dir().map(|d| d.join("smartspend").join("config.json"));

    let mut config = load_config_from(global_path.as_deref(), wd)?;
    detect_api_url(&mut config);

    Ok(config)
}

/// Defaults, then the global file (if given), then `smartspend.json` in the
/// working directory. Reads no environment variables.
pub fn load_config_from(
    global_path: Option<&Path>,
    working_dir: PathBuf,
) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig {
        working_dir: working_dir.clone(),
        ..AppConfig::default()
    };

    if let Some(path) = global_path {
        if let Some(file_config) = read_config_file(path)? {
            merge_config(&mut config, file_config);
        }
    }

    // Project-local config
    if let Some(file_config) = read_config_file(&working_dir.join("smartspend.json"))? {
        merge_config(&mut config, file_config);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File(e.to_string()))?;
    let file_config: AppConfig = serde_json::from_str(&content)
        .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))?;
    Ok(Some(file_config))
}

fn merge_config(base: &mut AppConfig, overlay: AppConfig) {
    if overlay.data_dir.is_some() {
        base.data_dir = overlay.data_dir;
    }
    if overlay.api_url != default_api_url() {
        base.api_url = overlay.api_url;
    }
    if overlay.request_timeout_secs.is_some() {
        base.request_timeout_secs = overlay.request_timeout_secs;
    }
    if overlay.probe_timeout_secs != default_probe_timeout() {
        base.probe_timeout_secs = overlay.probe_timeout_secs;
    }
    if overlay.debug {
        base.debug = true;
    }
}

fn detect_api_url(config: &mut AppConfig) {
    if let Ok(url) = std::env::var("SMARTSPEND_API_URL") {
        if !url.is_empty() {
            config.api_url = url;
        }
    }
}

impl AppConfig {
    /// Directory holding the SQLite store. Shared by every working directory
    /// unless `data_dir` is set.
    pub fn data_path(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => self.working_dir.join(dir),
            None => default_data_path(),
        }
    }

    /// API URL without a trailing slash, ready for path joins.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
