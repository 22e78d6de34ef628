//! Console configuration.
//!
//! Read once at process start and passed down explicitly. Layers, lowest
//! precedence first: built-in defaults, `console.toml` in the user config
//! directory, `ROLLOUT_*` environment variables. Front-ends apply their own
//! command-line overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub const ENV_BASE_URL: &str = "ROLLOUT_API_BASE_URL";
pub const ENV_API_KEY: &str = "ROLLOUT_API_KEY";
pub const ENV_DEMO_MODE: &str = "ROLLOUT_DEMO_MODE";

/// Effective configuration handed to every component.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub base_url: Url,
    /// Sent as `X-API-Key` when present.
    pub api_key: Option<String>,
    pub demo_mode: bool,
    pub poll_interval: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: None,
            demo_mode: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// On-disk shape of `console.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub demo_mode: Option<bool>,
    pub poll_interval_secs: Option<u64>,
}

impl ConsoleConfig {
    /// Load from the default config file location and the process environment.
    pub fn load() -> anyhow::Result<Self> {
        let file = match default_config_path() {
            Some(path) => read_config_file(&path)?,
            None => None,
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge an optional file layer and an environment lookup over the defaults.
    pub fn resolve(
        file: Option<ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(file) = file {
            if let Some(base_url) = file.base_url {
                config.set_base_url(&base_url)?;
            }
            if file.api_key.is_some() {
                config.api_key = file.api_key;
            }
            if let Some(demo) = file.demo_mode {
                config.demo_mode = demo;
            }
            if let Some(secs) = file.poll_interval_secs {
                if secs == 0 {
                    anyhow::bail!("poll_interval_secs must be greater than zero");
                }
                config.poll_interval = Duration::from_secs(secs);
            }
        }

        if let Some(base_url) = env(ENV_BASE_URL) {
            config.set_base_url(&base_url)?;
        }
        if let Some(key) = env(ENV_API_KEY) {
            config.api_key = Some(key);
        }
        if let Some(flag) = env(ENV_DEMO_MODE) {
            config.demo_mode = parse_flag(&flag)
                .with_context(|| format!("Invalid value for {}: {}", ENV_DEMO_MODE, flag))?;
        }

        config.api_key = config.api_key.filter(|key| !key.trim().is_empty());
        Ok(config)
    }

    pub fn set_base_url(&mut self, raw: &str) -> anyhow::Result<()> {
        self.base_url =
            Url::parse(raw.trim()).with_context(|| format!("Invalid base URL: {}", raw))?;
        Ok(())
    }
}

/// `<config_dir>/rollout/console.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rollout").join("console.toml"))
}

/// Read and parse a config file; a missing file is not an error.
pub fn read_config_file(path: &Path) -> anyhow::Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(Some(file))
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}
