//! Configuration schema and loader.
//!
//! Configuration lives in a TOML file (by default `~/.socbot/config.toml`). Every field has a
//! default, so an empty file or no file at all is valid. `${VAR}` references are expanded from
//! the environment before parsing.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub browser: BrowserConfig,
    pub timeouts: TimeoutConfig,
    pub login: LoginConfig,
    pub logging: LoggingConfig,
    pub artifacts: ArtifactsConfig,
}

/// Where the target system lives and how its screens are addressed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,
    /// Name of the child frame the functional screens render into
    pub content_frame: String,
    /// Screen number of "employee transfer"
    pub transfer_screen: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sistema.soc.com.br/WebSoc/".to_string(),
            content_frame: "socframe".to_string(),
            transfer_screen: "232".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    /// Persistent profile name under `~/.socbot/profiles`; temporary profile when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub debugging_port: u16,
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: false,
            profile: None,
            window_width: 1366,
            window_height: 768,
            debugging_port: 9222,
            extra_args: Vec::new(),
        }
    }
}

/// Timeouts and settle delays, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub modal_ms: u64,
    pub element_ms: u64,
    pub frame_ms: u64,
    pub login_bar_ms: u64,
    pub login_icons_ms: u64,
    pub navigation_ms: u64,
    pub action_settle_ms: u64,
    pub transfer_load_ms: u64,
    pub edit_mode_ms: u64,
    pub popup_ms: u64,
    pub probe_interval_ms: u64,
    pub dialog_interval_ms: u64,
    pub home_settle_ms: u64,
    pub poll_interval_ms: u64,
    /// Growth factor of the poll interval after each unsuccessful poll; 1.0 keeps it fixed
    pub poll_backoff: f64,
    pub poll_max_interval_ms: u64,
    pub script_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            modal_ms: 2_000,
            element_ms: 10_000,
            frame_ms: 10_000,
            login_bar_ms: 10_000,
            login_icons_ms: 5_000,
            navigation_ms: 3_000,
            action_settle_ms: 2_000,
            transfer_load_ms: 5_000,
            edit_mode_ms: 3_000,
            popup_ms: 3_000,
            probe_interval_ms: 2_000,
            dialog_interval_ms: 1_000,
            home_settle_ms: 3_000,
            poll_interval_ms: 250,
            poll_backoff: 1.5,
            poll_max_interval_ms: 1_000,
            script_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Submissions before giving up. Kept low: repeated bad credentials lock the account.
    pub max_attempts: u32,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_prefix: "soc_automation".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub screenshot_dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("screenshots"),
        }
    }
}

impl Config {
    /// Check values a run cannot work without
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.target.base_url).map_err(|e| {
            Error::InvalidConfig(format!(
                "target.base_url '{}' is not a valid URL: {}",
                self.target.base_url, e
            ))
        })?;

        if self.target.content_frame.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "target.content_frame must not be empty".to_string(),
            ));
        }

        if self.target.transfer_screen.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "target.transfer_screen must not be empty".to_string(),
            ));
        }

        if self.login.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "login.max_attempts must be at least 1".to_string(),
            ));
        }

        let timeouts = &self.timeouts;
        if timeouts.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "timeouts.poll_interval_ms must be at least 1".to_string(),
            ));
        }

        if !timeouts.poll_backoff.is_finite() || timeouts.poll_backoff < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "timeouts.poll_backoff must be 1.0 or more, got {}",
                timeouts.poll_backoff
            )));
        }

        if timeouts.poll_max_interval_ms < timeouts.poll_interval_ms {
            return Err(Error::InvalidConfig(
                "timeouts.poll_max_interval_ms must not be below poll_interval_ms".to_string(),
            ));
        }

        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(Error::InvalidConfig(
                "browser window size must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn timings(&self) -> Timings {
        Timings::from(&self.timeouts)
    }
}

/// [`TimeoutConfig`] resolved into durations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub modal: Duration,
    pub element: Duration,
    pub frame: Duration,
    pub login_bar: Duration,
    pub login_icons: Duration,
    pub navigation: Duration,
    pub action_settle: Duration,
    pub transfer_load: Duration,
    pub edit_mode: Duration,
    pub popup: Duration,
    pub probe_interval: Duration,
    pub dialog_interval: Duration,
    pub home_settle: Duration,
    pub poll_interval: Duration,
    pub poll_backoff: f64,
    pub poll_max_interval: Duration,
    pub script: Duration,
}

impl Timings {
    /// Every wait polls once and every settle delay is skipped
    pub fn instant() -> Self {
        Self {
            modal: Duration::ZERO,
            element: Duration::ZERO,
            frame: Duration::ZERO,
            login_bar: Duration::ZERO,
            login_icons: Duration::ZERO,
            navigation: Duration::ZERO,
            action_settle: Duration::ZERO,
            transfer_load: Duration::ZERO,
            edit_mode: Duration::ZERO,
            popup: Duration::ZERO,
            probe_interval: Duration::ZERO,
            dialog_interval: Duration::ZERO,
            home_settle: Duration::ZERO,
            poll_interval: Duration::ZERO,
            poll_backoff: 1.0,
            poll_max_interval: Duration::ZERO,
            script: Duration::from_secs(30),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for Timings {
    fn from(config: &TimeoutConfig) -> Self {
        let ms = Duration::from_millis;
        Self {
            modal: ms(config.modal_ms),
            element: ms(config.element_ms),
            frame: ms(config.frame_ms),
            login_bar: ms(config.login_bar_ms),
            login_icons: ms(config.login_icons_ms),
            navigation: ms(config.navigation_ms),
            action_settle: ms(config.action_settle_ms),
            transfer_load: ms(config.transfer_load_ms),
            edit_mode: ms(config.edit_mode_ms),
            popup: ms(config.popup_ms),
            probe_interval: ms(config.probe_interval_ms),
            dialog_interval: ms(config.dialog_interval_ms),
            home_settle: ms(config.home_settle_ms),
            poll_interval: ms(config.poll_interval_ms),
            poll_backoff: config.poll_backoff,
            poll_max_interval: ms(config.poll_max_interval_ms),
            script: ms(config.script_ms),
        }
    }
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader;

impl ConfigLoader {
    /// `~/.socbot`, falling back to a relative `.socbot` without a home directory
    pub fn socbot_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".socbot"))
            .unwrap_or_else(|| PathBuf::from(".socbot"))
    }

    pub fn default_path() -> PathBuf {
        Self::socbot_dir().join("config.toml")
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        let config = Self::load_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load and validate configuration from a string
    pub fn load_str(content: &str) -> Result<Config> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path must exist; otherwise the default path is used when present
    pub fn resolve(explicit: Option<&Path>) -> Result<Config> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    tracing::debug!(
                        "No config at {}, using defaults",
                        default_path.display()
                    );
                    Ok(Config::default())
                }
            }
        }
    }

    /// Write the default configuration, refusing to overwrite unless `force`
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(Error::InvalidConfig(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, Config::default().to_toml_string()?)?;
        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`
    fn expand_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| Error::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &value);
        }

        Ok(result)
    }
}
