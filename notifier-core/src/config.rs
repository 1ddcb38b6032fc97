use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::geo::{DEFAULT_CITY, GeoProviderId};

pub const ENV_OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_FROM_EMAIL: &str = "FROM_EMAIL";
pub const ENV_SMTP_PASSWORD: &str = "SMTP_PASSWORD";

/// Mail relay section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub from_email: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            from_email: None,
            password: None,
            host: default_smtp_host(),
            port: default_smtp_port(),
        }
    }
}

/// Fully resolved relay settings handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub from_email: String,
    pub password: String,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// openweather_api_key = "..."
/// default_city = "Mumbai"
/// geo_providers = ["ipapi.co", "ip-api.com"]
///
/// [smtp]
/// from_email = "me@gmail.com"
/// password = "app password"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub openweather_api_key: Option<String>,

    #[serde(default)]
    pub smtp: SmtpConfig,

    /// City used when no usable IP is given or geolocation fails.
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Geolocation providers, tried in this order.
    #[serde(default = "default_geo_providers")]
    pub geo_providers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            smtp: SmtpConfig::default(),
            default_city: default_city(),
            geo_providers: default_geo_providers(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

fn default_geo_providers() -> Vec<String> {
    GeoProviderId::all().iter().map(|id| id.as_str().to_string()).collect()
}

impl Config {
    /// Load config from the platform config dir, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path`, or return defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-notifier", "weather-notifier")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override secrets from `lookup`; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = get(ENV_OPENWEATHER_API_KEY) {
            self.openweather_api_key = Some(key);
        }
        if let Some(from) = get(ENV_FROM_EMAIL) {
            self.smtp.from_email = Some(from);
        }
        if let Some(password) = get(ENV_SMTP_PASSWORD) {
            self.smtp.password = Some(password);
        }
    }

    pub fn openweather_api_key(&self) -> Result<&str> {
        self.openweather_api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weather-notifier configure` or set {ENV_OPENWEATHER_API_KEY}."
            )
        })
    }

    pub fn smtp_settings(&self) -> Result<SmtpSettings> {
        let from_email = self.smtp.from_email.clone().ok_or_else(|| {
            anyhow!(
                "No sender address configured.\n\
                 Hint: run `weather-notifier configure` or set {ENV_FROM_EMAIL}."
            )
        })?;

        let password = self.smtp.password.clone().ok_or_else(|| {
            anyhow!(
                "No SMTP password configured.\n\
                 Hint: run `weather-notifier configure` or set {ENV_SMTP_PASSWORD}."
            )
        })?;

        Ok(SmtpSettings {
            host: self.smtp.host.clone(),
            port: self.smtp.port,
            from_email,
            password,
        })
    }

    /// Geolocation providers as strongly-typed ids, in configured order.
    pub fn geo_provider_ids(&self) -> Result<Vec<GeoProviderId>> {
        self.geo_providers
            .iter()
            .map(|s| GeoProviderId::try_from(s.as_str()))
            .collect()
    }
}
