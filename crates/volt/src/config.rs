//! Connection settings
//!
//! Supports loading connection settings from (in order of priority):
//! 1. An explicit JSON file
//! 2. `connection.json` in the vmon config directory
//! 3. Runtime environment variables
//! 4. Built-in defaults (localhost:8080, no credentials)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::TimeoutPolicy;
use crate::models::{Credentials, Endpoint, HttpMethod};

/// Settings filename in the vmon config directory
const SETTINGS_FILE: &str = "connection.json";

/// Connection settings for one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub use_encryption: bool,
    pub admin: bool,
    pub method: HttpMethod,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Send a SHA-256 digest of `password` instead of the password itself
    pub hash_password: bool,
    pub standard_timeout_secs: u64,
    pub long_running_timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        let timeouts = TimeoutPolicy::default();
        Self {
            host: "localhost".to_string(),
            port: Endpoint::DEFAULT_PORT,
            use_encryption: false,
            admin: false,
            method: HttpMethod::default(),
            username: None,
            password: None,
            hash_password: true,
            standard_timeout_secs: timeouts.standard.as_secs(),
            long_running_timeout_secs: timeouts.long_running.as_secs(),
        }
    }
}

impl ConnectionSettings {
    /// Load settings using the following priority:
    /// 1. `path`, when given
    /// 2. JSON file (~/.config/vmon/connection.json)
    /// 3. Environment variables over built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        if config::config_exists(SETTINGS_FILE) {
            return config::load_json(SETTINGS_FILE);
        }

        Self::from_env()
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse connection settings JSON")
    }

    /// Build settings from `VMON_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(host) = lookup("VMON_HOST") {
            settings.host = host;
        }
        if let Some(port) = lookup("VMON_PORT") {
            settings.port = port
                .parse()
                .with_context(|| format!("VMON_PORT is not a valid port: {}", port))?;
        }
        if let Some(user) = lookup("VMON_USER") {
            settings.username = Some(user);
        }
        if let Some(password) = lookup("VMON_PASSWORD") {
            settings.password = Some(password);
        }
        if let Some(tls) = lookup("VMON_TLS") {
            settings.use_encryption = parse_flag(&tls);
        }
        if let Some(admin) = lookup("VMON_ADMIN") {
            settings.admin = parse_flag(&admin);
        }

        Ok(settings)
    }

    /// Save settings to the vmon config directory
    pub fn save(&self) -> Result<()> {
        config::save_json(SETTINGS_FILE, self)
    }

    /// Get the default settings file path (~/.config/vmon/connection.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    /// Endpoint described by these settings
    pub fn to_endpoint(&self) -> Endpoint {
        let mut endpoint = Endpoint::new(self.host.clone(), self.port)
            .with_encryption(self.use_encryption)
            .with_admin(self.admin)
            .with_method(self.method);

        if let Some(user) = &self.username {
            let password = self.password.as_deref().unwrap_or_default();
            let credentials = if self.hash_password {
                Credentials::hashed(user.clone(), password)
            } else {
                Credentials::password(user.clone(), password)
            };
            endpoint = endpoint.with_credentials(credentials);
        }

        endpoint
    }

    pub fn timeouts(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            standard: Duration::from_secs(self.standard_timeout_secs),
            long_running: Duration::from_secs(self.long_running_timeout_secs),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
