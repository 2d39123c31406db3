use client_core::AppError;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub backend: BackendSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BackendSettings {
    /// Base URL of the question-answering backend. Trailing slashes are ignored.
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl BackendSettings {
    pub fn base_url(&self) -> Result<Url, AppError> {
        let trimmed = self.url.trim().trim_end_matches('/');
        Url::parse(trimmed)
            .map_err(|e| AppError::Config(anyhow::anyhow!("Invalid backend url {}: {}", self.url, e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct UploadSettings {
    #[serde(default = "default_max_batch_bytes")]
    pub max_batch_bytes: u64,
    /// Granularity of progress reporting while the multipart body is streamed.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_max_batch_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_chunk_size() -> usize {
    64 * 1024
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_batch_bytes: default_max_batch_bytes(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct NotificationSettings {
    /// How long the login outcome stays on screen before navigating away.
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,
    #[serde(default = "default_signup_delay_ms")]
    pub signup_delay_ms: u64,
}

fn default_login_delay_ms() -> u64 {
    5000
}

fn default_signup_delay_ms() -> u64 {
    2000
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            login_delay_ms: default_login_delay_ms(),
            signup_delay_ms: default_signup_delay_ms(),
        }
    }
}

impl NotificationSettings {
    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }

    pub fn signup_delay(&self) -> Duration {
        Duration::from_millis(self.signup_delay_ms)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// OTLP collector endpoint (e.g. http://tempo:4317). Export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_json")]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otlp_endpoint: None,
            json: default_json(),
        }
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let base_path = std::env::current_dir()?;

    // Run either from the workspace root or from inside docqa-frontend
    let configuration_directory = if base_path.ends_with("docqa-frontend") {
        base_path.join("config")
    } else {
        base_path.join("docqa-frontend").join("config")
    };

    client_core::config::load_layered(&configuration_directory)
}
