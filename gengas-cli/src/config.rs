use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use streams_resolver::{
    directory::{HttpConfig, ProxyConfig},
    extractor::{
        FormatPreference, RetryPolicy, YtDlpConfig,
        tool::{DEFAULT_FORMAT_SELECTOR, DEFAULT_PROGRAM},
    },
};

const APP_NAME: &str = "gengas";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default output format
    pub default_output_format: String,

    /// Remote channel directory (JSON), tried first
    pub directory_url: Option<String>,

    /// Bundled channel directory used when the remote one is unavailable
    pub directory_path: Option<PathBuf>,

    /// How long a loaded directory is reused, in seconds
    pub cache_ttl: u64,

    /// Extraction tool program, e.g. `yt-dlp` or `python3`
    pub extractor_program: String,

    /// Arguments placed before the tool's own flags, e.g. `["-m", "yt_dlp"]`
    pub extractor_args: Vec<String>,

    /// yt-dlp format selector
    pub format_selector: String,

    /// Prefer free container formats when several are equally good
    pub prefer_free_formats: bool,

    /// Extra request headers for the extraction tool, as `name:value`
    pub extractor_headers: Vec<String>,

    /// Extraction timeout in seconds
    pub extraction_timeout: u64,

    /// Retries for transient extraction failures
    pub retries: u32,

    /// Delay before the first retry, in milliseconds
    pub retry_backoff_ms: u64,

    /// Address the HTTP endpoint binds to
    pub host: String,

    /// Port of the HTTP endpoint
    pub port: u16,

    /// User agent string for directory requests
    pub user_agent: Option<String>,

    /// Enable colored output
    pub colored_output: bool,

    /// Default proxy URL (supports http, https, socks5)
    pub default_proxy: Option<String>,

    /// Default proxy username (if proxy requires authentication)
    pub default_proxy_username: Option<String>,

    /// Default proxy password (if proxy requires authentication)
    pub default_proxy_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_output_format: "pretty".to_string(),
            directory_url: None,
            directory_path: Some(PathBuf::from("channels.json")),
            cache_ttl: 6 * 60 * 60,
            extractor_program: DEFAULT_PROGRAM.to_string(),
            extractor_args: vec![],
            format_selector: DEFAULT_FORMAT_SELECTOR.to_string(),
            prefer_free_formats: true,
            extractor_headers: vec![
                "referer:youtube.com".to_string(),
                "user-agent:googlebot".to_string(),
            ],
            extraction_timeout: 10,
            retries: 1,
            retry_backoff_ms: 500,
            host: "0.0.0.0".to_string(),
            port: 5000,
            user_agent: None,
            colored_output: true,
            default_proxy: None,
            default_proxy_username: None,
            default_proxy_password: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                if path.exists() {
                    let content = std::fs::read_to_string(path)
                        .context("Failed to read configuration file")?;
                    toml::from_str(&content).context("Failed to parse configuration file")
                } else {
                    Ok(Self::default())
                }
            }
            None => confy::load(APP_NAME, None).context("Failed to load configuration"),
        }
    }

    /// Get default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, None).ok()
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, toml_string).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Reset configuration to defaults and save
    pub fn reset(config_path: Option<&Path>) -> Result<()> {
        let path = config_path
            .map(|p| p.to_path_buf())
            .or_else(Self::default_config_path)
            .context("No configuration path available")?;

        Self::default().save(&path)
    }

    /// Show current configuration as a formatted string
    pub fn show(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration for display")
    }

    pub fn extractor_config(&self) -> YtDlpConfig {
        YtDlpConfig {
            program: self.extractor_program.clone(),
            leading_args: self.extractor_args.clone(),
            headers: self.extractor_headers.clone(),
            timeout: Duration::from_secs(self.extraction_timeout),
        }
    }

    pub fn format_preference(&self) -> FormatPreference {
        FormatPreference {
            selector: self.format_selector.clone(),
            prefer_free_formats: self.prefer_free_formats,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn proxy_config(&self) -> Option<ProxyConfig> {
        self.default_proxy.as_ref().map(|url| ProxyConfig {
            url: url.clone(),
            username: self.default_proxy_username.clone(),
            password: self.default_proxy_password.clone(),
        })
    }

    pub fn http_config(&self) -> HttpConfig {
        let mut config = HttpConfig {
            proxy: self.proxy_config(),
            ..HttpConfig::default()
        };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }
}
