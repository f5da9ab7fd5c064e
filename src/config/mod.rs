use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub mod credentials;

pub use credentials::Credential;

use crate::translate::PollPolicy;
use crate::{Result, SubtitlrError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcription API settings
    pub openai: OpenAiConfig,

    /// Document translation API settings
    pub deepl: DeeplConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Base URL of the API, without the endpoint path
    pub base_url: String,

    /// Transcription model
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeeplConfig {
    /// Base URL override; picked from the key type when unset
    pub base_url: Option<String>,

    /// Client identifier sent with every request
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Shortest wait between two status checks
    pub poll_interval_secs: u64,

    /// Longest wait between two status checks
    pub max_poll_interval_secs: u64,

    /// Give up on a translation job after this long
    pub max_wait_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parent directory for per-run working directories
    pub temp_dir: Option<PathBuf>,

    /// Video downloader executable
    pub downloader: String,

    /// Audio converter executable
    pub converter: String,

    /// Timeout for each external process in seconds
    pub process_timeout_secs: u64,

    /// Dotfile holding the transcription API key
    pub credential_file: PathBuf,

    /// Show progress spinners
    pub show_progress: bool,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            timeout_secs: 600,
        }
    }
}

impl Default for DeeplConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: "Subtitlr".to_string(),
            timeout_secs: 120,
            poll_interval_secs: 1,
            max_poll_interval_secs: 5,
            max_wait_secs: 1800,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            downloader: "yt-dlp".to_string(),
            converter: "ffmpeg".to_string(),
            process_timeout_secs: 1800,
            credential_file: PathBuf::from(".env"),
            show_progress: true,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when none exists
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)?;

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            SubtitlrError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("subtitlr.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("subtitlr").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        parse_base_url("openai.base_url", &self.openai.base_url)?;
        if let Some(base_url) = &self.deepl.base_url {
            parse_base_url("deepl.base_url", base_url)?;
        }

        if self.openai.model.trim().is_empty() {
            return Err(SubtitlrError::Config("openai.model must not be empty".into()));
        }

        let timeouts = [
            ("openai.timeout_secs", self.openai.timeout_secs),
            ("deepl.timeout_secs", self.deepl.timeout_secs),
            ("deepl.max_wait_secs", self.deepl.max_wait_secs),
            ("app.process_timeout_secs", self.app.process_timeout_secs),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(SubtitlrError::Config(format!("{} must be greater than zero", name)));
            }
        }

        if self.deepl.poll_interval_secs > self.deepl.max_poll_interval_secs {
            return Err(SubtitlrError::Config(
                "deepl.poll_interval_secs must not exceed deepl.max_poll_interval_secs".into(),
            ));
        }

        Ok(())
    }

    /// Polling policy for translation jobs
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            min_interval: Duration::from_secs(self.deepl.poll_interval_secs),
            max_interval: Duration::from_secs(self.deepl.max_poll_interval_secs),
            max_wait: Duration::from_secs(self.deepl.max_wait_secs),
            show_progress: self.app.show_progress,
        }
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.app.process_timeout_secs)
    }
}

fn parse_base_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| {
        SubtitlrError::Config(format!("{} is not a valid URL ({}): {}", name, value, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SubtitlrError::Config(format!("{} must use HTTP or HTTPS", name)));
    }

    Ok(url)
}
