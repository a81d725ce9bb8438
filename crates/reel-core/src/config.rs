//! Client configuration.
//!
//! Evaluation order for [`ClientConfig::load_from_env`]:
//! 1) `$REEL_CONFIG_PATH` (TOML or JSON file),
//! 2) `reel.toml`, `reel.json`, `config/reel.toml` in the working directory,
//! 3) defaults.
//!
//! Then `REEL_API_BASE_URL`, `REEL_POLL_INTERVAL` and `REEL_MAX_POLL_ATTEMPTS`
//! override whatever was loaded. Durations are human-readable (`"2s"`,
//! `"1500ms"`).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_PLACEHOLDER_PREVIEW_URL: &str =
    "https://images.unsplash.com/photo-1605810230434-7631ac76ec81?w=800";
pub const DEFAULT_SAMPLE_MEDIA_URL: &str =
    "https://test-videos.co.uk/vids/bigbuckbunny/mp4/h264/360/Big_Buck_Bunny_360_10s_1MB.mp4";
pub const DEFAULT_PREVIEW_BASE_URL: &str = "https://source.unsplash.com/random/400x225";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Where the loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    EnvPath(PathBuf),
    File(PathBuf),
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the processing service.
    pub api_base_url: String,

    #[serde(with = "humantime_duration")]
    pub poll_interval: Duration,

    /// Status queries allowed per task before giving up. `0` disables the limit.
    pub max_poll_attempts: u32,

    /// Per-request HTTP timeout.
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,

    /// Preview used when a completed task reports no thumbnail.
    pub placeholder_preview_url: String,

    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Simulated resolver latency.
    #[serde(with = "humantime_duration")]
    pub latency: Duration,

    /// Chance that a text query yields a video.
    pub video_probability: f64,

    pub sample_media_url: String,

    /// Base of the generated preview locator; `?sig=<millis>` is appended.
    pub preview_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            // five minutes at the default interval
            max_poll_attempts: 150,
            request_timeout: Duration::from_secs(30),
            placeholder_preview_url: DEFAULT_PLACEHOLDER_PREVIEW_URL.to_string(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1500),
            video_probability: 0.6,
            sample_media_url: DEFAULT_SAMPLE_MEDIA_URL.to_string(),
            preview_base_url: DEFAULT_PREVIEW_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load_from_env() -> Result<(Self, ConfigSource), ConfigError> {
        let (mut config, source) = Self::load_base()?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok((config, source))
    }

    fn load_base() -> Result<(Self, ConfigSource), ConfigError> {
        if let Ok(path_str) = env::var("REEL_CONFIG_PATH")
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
                origin,
                message: err.to_string(),
            }),
            Some("toml") => toml::from_str(&contents).map_err(|err| ConfigError::Parse {
                origin,
                message: err.to_string(),
            }),
            _ => Self::parse_from_str(&contents, &origin),
        }
    }

    /// Try TOML first, then JSON.
    pub fn parse_from_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| ConfigError::Parse {
                origin: origin.to_string(),
                message: format!("toml error: {toml_err}; json error: {json_err}"),
            })
        })
    }

    /// Apply `REEL_*` overrides through `lookup` (usually `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("REEL_API_BASE_URL") {
            self.api_base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("REEL_POLL_INTERVAL") {
            self.poll_interval =
                humantime::parse_duration(raw.trim()).map_err(|err| ConfigError::InvalidValue {
                    key: "REEL_POLL_INTERVAL",
                    message: err.to_string(),
                })?;
        }

        if let Some(raw) = lookup("REEL_MAX_POLL_ATTEMPTS") {
            self.max_poll_attempts =
                raw.trim().parse().map_err(|err: std::num::ParseIntError| {
                    ConfigError::InvalidValue {
                        key: "REEL_MAX_POLL_ATTEMPTS",
                        message: err.to_string(),
                    }
                })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.api_base_url).map_err(|err| ConfigError::InvalidValue {
            key: "api_base_url",
            message: err.to_string(),
        })?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval",
                message: "must be greater than zero".to_string(),
            });
        }

        let p = self.discovery.video_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::InvalidValue {
                key: "discovery.video_probability",
                message: format!("{p} is outside [0, 1]"),
            });
        }

        Ok(())
    }

    /// Attempt budget, `None` when unbounded.
    pub fn poll_budget(&self) -> Option<u32> {
        (self.max_poll_attempts > 0).then_some(self.max_poll_attempts)
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &["reel.toml", "reel.json", "config/reel.toml"];

        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_timing() {
        let config = ClientConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.discovery.latency, Duration::from_millis(1500));
        assert_eq!(config.poll_budget(), Some(150));
        config.validate().unwrap();
    }

    #[test]
    fn parses_toml_with_humantime_durations() {
        let raw = r#"
            api_base_url = "http://agent-api:8080"
            poll_interval = "500ms"
            max_poll_attempts = 0

            [discovery]
            latency = "2s"
            video_probability = 1.0
        "#;

        let config = ClientConfig::parse_from_str(raw, "inline").unwrap();
        assert_eq!(config.api_base_url, "http://agent-api:8080");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.poll_budget(), None);
        assert_eq!(config.discovery.latency, Duration::from_secs(2));
        assert_eq!(config.discovery.video_probability, 1.0);
        // untouched fields keep defaults
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.discovery.sample_media_url, DEFAULT_SAMPLE_MEDIA_URL);
    }

    #[test]
    fn falls_back_to_json() {
        let raw = r#"{ "poll_interval": "3s", "discovery": { "latency": "10ms" } }"#;
        let config = ClientConfig::parse_from_str(raw, "inline").unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.discovery.latency, Duration::from_millis(10));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ClientConfig::parse_from_str("pol_interval = \"1s\"", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("REEL_API_BASE_URL", " http://127.0.0.1:9000 "),
            ("REEL_POLL_INTERVAL", "250ms"),
            ("REEL_MAX_POLL_ATTEMPTS", "3"),
        ]);

        let mut config = ClientConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.poll_budget(), Some(3));
    }

    #[test]
    fn bad_override_is_reported_with_key() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(|key| (key == "REEL_MAX_POLL_ATTEMPTS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "REEL_MAX_POLL_ATTEMPTS", .. }
        ));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = ClientConfig::default();
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.discovery.video_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file_by_extension() {
        let path = std::env::temp_dir().join(format!("reel-config-{}.toml", ulid::Ulid::new()));
        fs::write(&path, "poll_interval = \"4s\"\n").unwrap();

        let config = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(4));

        fs::remove_file(&path).unwrap();
    }
}
