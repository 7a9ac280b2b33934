use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub wake: WakeConfig,

    #[serde(default)]
    pub asr: AsrConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WakeConfig {
    #[serde(default = "default_phrase")]
    pub phrase: String,

    /// Fire at most once between two final results.
    #[serde(default = "default_true")]
    pub dedupe_per_utterance: bool,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            phrase: default_phrase(),
            dedupe_per_utterance: default_true(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AsrConfig {
    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            model_path: default_model_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_device_name")]
    pub device_name: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_block_size")]
    pub block_size: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u32,
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_phrase() -> String {
    "hey pluto".to_string()
}

fn default_true() -> bool {
    true
}

fn default_engine() -> String {
    "vosk".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./model")
}

fn default_device_name() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_block_size() -> u32 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u32 {
    8765
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
        }
    }

    Ok(result)
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        reason: format!("cannot parse {raw:?}"),
    })
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Full startup load: optional file, then process environment, then
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style keys. `lookup` returns the raw
    /// value for a key, or `None` when unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WAKE_PHRASE") {
            self.wake.phrase = v;
        }
        if let Some(v) = lookup("VOSK_MODEL_PATH") {
            self.asr.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("WAKECAST_ENGINE") {
            self.asr.engine = v;
        }
        if let Some(v) = lookup("WAKECAST_DEVICE") {
            self.audio.device_name = v;
        }
        if let Some(v) = lookup("WAKECAST_LOG") {
            self.general.log_level = v;
        }
        if let Some(v) = lookup("SAMPLE_RATE") {
            self.audio.sample_rate = parse_env("SAMPLE_RATE", &v)?;
        }
        if let Some(v) = lookup("BLOCK_SIZE") {
            self.audio.block_size = parse_env("BLOCK_SIZE", &v)?;
        }
        if let Some(v) = lookup("WEBSOCKET_PORT") {
            self.server.port = parse_env("WEBSOCKET_PORT", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wake.phrase.trim().is_empty() {
            return Err(invalid("wake.phrase", "must not be empty"));
        }
        if self.asr.model_path.as_os_str().is_empty() {
            return Err(invalid("asr.model_path", "must not be empty"));
        }
        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be positive"));
        }
        if self.audio.block_size == 0 {
            return Err(invalid("audio.block_size", "must be positive"));
        }
        if !(1..=65535).contains(&self.server.port) {
            return Err(invalid("server.port", "must be in 1-65535"));
        }
        Ok(())
    }
}
