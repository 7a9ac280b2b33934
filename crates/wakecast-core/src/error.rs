use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to enumerate devices: {0}")]
    DeviceEnumeration(String),

    #[error("failed to build stream: {0}")]
    StreamBuild(String),

    #[error("failed to start stream: {0}")]
    StreamPlay(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to convert audio buffer: {0}")]
    Conversion(String),
}

#[derive(Debug, Error)]
pub enum AsrError {
    #[error("model path not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("ASR initialization failed: {0}")]
    InitializationFailed(String),

    #[error("ASR decode failed: {0}")]
    DecodeFailed(String),

    #[error("ASR engine not found: {0}")]
    EngineNotFound(String),
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error("failed to send to subscriber: {0}")]
    SendFailed(String),

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}
