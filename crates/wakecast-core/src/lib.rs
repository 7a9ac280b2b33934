pub mod config;
pub mod detector;
pub mod error;
pub mod types;

pub use config::{AppConfig, AsrConfig, AudioConfig, GeneralConfig, ServerConfig, WakeConfig};
pub use detector::{check, TriggerGate, WakeDetector};
pub use error::{AsrError, AudioError, BroadcastError, ConfigError};
pub use types::{AudioBlock, RecognitionEvent, WakeEvent};
