pub mod adapter;
pub mod engine_trait;
pub mod null_engine;
pub mod registry;
pub mod scripted_engine;
#[cfg(feature = "vosk")]
pub mod vosk_engine;

pub use adapter::RecognizerAdapter;
pub use engine_trait::{EngineConfig, Recognizer};
pub use null_engine::NullRecognizer;
pub use registry::EngineRegistry;
pub use scripted_engine::{ScriptStep, ScriptedRecognizer};
#[cfg(feature = "vosk")]
pub use vosk_engine::VoskRecognizer;
