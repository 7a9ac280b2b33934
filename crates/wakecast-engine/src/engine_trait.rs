use std::path::PathBuf;
use wakecast_core::AsrError;

/// Parameters every engine factory receives.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub sample_rate: u32,
}

/// An incremental speech recognizer.
///
/// Calls are synchronous CPU-bound work made from the capture thread, one
/// block at a time.
pub trait Recognizer: Send {
    /// Returns the engine's registry name (e.g. `"vosk"`, `"null"`).
    fn name(&self) -> &str;
    /// Feed PCM samples. Returns `true` when the engine reached an utterance
    /// boundary and [`final_text`](Self::final_text) is ready.
    fn accept(&mut self, samples: &[i16]) -> Result<bool, AsrError>;
    /// Best hypothesis for the utterance in progress.
    fn partial_text(&mut self) -> Result<String, AsrError>;
    /// Committed transcript of the finished utterance. Resets the engine for
    /// the next utterance.
    fn final_text(&mut self) -> Result<String, AsrError>;
}
