use crate::engine_trait::{EngineConfig, Recognizer};
use vosk::{DecodingState, Model};
use wakecast_core::AsrError;

/// Kaldi-based streaming recognizer via libvosk. Free-form decoding, no
/// grammar, so full transcripts can be searched for the wake phrase.
pub struct VoskRecognizer {
    recognizer: vosk::Recognizer,
    _model: Model,
}

impl VoskRecognizer {
    pub fn load(config: &EngineConfig) -> Result<Self, AsrError> {
        if !config.model_path.exists() {
            return Err(AsrError::ModelNotFound(config.model_path.clone()));
        }
        let path = config.model_path.to_str().ok_or_else(|| {
            AsrError::InitializationFailed(format!(
                "model path is not valid UTF-8: {}",
                config.model_path.display()
            ))
        })?;

        let model = Model::new(path).ok_or_else(|| {
            AsrError::InitializationFailed(format!("failed to load vosk model from {path}"))
        })?;
        let recognizer = vosk::Recognizer::new(&model, config.sample_rate as f32).ok_or_else(|| {
            AsrError::InitializationFailed("failed to create vosk recognizer".to_string())
        })?;

        tracing::info!(model_path = %path, sample_rate = config.sample_rate, "vosk model loaded");
        Ok(Self {
            recognizer,
            _model: model,
        })
    }
}

impl Recognizer for VoskRecognizer {
    fn name(&self) -> &str {
        "vosk"
    }

    fn accept(&mut self, samples: &[i16]) -> Result<bool, AsrError> {
        match self.recognizer.accept_waveform(samples) {
            Ok(DecodingState::Finalized) => Ok(true),
            Ok(DecodingState::Running) => Ok(false),
            Ok(DecodingState::Failed) => Err(AsrError::DecodeFailed("vosk decoding failed".to_string())),
            Err(e) => Err(AsrError::DecodeFailed(format!("{e:?}"))),
        }
    }

    fn partial_text(&mut self) -> Result<String, AsrError> {
        Ok(self.recognizer.partial_result().partial.to_string())
    }

    fn final_text(&mut self) -> Result<String, AsrError> {
        Ok(self
            .recognizer
            .result()
            .single()
            .map(|r| r.text.to_string())
            .unwrap_or_default())
    }
}
