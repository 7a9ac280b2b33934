use crate::engine_trait::Recognizer;
use wakecast_core::{AsrError, AudioBlock, RecognitionEvent};

/// Turns engine calls into one [`RecognitionEvent`] per audio block.
pub struct RecognizerAdapter {
    engine: Box<dyn Recognizer>,
}

impl RecognizerAdapter {
    pub fn new(engine: Box<dyn Recognizer>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Decode errors are logged and reported as an empty partial.
    pub fn feed(&mut self, block: &AudioBlock) -> RecognitionEvent {
        match self.step(block) {
            Ok(event) => {
                let text = event.text();
                if !text.trim().is_empty() {
                    tracing::debug!(is_final = event.is_final(), "recognised: {}", text.trim());
                }
                event
            }
            Err(e) => {
                tracing::warn!(engine = %self.engine.name(), "recognizer error: {e}");
                RecognitionEvent::Partial(String::new())
            }
        }
    }

    fn step(&mut self, block: &AudioBlock) -> Result<RecognitionEvent, AsrError> {
        if self.engine.accept(&block.samples)? {
            Ok(RecognitionEvent::Final(self.engine.final_text()?))
        } else {
            Ok(RecognitionEvent::Partial(self.engine.partial_text()?))
        }
    }
}
