use crate::engine_trait::Recognizer;
use wakecast_core::AsrError;

/// Recognizer that never hears anything. Keeps the service up without a model.
pub struct NullRecognizer {
    feed_count: usize,
}

impl NullRecognizer {
    pub fn new() -> Self {
        Self { feed_count: 0 }
    }

    pub fn feed_count(&self) -> usize {
        self.feed_count
    }
}

impl Default for NullRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for NullRecognizer {
    fn name(&self) -> &str {
        "null"
    }

    fn accept(&mut self, samples: &[i16]) -> Result<bool, AsrError> {
        self.feed_count += 1;
        tracing::trace!("NullRecognizer fed block #{}, {} samples", self.feed_count, samples.len());
        Ok(false)
    }

    fn partial_text(&mut self) -> Result<String, AsrError> {
        Ok(String::new())
    }

    fn final_text(&mut self) -> Result<String, AsrError> {
        Ok(String::new())
    }
}
