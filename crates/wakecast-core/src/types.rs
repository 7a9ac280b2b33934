use serde::Serialize;
use std::time::Duration;

/// A fixed-length block of mono signed 16-bit samples as captured from the
/// microphone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioBlock {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Little-endian PCM bytes, the layout recognizers consume.
    pub fn to_pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Output of one recognizer step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Best current hypothesis for the utterance in progress; may be revised.
    Partial(String),
    /// Transcript committed at an utterance boundary.
    Final(String),
}

impl RecognitionEvent {
    pub fn text(&self) -> &str {
        match self {
            RecognitionEvent::Partial(text) | RecognitionEvent::Final(text) => text,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, RecognitionEvent::Final(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeEvent {
    pub phrase: String,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireMessage<'a> {
    Wake { phrase: &'a str },
}

impl WakeEvent {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }

    /// Serialize to the server→client text frame:
    /// `{"type":"wake","phrase":"<phrase>"}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&WireMessage::Wake {
            phrase: &self.phrase,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_block_pcm_bytes_little_endian() {
        let block = AudioBlock::new(vec![1, -1, 0x0102], 16000);
        assert_eq!(
            block.to_pcm_bytes(),
            vec![0x01, 0x00, 0xff, 0xff, 0x02, 0x01]
        );
    }

    #[test]
    fn test_audio_block_duration() {
        let block = AudioBlock::new(vec![0; 8000], 16000);
        assert_eq!(block.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_audio_block_zero_rate_has_zero_duration() {
        let block = AudioBlock::new(vec![0; 10], 0);
        assert_eq!(block.duration(), Duration::ZERO);
    }

    #[test]
    fn test_recognition_event_text_and_finality() {
        let partial = RecognitionEvent::Partial("hey".to_string());
        let fin = RecognitionEvent::Final("hey pluto".to_string());
        assert_eq!(partial.text(), "hey");
        assert!(!partial.is_final());
        assert_eq!(fin.text(), "hey pluto");
        assert!(fin.is_final());
    }

    #[test]
    fn test_wake_event_wire_format() {
        let event = WakeEvent::new("hey pluto");
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"type":"wake","phrase":"hey pluto"}"#
        );
    }

    #[test]
    fn test_wake_event_wire_format_escapes_quotes() {
        let event = WakeEvent::new("say \"hi\"");
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "wake");
        assert_eq!(json["phrase"], "say \"hi\"");
    }
}
