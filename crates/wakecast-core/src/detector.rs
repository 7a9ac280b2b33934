use crate::types::{RecognitionEvent, WakeEvent};

/// Decide whether `event` contains `phrase` (case-insensitive substring).
///
/// Partial and final results are treated alike. Empty or whitespace-only text
/// never matches.
pub fn check(event: &RecognitionEvent, phrase: &str) -> Option<WakeEvent> {
    WakeDetector::new(phrase).check(event)
}

/// Wake phrase matcher with the phrase case-folded once up front.
#[derive(Debug, Clone)]
pub struct WakeDetector {
    phrase: String,
    folded: String,
}

impl WakeDetector {
    pub fn new(phrase: impl Into<String>) -> Self {
        let phrase = phrase.into();
        let folded = phrase.trim().to_lowercase();
        Self { phrase, folded }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn check(&self, event: &RecognitionEvent) -> Option<WakeEvent> {
        let text = event.text().trim();
        if text.is_empty() || self.folded.is_empty() {
            return None;
        }
        if text.to_lowercase().contains(&self.folded) {
            Some(WakeEvent::new(self.phrase.clone()))
        } else {
            None
        }
    }
}

/// Suppresses repeat triggers within one utterance.
///
/// Partials are revised as audio arrives, so a phrase that matched once keeps
/// matching until the utterance finalizes. The gate lets the first match
/// through and re-arms on every `Final`. A disabled gate passes every match.
#[derive(Debug, Clone)]
pub struct TriggerGate {
    enabled: bool,
    fired: bool,
}

impl TriggerGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            fired: false,
        }
    }

    /// Returns `true` if a match on `event` should be forwarded.
    pub fn admit(&mut self, event: &RecognitionEvent, matched: bool) -> bool {
        let admitted = if !self.enabled {
            matched
        } else if matched && !self.fired {
            self.fired = true;
            true
        } else {
            false
        };

        if event.is_final() {
            self.fired = false;
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(text: &str) -> RecognitionEvent {
        RecognitionEvent::Partial(text.to_string())
    }

    fn fin(text: &str) -> RecognitionEvent {
        RecognitionEvent::Final(text.to_string())
    }

    #[test]
    fn test_check_matches_substring_in_final() {
        let event = check(&fin("well hey pluto can you hear me"), "hey pluto").unwrap();
        assert_eq!(event.phrase, "hey pluto");
    }

    #[test]
    fn test_check_matches_partial() {
        assert!(check(&partial("hey pluto"), "hey pluto").is_some());
    }

    #[test]
    fn test_check_is_case_insensitive_both_ways() {
        assert!(check(&fin("HEY Pluto what time is it"), "hey pluto").is_some());
        assert!(check(&fin("hey pluto"), "Hey PLUTO").is_some());
    }

    #[test]
    fn test_check_keeps_configured_phrase_casing() {
        let event = check(&fin("hey pluto"), "Hey Pluto").unwrap();
        assert_eq!(event.phrase, "Hey Pluto");
    }

    #[test]
    fn test_check_no_match() {
        assert!(check(&fin("hey there"), "hey pluto").is_none());
        assert!(check(&partial("pluto hey"), "hey pluto").is_none());
    }

    #[test]
    fn test_check_empty_and_whitespace_never_match() {
        for text in ["", " ", "\t\n", "   "] {
            assert!(check(&fin(text), "hey pluto").is_none());
            assert!(check(&partial(text), "hey pluto").is_none());
            assert!(check(&partial(text), " ").is_none());
        }
    }

    #[test]
    fn test_check_blank_phrase_never_matches() {
        assert!(check(&fin("anything at all"), "  ").is_none());
    }

    #[test]
    fn test_check_matches_embedded_in_larger_words() {
        // Substring containment, not word boundaries.
        assert!(check(&fin("theyhey plutonium"), "hey pluto").is_some());
    }

    #[test]
    fn test_detector_containment_property() {
        let detector = WakeDetector::new("hey pluto");
        let samples = [
            ("hey pluto", true),
            ("ok HEY PLUTO", true),
            ("hey plut", false),
            ("hey  pluto", false),
            ("pluto", false),
            ("xx hey pluto yy", true),
        ];
        for (text, expected) in samples {
            assert_eq!(
                detector.check(&fin(text)).is_some(),
                expected,
                "text: {text:?}"
            );
        }
    }

    #[test]
    fn test_gate_fires_once_per_utterance() {
        let mut gate = TriggerGate::new(true);
        assert!(gate.admit(&partial("hey pluto"), true));
        assert!(!gate.admit(&partial("hey pluto can"), true));
        assert!(!gate.admit(&fin("hey pluto can you"), true));
        // Re-armed after the final result.
        assert!(gate.admit(&partial("hey pluto"), true));
    }

    #[test]
    fn test_gate_final_only_match_fires() {
        let mut gate = TriggerGate::new(true);
        assert!(!gate.admit(&partial("hey"), false));
        assert!(gate.admit(&fin("hey pluto"), true));
        assert!(gate.admit(&fin("hey pluto again"), true));
    }

    #[test]
    fn test_gate_disabled_passes_every_match() {
        let mut gate = TriggerGate::new(false);
        assert!(gate.admit(&partial("hey pluto"), true));
        assert!(gate.admit(&partial("hey pluto can"), true));
        assert!(gate.admit(&fin("hey pluto can you"), true));
        assert!(!gate.admit(&fin("nothing"), false));
    }
}
