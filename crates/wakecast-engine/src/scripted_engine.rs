use crate::engine_trait::{EngineConfig, Recognizer};
use std::collections::VecDeque;
use std::path::Path;
use wakecast_core::AsrError;

/// One pre-recorded recognizer response, consumed per fed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Partial(String),
    Final(String),
    Fail(String),
}

/// Deterministic recognizer replaying a fixed script, one step per block.
///
/// Once the script runs out every block yields an empty partial. Used for
/// demos without a model and for pipeline tests.
pub struct ScriptedRecognizer {
    steps: VecDeque<ScriptStep>,
    partial: String,
    committed: String,
    samples_seen: usize,
}

impl ScriptedRecognizer {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            partial: String::new(),
            committed: String::new(),
            samples_seen: 0,
        }
    }

    /// Parse a script with one `partial: …`, `final: …` or `fail: …` line per
    /// step. Blank lines and `#` comments are skipped.
    pub fn from_script(script: &str) -> Result<Self, AsrError> {
        let mut steps = Vec::new();
        for (lineno, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (kind, text) = line.split_once(':').ok_or_else(|| {
                AsrError::InitializationFailed(format!("script line {}: missing ':'", lineno + 1))
            })?;
            let text = text.trim().to_string();
            let step = match kind.trim() {
                "partial" => ScriptStep::Partial(text),
                "final" => ScriptStep::Final(text),
                "fail" => ScriptStep::Fail(text),
                other => {
                    return Err(AsrError::InitializationFailed(format!(
                        "script line {}: unknown step kind {other:?}",
                        lineno + 1
                    )))
                }
            };
            steps.push(step);
        }
        Ok(Self::new(steps))
    }

    /// Load a script from `model_path`, or from `model_path/script.txt` when
    /// the path is a directory.
    pub fn load(config: &EngineConfig) -> Result<Self, AsrError> {
        let path: &Path = &config.model_path;
        let file = if path.is_dir() {
            path.join("script.txt")
        } else {
            path.to_path_buf()
        };
        let script = std::fs::read_to_string(&file).map_err(|e| {
            AsrError::InitializationFailed(format!("cannot read script {}: {e}", file.display()))
        })?;
        Self::from_script(&script)
    }

    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Recognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn accept(&mut self, samples: &[i16]) -> Result<bool, AsrError> {
        self.samples_seen += samples.len();
        match self.steps.pop_front() {
            Some(ScriptStep::Partial(text)) => {
                self.partial = text;
                Ok(false)
            }
            Some(ScriptStep::Final(text)) => {
                self.partial.clear();
                self.committed = text;
                Ok(true)
            }
            Some(ScriptStep::Fail(msg)) => Err(AsrError::DecodeFailed(msg)),
            None => {
                self.partial.clear();
                Ok(false)
            }
        }
    }

    fn partial_text(&mut self) -> Result<String, AsrError> {
        Ok(self.partial.clone())
    }

    fn final_text(&mut self) -> Result<String, AsrError> {
        Ok(std::mem::take(&mut self.committed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_script_parses_steps() {
        let engine = ScriptedRecognizer::from_script(
            "# demo\npartial: hey\n\nfinal: hey pluto\nfail: broken\n",
        )
        .unwrap();
        assert_eq!(engine.remaining(), 3);
    }

    #[test]
    fn test_from_script_rejects_unknown_kind() {
        match ScriptedRecognizer::from_script("maybe: hey") {
            Err(AsrError::InitializationFailed(msg)) => assert!(msg.contains("line 1")),
            other => panic!("expected InitializationFailed, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_from_script_rejects_missing_colon() {
        assert!(ScriptedRecognizer::from_script("partial hey").is_err());
    }

    #[test]
    fn test_final_text_resets_after_read() {
        let mut engine = ScriptedRecognizer::new(vec![ScriptStep::Final("done".to_string())]);
        assert!(engine.accept(&[0; 10]).unwrap());
        assert_eq!(engine.final_text().unwrap(), "done");
        assert_eq!(engine.final_text().unwrap(), "");
        assert_eq!(engine.samples_seen(), 10);
    }

    #[test]
    fn test_exhausted_script_yields_empty_partial() {
        let mut engine = ScriptedRecognizer::new(Vec::new());
        assert!(!engine.accept(&[0; 10]).unwrap());
        assert_eq!(engine.partial_text().unwrap(), "");
    }

    #[test]
    fn test_load_from_directory_reads_script_txt() {
        let dir = std::env::temp_dir().join("wakecast_scripted_load");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("script.txt"), "final: hey pluto\n").unwrap();

        let engine = ScriptedRecognizer::load(&EngineConfig {
            model_path: dir.clone(),
            sample_rate: 16000,
        })
        .unwrap();
        assert_eq!(engine.remaining(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_script_fails() {
        let result = ScriptedRecognizer::load(&EngineConfig {
            model_path: "/nonexistent/wakecast/script.txt".into(),
            sample_rate: 16000,
        });
        assert!(matches!(result, Err(AsrError::InitializationFailed(_))));
    }
}
