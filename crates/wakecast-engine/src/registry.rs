use crate::engine_trait::{EngineConfig, Recognizer};
use std::collections::HashMap;
use wakecast_core::AsrError;

type EngineFactory = fn(&EngineConfig) -> Result<Box<dyn Recognizer>, AsrError>;

#[derive(Clone)]
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("null", |_| Ok(Box::new(crate::null_engine::NullRecognizer::new())));
        registry.register("scripted", |config| {
            Ok(Box::new(crate::scripted_engine::ScriptedRecognizer::load(config)?))
        });
        #[cfg(feature = "vosk")]
        registry.register("vosk", |config| {
            Ok(Box::new(crate::vosk_engine::VoskRecognizer::load(config)?))
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: EngineFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str, config: &EngineConfig) -> Result<Box<dyn Recognizer>, AsrError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| AsrError::EngineNotFound(name.to_string()))?;
        factory(config)
    }

    pub fn list_engines(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
