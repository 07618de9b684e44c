use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::assistant::LanguageModel;
use crate::embeddings::EmbeddingProvider;
use crate::{DocQaError, Result};

/// One dimension per vocabulary word plus a catch-all, counting occurrences
pub(crate) struct KeywordEmbedder {
    vocabulary: Vec<String>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl KeywordEmbedder {
    pub(crate) fn new(vocabulary: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocabulary.len() + 1];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let slot = self
                .vocabulary
                .iter()
                .position(|known| *known == word)
                .unwrap_or(self.vocabulary.len());
            vector[slot] += 1.0;
        }
        vector
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DocQaError::EmbeddingUnavailable("model offline".to_string()));
        }
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

/// Replays canned responses keyed by a prompt substring and records every prompt
pub(crate) struct ScriptedModel {
    rules: Vec<(String, String)>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub(crate) fn new(fallback: &str) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn when(mut self, needle: &str, response: &str) -> Self {
        self.rules.push((needle.to_string(), response.to_string()));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log lock").clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push(prompt.to_string());

        let response = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map_or(self.fallback.as_str(), |(_, response)| response.as_str());

        if response == "<error>" {
            return Err(DocQaError::LanguageModel("quota exceeded".to_string()));
        }
        Ok(response.to_string())
    }
}
